//! The upstream search API's optional-parameter "extras bag" and the
//! expansion strategy enum: closed sum types in place of an open-ended
//! parameter dictionary.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeSearch {
    None,
    Moderate,
}

impl SafeSearch {
    pub fn as_api_value(self) -> &'static str {
        match self {
            SafeSearch::None => "none",
            SafeSearch::Moderate => "moderate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOrder {
    Date,
    Relevance,
    ViewCount,
}

impl SearchOrder {
    pub fn as_api_value(self) -> &'static str {
        match self {
            SearchOrder::Date => "date",
            SearchOrder::Relevance => "relevance",
            SearchOrder::ViewCount => "viewCount",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoDuration {
    Short,
    Medium,
    Long,
}

impl VideoDuration {
    pub fn as_api_value(self) -> &'static str {
        match self {
            VideoDuration::Short => "short",
            VideoDuration::Medium => "medium",
            VideoDuration::Long => "long",
        }
    }

    pub const ALL: [VideoDuration; 3] = [
        VideoDuration::Short,
        VideoDuration::Medium,
        VideoDuration::Long,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Completed,
}

impl EventType {
    pub fn as_api_value(self) -> &'static str {
        "completed"
    }
}

/// A closed bag of the upstream search API's optional parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtrasBag {
    pub safe_search: Option<SafeSearch>,
    pub topic_id: Option<String>,
    pub region_code: Option<String>,
    pub video_duration: Option<VideoDuration>,
    pub relevance_language: Option<String>,
    pub event_type: Option<EventType>,
}

impl ExtrasBag {
    /// Renders the bag as `(key, value)` query parameter pairs, in a fixed
    /// order, for the live provider to attach to a search request.
    pub fn as_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(ss) = self.safe_search {
            pairs.push(("safeSearch", ss.as_api_value().to_string()));
        }
        if let Some(topic) = &self.topic_id {
            pairs.push(("topicId", topic.clone()));
        }
        if let Some(region) = &self.region_code {
            pairs.push(("regionCode", region.clone()));
        }
        if let Some(dur) = self.video_duration {
            pairs.push(("videoDuration", dur.as_api_value().to_string()));
        }
        if let Some(lang) = &self.relevance_language {
            pairs.push(("relevanceLanguage", lang.clone()));
        }
        if let Some(evt) = self.event_type {
            pairs.push(("eventType", evt.as_api_value().to_string()));
        }
        pairs
    }
}

/// The expansion strategies a discovery run can opt into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strategy {
    Base,
    SafeSearch,
    TopicId,
    RegionCode,
    Duration,
    Relevance,
    Windows,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base" => Ok(Strategy::Base),
            "safesearch" => Ok(Strategy::SafeSearch),
            "topicid" => Ok(Strategy::TopicId),
            "regioncode" => Ok(Strategy::RegionCode),
            "duration" => Ok(Strategy::Duration),
            "relevance" => Ok(Strategy::Relevance),
            "windows" => Ok(Strategy::Windows),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strategy::Base => "base",
            Strategy::SafeSearch => "safesearch",
            Strategy::TopicId => "topicid",
            Strategy::RegionCode => "regioncode",
            Strategy::Duration => "duration",
            Strategy::Relevance => "relevance",
            Strategy::Windows => "windows",
        };
        f.write_str(s)
    }
}

/// Parses a comma-separated `--strategies` CLI value into a strategy set.
pub fn parse_strategies(raw: &str) -> Result<std::collections::BTreeSet<Strategy>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Strategy::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extras_bag_renders_in_fixed_order() {
        let bag = ExtrasBag {
            safe_search: Some(SafeSearch::None),
            topic_id: Some("/m/04rlf".to_string()),
            region_code: Some("US".to_string()),
            ..Default::default()
        };
        let pairs = bag.as_query_pairs();
        assert_eq!(pairs[0].0, "safeSearch");
        assert_eq!(pairs[1].0, "topicId");
        assert_eq!(pairs[2].0, "regionCode");
    }

    #[test]
    fn parse_strategies_accepts_known_names() {
        let set = parse_strategies("base,topicid, windows").unwrap();
        assert!(set.contains(&Strategy::Base));
        assert!(set.contains(&Strategy::TopicId));
        assert!(set.contains(&Strategy::Windows));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn parse_strategies_rejects_unknown_names() {
        assert!(parse_strategies("base,bogus").is_err());
    }
}
