//! Channel snapshots, video sightings, panel snapshots, trending sightings,
//! and the provenance stamp every discovery row carries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serializes a `Vec<String>` as a pipe-separated string and deserializes
/// the reverse.
pub fn serialize_pipe_list<S: Serializer>(v: &[String], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&v.join("|"))
}

pub fn deserialize_pipe_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let raw = String::deserialize(d)?;
    Ok(split_pipe_list(&raw))
}

pub fn split_pipe_list(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        Vec::new()
    } else {
        raw.split('|').map(|s| s.trim().to_string()).collect()
    }
}

pub fn join_pipe_list(items: &[String]) -> String {
    items.join("|")
}

/// Discovery provenance stamped onto every channel row at first discovery
/// (first-seen-wins).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Provenance {
    pub stream_type: String,
    pub discovery_keyword: String,
    pub discovery_language: String,
    pub discovery_method: String,
    pub discovery_order: String,
    pub discovery_safesearch: String,
    #[serde(default)]
    pub discovery_duration: String,
    #[serde(default)]
    pub discovery_topic_id: Option<String>,
    #[serde(default)]
    pub discovery_topic_name: Option<String>,
    #[serde(default)]
    pub discovery_region_code: Option<String>,
    #[serde(default)]
    pub discovery_window_hours: Option<u32>,
    #[serde(default)]
    pub expansion_wave: Option<String>,
}

/// An optional "first video" triple filled in by the discovery driver's
/// first-video enrichment step.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FirstVideo {
    #[serde(default)]
    pub first_video_id: Option<String>,
    #[serde(default)]
    pub first_video_title: Option<String>,
    #[serde(default)]
    pub first_video_date: Option<String>,
}

/// A channel snapshot row.
///
/// `channel_id` is the sole identity key; within one stream's output file it
/// appears at most once (first-seen-wins).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelSnapshot {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub custom_url: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    pub view_count: Option<i64>,
    pub subscriber_count: Option<i64>,
    pub video_count: Option<i64>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub default_language: Option<String>,
    #[serde(
        serialize_with = "serialize_pipe_list",
        deserialize_with = "deserialize_pipe_list",
        default
    )]
    pub topic_ids: Vec<String>,
    #[serde(
        serialize_with = "serialize_pipe_list",
        deserialize_with = "deserialize_pipe_list",
        default
    )]
    pub topic_names: Vec<String>,
    pub made_for_kids: Option<bool>,
    #[serde(default)]
    pub privacy_status: Option<String>,
    #[serde(default)]
    pub longuploads_status: Option<String>,
    #[serde(
        serialize_with = "serialize_pipe_list",
        deserialize_with = "deserialize_pipe_list",
        default
    )]
    pub branding_keywords: Vec<String>,
    #[serde(
        serialize_with = "serialize_pipe_list",
        deserialize_with = "deserialize_pipe_list",
        default
    )]
    pub localizations: Vec<String>,
    #[serde(default)]
    pub uploads_playlist_id: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(flatten)]
    pub first_video: FirstVideo,

    #[serde(flatten)]
    pub provenance: Provenance,
}

impl ChannelSnapshot {
    /// Truncates `description` to the 5000-char limit.
    pub fn truncate_description(&mut self) {
        const MAX: usize = 5000;
        if self.description.chars().count() > MAX {
            self.description = self.description.chars().take(MAX).collect();
        }
    }

    pub fn not_found(channel_id: String, provenance: Provenance) -> Self {
        ChannelSnapshot {
            channel_id,
            title: String::new(),
            description: String::new(),
            custom_url: None,
            published_at: None,
            view_count: None,
            subscriber_count: None,
            video_count: None,
            country: None,
            default_language: None,
            topic_ids: Vec::new(),
            topic_names: Vec::new(),
            made_for_kids: None,
            privacy_status: None,
            longuploads_status: None,
            branding_keywords: Vec::new(),
            localizations: Vec::new(),
            uploads_playlist_id: None,
            status: Some("not_found".to_string()),
            first_video: FirstVideo::default(),
            provenance,
        }
    }
}

/// A single video-appearance sighting: `(video_id, channel_id, published_at,
/// title, scraped_at)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoSighting {
    pub video_id: String,
    pub channel_id: String,
    pub published_at: Option<String>,
    pub title: Option<String>,
    pub scraped_at: String,
}

/// Weekly video stats snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoStatsSnapshot {
    pub video_id: String,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub comment_count: Option<i64>,
    pub scraped_at: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Daily channel stats snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelStatsSnapshot {
    pub channel_id: String,
    pub view_count: Option<i64>,
    pub subscriber_count: Option<i64>,
    pub video_count: Option<i64>,
    pub scraped_at: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// A single trending-chart sighting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendingSighting {
    pub trending_date: String,
    pub region_code: String,
    pub position: u32,
    pub video_id: String,
    pub channel_id: String,
    pub title: String,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub comment_count: Option<i64>,
    #[serde(default)]
    pub category_id: Option<String>,
    pub scraped_at: String,
}

/// Timestamp helper: UTC "now" formatted as ISO-8601, used throughout for
/// `scraped_at` fields. Callers pass in `Utc::now()` so the function itself
/// stays pure and testable.
pub fn iso8601(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipe_list_round_trips() {
        let items = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let joined = join_pipe_list(&items);
        assert_eq!(joined, "a|b|c");
        assert_eq!(split_pipe_list(&joined), items);
    }

    #[test]
    fn empty_pipe_list_round_trips() {
        assert_eq!(split_pipe_list(""), Vec::<String>::new());
        assert_eq!(join_pipe_list(&[]), "");
    }

    #[test]
    fn description_truncates_at_5000_chars() {
        let mut snap = ChannelSnapshot::not_found(
            "UC1".to_string(),
            Provenance {
                stream_type: "s".into(),
                discovery_keyword: "k".into(),
                discovery_language: "en".into(),
                discovery_method: "base".into(),
                discovery_order: "date".into(),
                discovery_safesearch: "moderate".into(),
                discovery_duration: "any".into(),
                discovery_topic_id: None,
                discovery_topic_name: None,
                discovery_region_code: None,
                discovery_window_hours: None,
                expansion_wave: None,
            },
        );
        snap.description = "x".repeat(6000);
        snap.truncate_description();
        assert_eq!(snap.description.chars().count(), 5000);
    }
}
