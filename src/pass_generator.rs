//! Enumerates the additive set of search passes for one (keyword, language)
//! pair: a fixed static list gated on the caller's strategy set, plus the
//! two conditional passes the discovery driver generates itself once it has
//! observed whether the base pass hit the upstream result cap.

use crate::extras::{EventType, ExtrasBag, SafeSearch, SearchOrder, Strategy, VideoDuration};
use crate::model::Provenance;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct Pass {
    pub name: String,
    pub extras: ExtrasBag,
    pub max_pages: u32,
    pub order: SearchOrder,
    pub provenance: Provenance,
}

/// Runtime observation threaded through a keyword's base pass: how many
/// windows were searched, and which ones hit the upstream's result cap
/// (`max_pages * 50` items returned — the signature of truncation).
#[derive(Debug, Clone, Default)]
pub struct CapObservation {
    pub windows_seen: u32,
    pub windows_capped: BTreeSet<(DateTime<Utc>, DateTime<Utc>)>,
}

impl CapObservation {
    pub fn observe(&mut self, window: (DateTime<Utc>, DateTime<Utc>), item_count: usize, max_pages: u32) {
        self.windows_seen += 1;
        if item_count as u32 >= max_pages * 50 {
            self.windows_capped.insert(window);
        }
    }

    pub fn any_capped(&self) -> bool {
        !self.windows_capped.is_empty()
    }

    pub fn capped_fraction(&self) -> f64 {
        if self.windows_seen == 0 {
            0.0
        } else {
            self.windows_capped.len() as f64 / self.windows_seen as f64
        }
    }
}

fn base_provenance(
    keyword: &str,
    language: &str,
    method: &str,
    order: SearchOrder,
    safe_search: SafeSearch,
) -> Provenance {
    Provenance {
        stream_type: String::new(),
        discovery_keyword: keyword.to_string(),
        discovery_language: language.to_string(),
        discovery_method: method.to_string(),
        discovery_order: order.as_api_value().to_string(),
        discovery_safesearch: safe_search.as_api_value().to_string(),
        discovery_duration: "any".to_string(),
        discovery_topic_id: None,
        discovery_topic_name: None,
        discovery_region_code: None,
        discovery_window_hours: None,
        expansion_wave: None,
    }
}

/// Builds the static pass list for one keyword: `base`, `topicid:<TID>` ×
/// taxonomy, `regioncode:<RC>` × the keyword language's region list, and
/// `duration:<short|medium|long>`, each gated by membership in `strategies`.
/// The `relevance` and `windows_12h` passes are not produced here — they
/// depend on runtime cap observations the driver collects while running
/// this list.
pub fn generate_passes(
    keyword: &str,
    language: &str,
    strategies: &BTreeSet<Strategy>,
    event_type: Option<EventType>,
) -> Vec<Pass> {
    let safe_search = if strategies.contains(&Strategy::SafeSearch) {
        SafeSearch::None
    } else {
        SafeSearch::Moderate
    };
    let relevance_language = crate::taxonomy::relevance_language_code(language).map(String::from);

    let mut passes = Vec::new();

    passes.push(Pass {
        name: "base".to_string(),
        extras: ExtrasBag {
            safe_search: Some(safe_search),
            relevance_language: relevance_language.clone(),
            event_type,
            ..Default::default()
        },
        max_pages: 10,
        order: SearchOrder::Date,
        provenance: base_provenance(keyword, language, "base", SearchOrder::Date, safe_search),
    });

    if strategies.contains(&Strategy::TopicId) {
        for (topic_id, topic_name) in crate::taxonomy::all_topic_ids() {
            let mut provenance = base_provenance(
                keyword,
                language,
                &format!("topicid:{topic_id}"),
                SearchOrder::Date,
                safe_search,
            );
            provenance.discovery_topic_id = Some(topic_id.to_string());
            provenance.discovery_topic_name = Some(topic_name.to_string());
            passes.push(Pass {
                name: format!("topicid:{topic_id}"),
                extras: ExtrasBag {
                    safe_search: Some(safe_search),
                    topic_id: Some(topic_id.to_string()),
                    relevance_language: relevance_language.clone(),
                    event_type,
                    ..Default::default()
                },
                max_pages: 5,
                order: SearchOrder::Date,
                provenance,
            });
        }
    }

    if strategies.contains(&Strategy::RegionCode) {
        if let Some(regions) = crate::taxonomy::language_region_map().get(language) {
            for region_code in *regions {
                let mut provenance = base_provenance(
                    keyword,
                    language,
                    &format!("regioncode:{region_code}"),
                    SearchOrder::Date,
                    safe_search,
                );
                provenance.discovery_region_code = Some(region_code.to_string());
                passes.push(Pass {
                    name: format!("regioncode:{region_code}"),
                    extras: ExtrasBag {
                        safe_search: Some(safe_search),
                        region_code: Some(region_code.to_string()),
                        relevance_language: relevance_language.clone(),
                        event_type,
                        ..Default::default()
                    },
                    max_pages: 5,
                    order: SearchOrder::Date,
                    provenance,
                });
            }
        }
    }

    if strategies.contains(&Strategy::Duration) {
        for duration in VideoDuration::ALL {
            let mut provenance = base_provenance(
                keyword,
                language,
                &format!("duration:{}", duration.as_api_value()),
                SearchOrder::Date,
                safe_search,
            );
            provenance.discovery_duration = duration.as_api_value().to_string();
            passes.push(Pass {
                name: format!("duration:{}", duration.as_api_value()),
                extras: ExtrasBag {
                    safe_search: Some(safe_search),
                    video_duration: Some(duration),
                    relevance_language: relevance_language.clone(),
                    event_type,
                    ..Default::default()
                },
                max_pages: 5,
                order: SearchOrder::Date,
                provenance,
            });
        }
    }

    passes
}

/// Builds the `relevance` conditional pass: the base pass's capped windows
/// re-run with `order = relevance`.
pub fn relevance_pass(keyword: &str, language: &str, safe_search: SafeSearch) -> Pass {
    Pass {
        name: "relevance".to_string(),
        extras: ExtrasBag {
            safe_search: Some(safe_search),
            relevance_language: crate::taxonomy::relevance_language_code(language).map(String::from),
            ..Default::default()
        },
        max_pages: 5,
        order: SearchOrder::Relevance,
        provenance: base_provenance(keyword, language, "relevance", SearchOrder::Relevance, safe_search),
    }
}

/// Builds the `windows_12h` conditional pass.
pub fn windows_12h_pass(keyword: &str, language: &str, safe_search: SafeSearch) -> Pass {
    let mut provenance = base_provenance(keyword, language, "windows_12h", SearchOrder::Date, safe_search);
    provenance.discovery_window_hours = Some(12);
    Pass {
        name: "windows_12h".to_string(),
        extras: ExtrasBag {
            safe_search: Some(safe_search),
            relevance_language: crate::taxonomy::relevance_language_code(language).map(String::from),
            ..Default::default()
        },
        max_pages: 5,
        order: SearchOrder::Date,
        provenance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategies(names: &[Strategy]) -> BTreeSet<Strategy> {
        names.iter().copied().collect()
    }

    #[test]
    fn base_only_strategy_produces_a_single_pass() {
        let passes = generate_passes("ai", "english", &strategies(&[Strategy::Base]), None);
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].name, "base");
        assert_eq!(passes[0].max_pages, 10);
    }

    #[test]
    fn topicid_strategy_expands_over_full_taxonomy() {
        let passes = generate_passes("ai", "english", &strategies(&[Strategy::Base, Strategy::TopicId]), None);
        let topic_count = crate::taxonomy::all_topic_ids().count();
        assert_eq!(passes.len(), 1 + topic_count);
        assert!(passes.iter().skip(1).all(|p| p.max_pages == 5));
    }

    #[test]
    fn regioncode_strategy_expands_over_language_regions() {
        let passes = generate_passes("ai", "english", &strategies(&[Strategy::Base, Strategy::RegionCode]), None);
        let region_count = crate::taxonomy::language_region_map()["english"].len();
        assert_eq!(passes.len(), 1 + region_count);
    }

    #[test]
    fn duration_strategy_adds_three_passes() {
        let passes = generate_passes("ai", "english", &strategies(&[Strategy::Base, Strategy::Duration]), None);
        assert_eq!(passes.len(), 1 + 3);
    }

    #[test]
    fn safesearch_strategy_flips_global_parameter_not_a_pass() {
        let without = generate_passes("ai", "english", &strategies(&[Strategy::Base]), None);
        let with = generate_passes("ai", "english", &strategies(&[Strategy::Base, Strategy::SafeSearch]), None);
        assert_eq!(without.len(), with.len());
        assert_eq!(without[0].extras.safe_search, Some(SafeSearch::Moderate));
        assert_eq!(with[0].extras.safe_search, Some(SafeSearch::None));
    }

    #[test]
    fn cap_observation_flags_windows_at_the_cap() {
        let mut obs = CapObservation::default();
        let w1 = (Utc::now(), Utc::now());
        obs.observe(w1, 500, 10);
        assert!(obs.any_capped());
        assert_eq!(obs.capped_fraction(), 1.0);
    }

    #[test]
    fn cap_observation_fraction_over_multiple_windows() {
        let mut obs = CapObservation::default();
        for i in 0..4 {
            let w = (Utc::now() + chrono::Duration::hours(i), Utc::now() + chrono::Duration::hours(i + 1));
            let count = if i < 3 { 500 } else { 10 };
            obs.observe(w, count, 10);
        }
        assert_eq!(obs.capped_fraction(), 0.75);
    }
}
