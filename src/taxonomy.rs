//! Static reference data: the topic-ID taxonomy, language→region map, the
//! trending region-code list, and the per-language keyword lists used to
//! seed discovery search queries for each stream.

use std::collections::BTreeMap;

/// `(topic_uri, human_readable_name)` pairs for the Google/Freebase topic
/// taxonomy this pipeline partitions search passes over.
const TOPIC_TAXONOMY: &[(&str, &str)] = &[
    ("/m/04rlf", "Music"),
    ("/m/06ntj", "Sports"),
    ("/m/02jjt", "Entertainment"),
    ("/m/019_rr", "Lifestyle"),
    ("/m/098wr", "Society"),
    ("/m/01k8wb", "Knowledge"),
    ("/m/0bzvm2", "Gaming"),
    ("/m/07c1v", "Technology"),
    ("/m/02wbm", "Food"),
    ("/m/032tl", "Fashion"),
    ("/m/041xxh", "Fitness"),
    ("/m/05qt0", "Comedy"),
];

/// Decodes a topic URI to its human-readable name. Unknown topic IDs round
/// trip unchanged.
pub fn decode_topic_id(topic_id: &str) -> String {
    TOPIC_TAXONOMY
        .iter()
        .find(|(id, _)| *id == topic_id)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| topic_id.to_string())
}

/// Encodes a human-readable topic name back to its URI, if known.
pub fn encode_topic_id(name: &str) -> String {
    TOPIC_TAXONOMY
        .iter()
        .find(|(_, n)| *n == name)
        .map(|(id, _)| id.to_string())
        .unwrap_or_else(|| name.to_string())
}

pub fn all_topic_ids() -> impl Iterator<Item = (&'static str, &'static str)> {
    TOPIC_TAXONOMY.iter().copied()
}

/// Decodes up to three topic URIs into human-readable names.
pub fn decode_topic_names(topic_ids: &[String]) -> Vec<String> {
    topic_ids.iter().take(3).map(|id| decode_topic_id(id)).collect()
}

/// Region codes searched for each keyword language when the `regioncode`
/// strategy is active.
pub fn language_region_map() -> BTreeMap<&'static str, &'static [&'static str]> {
    let mut map = BTreeMap::new();
    map.insert("english", &["US", "GB", "CA", "AU", "IN"][..]);
    map.insert("hindi", &["IN"][..]);
    map.insert("spanish", &["ES", "MX", "AR", "CO"][..]);
    map.insert("japanese", &["JP"][..]);
    map.insert("german", &["DE", "AT", "CH"][..]);
    map.insert("portuguese", &["BR", "PT"][..]);
    map.insert("korean", &["KR"][..]);
    map.insert("french", &["FR", "CA"][..]);
    map.insert("arabic", &["SA", "EG", "AE"][..]);
    map.insert("russian", &["RU"][..]);
    map.insert("indonesian", &["ID"][..]);
    map.insert("turkish", &["TR"][..]);
    map.insert("vietnamese", &["VN"][..]);
    map.insert("thai", &["TH"][..]);
    map.insert("bengali", &["BD", "IN"][..]);
    map
}

/// ISO-639-1 `relevanceLanguage` codes keyed by the same language names used
/// in the keyword lists and `language_region_map`.
pub fn relevance_language_code(language: &str) -> Option<&'static str> {
    match language {
        "english" => Some("en"),
        "hindi" => Some("hi"),
        "spanish" => Some("es"),
        "japanese" => Some("ja"),
        "german" => Some("de"),
        "portuguese" => Some("pt"),
        "korean" => Some("ko"),
        "french" => Some("fr"),
        "arabic" => Some("ar"),
        "russian" => Some("ru"),
        "indonesian" => Some("id"),
        "turkish" => Some("tr"),
        "vietnamese" => Some("vi"),
        "thai" => Some("th"),
        "bengali" => Some("bn"),
        _ => None,
    }
}

/// Intent-signaling keywords for the "intent creators" stream, across
/// several languages.
pub fn intent_keywords() -> Vec<(&'static str, &'static str)> {
    vec![
        ("welcome to my channel", "english"),
        ("my first video", "english"),
        ("mera pehla video", "hindi"),
        ("bienvenidos a mi canal", "spanish"),
        ("hajimemashite channel", "japanese"),
        ("willkommen auf meinem kanal", "german"),
        ("bem vindos ao meu canal", "portuguese"),
        ("제 채널에 오신 것을 환영합니다", "korean"),
        ("bienvenue sur ma chaine", "french"),
    ]
}

/// Content-first keywords for the "non-intent creators" comparison stream.
pub fn non_intent_keywords() -> Vec<(&'static str, &'static str)> {
    vec![
        ("gameplay walkthrough", "english"),
        ("cooking tutorial", "english"),
        ("recipe video", "english"),
        ("vlog diario", "spanish"),
        ("tutorial de maquillaje", "spanish"),
        ("gameplay japonais", "french"),
        ("let's play", "german"),
        ("receita facil", "portuguese"),
        ("게임 플레이", "korean"),
        ("gameplay walkthrough arabic", "arabic"),
    ]
}

/// Region codes enumerated by the trending collector: a representative
/// subset of the real ISO-3166-1 alpha-2 list the upstream "most popular"
/// endpoint accepts.
pub const TRENDING_REGION_CODES: &[&str] = &[
    "US", "GB", "CA", "AU", "IN", "JP", "DE", "FR", "BR", "MX", "ES", "IT", "KR", "RU", "ID",
    "TR", "VN", "TH", "PH", "NL", "SE", "NO", "DK", "FI", "PL", "AT", "CH", "BE", "PT", "GR",
    "CZ", "HU", "RO", "UA", "IE", "NZ", "ZA", "EG", "SA", "AE", "IL", "SG", "MY", "HK", "TW",
    "AR", "CL", "CO", "PE", "NG", "KE",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_round_trip_on_known_taxonomy() {
        assert_eq!(encode_topic_id(&decode_topic_id("/m/04rlf")), "/m/04rlf");
    }

    #[test]
    fn unknown_topic_id_round_trips_unchanged() {
        let unknown = "/m/99xyz";
        assert_eq!(decode_topic_id(unknown), unknown);
    }

    #[test]
    fn decode_topic_names_caps_at_three() {
        let ids: Vec<String> = TOPIC_TAXONOMY
            .iter()
            .take(5)
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(decode_topic_names(&ids).len(), 3);
    }

    #[test]
    fn language_region_map_has_entries_for_keyword_languages() {
        let map = language_region_map();
        for (_, language) in intent_keywords() {
            assert!(map.contains_key(language), "missing region map for {language}");
        }
    }

    #[test]
    fn trending_region_codes_are_unique() {
        let mut sorted = TRENDING_REGION_CODES.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), TRENDING_REGION_CODES.len());
    }
}
