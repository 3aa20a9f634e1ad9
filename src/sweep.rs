//! Pairwise comparison of consecutive channel snapshots: classifies each
//! channel's change from one sweep to the next and flags anomalies.

use crate::health::Severity;
use crate::model::ChannelSnapshot;
use std::collections::{HashMap, HashSet};

const MAX_SUBSCRIBER_DROP_PCT: f64 = 0.50;

#[derive(Debug, Clone, PartialEq)]
pub enum Anomaly {
    Duplicate,
    MissingField { field: String },
    ViewDecrease { previous: i64, current: i64 },
    SubscriberDrop { previous: i64, current: i64, drop_pct: f64 },
    VideoCountDecrease { previous: i64, current: i64 },
    KidFlagFlip { previous: Option<bool>, current: Option<bool> },
}

impl Anomaly {
    pub fn severity(&self) -> Severity {
        match self {
            Anomaly::Duplicate | Anomaly::MissingField { .. } => Severity::Critical,
            Anomaly::ViewDecrease { .. } | Anomaly::SubscriberDrop { .. } => Severity::Warning,
            Anomaly::VideoCountDecrease { .. } | Anomaly::KidFlagFlip { .. } => Severity::Ok,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SweepTransition {
    New,
    Missing,
    Stable,
    Anomalous(Vec<Anomaly>),
}

impl SweepTransition {
    pub fn severity(&self) -> Severity {
        match self {
            SweepTransition::New | SweepTransition::Stable => Severity::Ok,
            SweepTransition::Missing => Severity::Warning,
            SweepTransition::Anomalous(anomalies) => anomalies.iter().map(Anomaly::severity).max().unwrap_or(Severity::Ok),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepFinding {
    pub channel_id: String,
    pub transition: SweepTransition,
}

#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub findings: Vec<SweepFinding>,
    pub total_channels: usize,
}

impl SweepReport {
    pub fn overall_severity(&self) -> Severity {
        self.findings.iter().map(|f| f.transition.severity()).max().unwrap_or(Severity::Ok)
    }

    pub fn anomalies(&self) -> impl Iterator<Item = &SweepFinding> {
        self.findings.iter().filter(|f| matches!(f.transition, SweepTransition::Anomalous(_)))
    }
}

pub struct SweepValidator;

impl SweepValidator {
    pub fn compare(current: &[ChannelSnapshot], previous: &[ChannelSnapshot]) -> SweepReport {
        let mut findings = Vec::new();
        let mut seen = HashSet::new();

        for channel in current {
            if !seen.insert(channel.channel_id.clone()) {
                findings.push(SweepFinding {
                    channel_id: channel.channel_id.clone(),
                    transition: SweepTransition::Anomalous(vec![Anomaly::Duplicate]),
                });
            }
        }

        let previous_by_id: HashMap<&str, &ChannelSnapshot> =
            previous.iter().map(|c| (c.channel_id.as_str(), c)).collect();

        for channel in current {
            let mut anomalies = required_field_anomalies(channel);

            let Some(previous_snapshot) = previous_by_id.get(channel.channel_id.as_str()) else {
                if anomalies.is_empty() {
                    findings.push(SweepFinding { channel_id: channel.channel_id.clone(), transition: SweepTransition::New });
                } else {
                    findings.push(SweepFinding { channel_id: channel.channel_id.clone(), transition: SweepTransition::Anomalous(anomalies) });
                }
                continue;
            };

            if channel.status.as_deref() == Some("not_found") {
                findings.push(SweepFinding { channel_id: channel.channel_id.clone(), transition: SweepTransition::Missing });
                continue;
            }

            anomalies.extend(pairwise_anomalies(channel, previous_snapshot));

            let transition = if anomalies.is_empty() { SweepTransition::Stable } else { SweepTransition::Anomalous(anomalies) };
            findings.push(SweepFinding { channel_id: channel.channel_id.clone(), transition });
        }

        SweepReport { total_channels: current.len(), findings }
    }
}

fn required_field_anomalies(channel: &ChannelSnapshot) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    if channel.channel_id.trim().is_empty() {
        anomalies.push(Anomaly::MissingField { field: "channel_id".to_string() });
    }
    if channel.title.trim().is_empty() && channel.status.as_deref() != Some("not_found") {
        anomalies.push(Anomaly::MissingField { field: "title".to_string() });
    }
    anomalies
}

fn pairwise_anomalies(current: &ChannelSnapshot, previous: &ChannelSnapshot) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    let curr_views = current.view_count.unwrap_or(0);
    let prev_views = previous.view_count.unwrap_or(0);
    if curr_views < prev_views {
        anomalies.push(Anomaly::ViewDecrease { previous: prev_views, current: curr_views });
    }

    let curr_subs = current.subscriber_count.unwrap_or(0);
    let prev_subs = previous.subscriber_count.unwrap_or(0);
    if prev_subs > 0 {
        let drop_pct = (prev_subs - curr_subs) as f64 / prev_subs as f64;
        if drop_pct > MAX_SUBSCRIBER_DROP_PCT {
            anomalies.push(Anomaly::SubscriberDrop { previous: prev_subs, current: curr_subs, drop_pct });
        }
    }

    let curr_videos = current.video_count.unwrap_or(0);
    let prev_videos = previous.video_count.unwrap_or(0);
    if curr_videos < prev_videos {
        anomalies.push(Anomaly::VideoCountDecrease { previous: prev_videos, current: curr_videos });
    }

    if current.made_for_kids != previous.made_for_kids {
        anomalies.push(Anomaly::KidFlagFlip { previous: previous.made_for_kids, current: current.made_for_kids });
    }

    anomalies
}
