//! Snapshot stability state machine.
//!
//! Folds the per-day observations of one archived resource into a status
//! timeline. Observations must arrive in strictly increasing day order for a
//! fixed resource identity; distinct identities are independent and can be
//! folded in parallel.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Capture jitter tolerated before a hit is treated as absent. Archives
/// routinely answer a request for day D with a capture from D±1.
pub const CAPTURE_TOLERANCE_DAYS: i64 = 1;

fn capture_tolerance() -> Duration {
    Duration::days(CAPTURE_TOLERANCE_DAYS)
}

/// One day's observation of an archived resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotEvent {
    /// The archive had no snapshot to serve for this day.
    NoData,
    /// A snapshot was served.
    Hit {
        /// Opaque content identity used to detect modification; only the
        /// last hit's identity takes part in the comparison.
        content: String,
        captured_at: DateTime<Utc>,
        status_code: u16,
    },
    /// The archive answered 404 for a previously known resource.
    Miss404,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapshotStatus {
    Missing,
    Added,
    Modified,
    Removed,
    Unmodified,
}

impl SnapshotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotStatus::Missing => "MISSING",
            SnapshotStatus::Added => "ADDED",
            SnapshotStatus::Modified => "MODIFIED",
            SnapshotStatus::Removed => "REMOVED",
            SnapshotStatus::Unmodified => "UNMODIFIED",
        }
    }

    /// True while the resource counts as present in the archive.
    pub fn is_present(&self) -> bool {
        matches!(
            self,
            SnapshotStatus::Added | SnapshotStatus::Modified | SnapshotStatus::Unmodified
        )
    }
}

/// Per-resource automaton over [`SnapshotEvent`]s.
///
/// `nominal` is the capture instant the archive was asked for; hits whose
/// actual capture time lies more than [`CAPTURE_TOLERANCE_DAYS`] away from
/// it are treated exactly like [`SnapshotEvent::NoData`].
#[derive(Debug, Clone)]
pub struct StabilityMachine {
    nominal: DateTime<Utc>,
    status: SnapshotStatus,
    last_content: Option<String>,
    last_capture: Option<DateTime<Utc>>,
}

impl StabilityMachine {
    pub fn new(nominal: DateTime<Utc>) -> Self {
        Self {
            nominal,
            status: SnapshotStatus::Missing,
            last_content: None,
            last_capture: None,
        }
    }

    pub fn status(&self) -> SnapshotStatus {
        self.status
    }

    /// Capture time of the last tolerated hit, if any.
    pub fn last_capture(&self) -> Option<DateTime<Utc>> {
        self.last_capture
    }

    /// Advances the automaton by one day's event and returns the new status.
    pub fn step(&mut self, event: &SnapshotEvent) -> SnapshotStatus {
        let next = match event {
            SnapshotEvent::NoData => self.absent_step(),
            SnapshotEvent::Miss404 => {
                if self.status.is_present() {
                    SnapshotStatus::Removed
                } else {
                    SnapshotStatus::Missing
                }
            }
            SnapshotEvent::Hit { content, captured_at, .. } => {
                if (*captured_at - self.nominal).abs() > capture_tolerance() {
                    self.absent_step()
                } else {
                    let next = match self.status {
                        SnapshotStatus::Missing | SnapshotStatus::Removed => SnapshotStatus::Added,
                        _ if self.last_content.as_deref() == Some(content.as_str()) => {
                            SnapshotStatus::Unmodified
                        }
                        _ => SnapshotStatus::Modified,
                    };
                    self.last_content = Some(content.clone());
                    self.last_capture = Some(*captured_at);
                    next
                }
            }
        };
        self.status = next;
        next
    }

    fn absent_step(&self) -> SnapshotStatus {
        match self.status {
            SnapshotStatus::Added | SnapshotStatus::Modified => SnapshotStatus::Unmodified,
            SnapshotStatus::Removed => SnapshotStatus::Missing,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineEntry {
    pub day: NaiveDate,
    pub status: SnapshotStatus,
    /// Capture drift (last tolerated capture minus the nominal instant),
    /// recorded only on the day a removal is detected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift_seconds: Option<i64>,
}

/// Day-indexed status timeline of one resource, with aggregate churn counts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StabilityTimeline {
    pub entries: Vec<TimelineEntry>,
    pub additions: usize,
    pub updates: usize,
    pub deletions: usize,
}

/// Folds day-ordered observations through the automaton.
///
/// The caller must supply `observations` in strictly increasing day order;
/// the timeline is only ever extended forward, never revised.
pub fn build_stability_timeline(
    nominal: DateTime<Utc>,
    observations: &[(NaiveDate, SnapshotEvent)],
) -> StabilityTimeline {
    debug_assert!(
        observations.windows(2).all(|pair| pair[0].0 < pair[1].0),
        "observations must be in strictly increasing day order"
    );

    let mut machine = StabilityMachine::new(nominal);
    let mut entries = Vec::with_capacity(observations.len());
    let mut additions = 0;
    let mut updates = 0;
    let mut deletions = 0;

    for (day, event) in observations {
        let status = machine.step(event);
        let mut drift_seconds = None;
        match status {
            SnapshotStatus::Added => additions += 1,
            SnapshotStatus::Modified => updates += 1,
            SnapshotStatus::Removed => {
                deletions += 1;
                drift_seconds =
                    machine.last_capture().map(|capture| (capture - nominal).num_seconds());
            }
            _ => {}
        }
        entries.push(TimelineEntry { day: *day, status, drift_seconds });
    }

    StabilityTimeline { entries, additions, updates, deletions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn nominal() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap()
    }

    fn day(offset: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 5, 1).unwrap() + Duration::days(offset as i64)
    }

    fn hit(content: &str) -> SnapshotEvent {
        SnapshotEvent::Hit {
            content: content.to_string(),
            captured_at: nominal(),
            status_code: 200,
        }
    }

    fn statuses(events: &[SnapshotEvent]) -> Vec<SnapshotStatus> {
        let observations: Vec<_> =
            events.iter().enumerate().map(|(i, e)| (day(i as u64), e.clone())).collect();
        build_stability_timeline(nominal(), &observations)
            .entries
            .into_iter()
            .map(|entry| entry.status)
            .collect()
    }

    #[test]
    fn add_keep_modify_remove_lifecycle() {
        use SnapshotStatus::*;
        let got = statuses(&[
            hit("A"),
            SnapshotEvent::NoData,
            hit("A"),
            hit("B"),
            SnapshotEvent::Miss404,
        ]);
        assert_eq!(got, vec![Added, Unmodified, Unmodified, Modified, Removed]);
    }

    #[test]
    fn never_observed_stays_missing() {
        let got = statuses(&[
            SnapshotEvent::NoData,
            SnapshotEvent::NoData,
            SnapshotEvent::NoData,
        ]);
        assert!(got.iter().all(|status| *status == SnapshotStatus::Missing));
    }

    #[test]
    fn miss_before_any_hit_stays_missing() {
        use SnapshotStatus::*;
        let got = statuses(&[SnapshotEvent::Miss404, hit("A"), SnapshotEvent::Miss404]);
        assert_eq!(got, vec![Missing, Added, Removed]);
    }

    #[test]
    fn removed_then_nodata_decays_to_missing_and_rehit_is_added() {
        use SnapshotStatus::*;
        let got = statuses(&[hit("A"), SnapshotEvent::Miss404, SnapshotEvent::NoData, hit("A")]);
        assert_eq!(got, vec![Added, Removed, Missing, Added]);
    }

    #[test]
    fn out_of_tolerance_hit_behaves_like_nodata() {
        use SnapshotStatus::*;
        let stale = SnapshotEvent::Hit {
            content: "B".to_string(),
            captured_at: nominal() - Duration::days(3),
            status_code: 200,
        };
        let got = statuses(&[stale.clone(), hit("A"), stale, hit("A")]);
        // A stale hit neither adds the resource nor counts as modification.
        assert_eq!(got, vec![Missing, Added, Unmodified, Unmodified]);
    }

    #[test]
    fn capture_exactly_on_the_tolerance_edge_is_kept() {
        use SnapshotStatus::*;
        let edge = SnapshotEvent::Hit {
            content: "A".to_string(),
            captured_at: nominal() + Duration::days(CAPTURE_TOLERANCE_DAYS),
            status_code: 200,
        };
        assert_eq!(statuses(&[edge]), vec![Added]);
    }

    #[test]
    fn content_comparison_uses_only_the_last_hit() {
        use SnapshotStatus::*;
        // A -> B -> A: the final hit differs from the previous one (B), so
        // it counts as modified even though A was seen before.
        let got = statuses(&[hit("A"), hit("B"), hit("A")]);
        assert_eq!(got, vec![Added, Modified, Modified]);
    }

    #[test]
    fn timeline_counts_and_drift() {
        let capture = nominal() + Duration::hours(20);
        let observations = vec![
            (
                day(0),
                SnapshotEvent::Hit {
                    content: "A".to_string(),
                    captured_at: capture,
                    status_code: 200,
                },
            ),
            (day(1), SnapshotEvent::Hit { content: "B".to_string(), captured_at: capture, status_code: 200 }),
            (day(2), SnapshotEvent::Miss404),
        ];
        let timeline = build_stability_timeline(nominal(), &observations);
        assert_eq!((timeline.additions, timeline.updates, timeline.deletions), (1, 1, 1));
        assert_eq!(timeline.entries[0].drift_seconds, None);
        assert_eq!(timeline.entries[2].drift_seconds, Some(20 * 3600));
    }
}
