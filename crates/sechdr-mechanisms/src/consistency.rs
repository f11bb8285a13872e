//! Syntactic consistency of daily live observations.
//!
//! For one resource observed once per day, tracks whether each mechanism's
//! aggregated value has stayed identical across the whole range so far.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use sechdr_core::{Headers, Origin};

use crate::{Mechanism, MISSING};

/// Aggregation applied to each observation before comparing days: either
/// [`crate::normalize_headers`] (syntactic consistency) or
/// [`crate::classified_view`] (semantic consistency).
pub type AggregateFn = fn(&Headers, Option<&Origin>) -> Headers;

/// One day's crawl result for a resource.
#[derive(Debug, Clone)]
pub struct DailyObservation {
    pub headers: Headers,
    pub origin: Option<Origin>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MechanismConsistency {
    /// Whether the mechanism's header appeared in any raw observation.
    pub deploys: bool,
    /// Per day: true while every aggregated value seen up to that day is
    /// identical. Days without an observation inherit the previous verdict.
    pub days: BTreeMap<NaiveDate, bool>,
}

/// Folds the observations of one resource over `start..=end` and reports
/// per-mechanism consistency, keyed by header name.
pub fn analyze_consistency(
    observations: &BTreeMap<NaiveDate, DailyObservation>,
    start: NaiveDate,
    end: NaiveDate,
    aggregate: AggregateFn,
) -> BTreeMap<String, MechanismConsistency> {
    let aggregated_by_day: BTreeMap<NaiveDate, Headers> = observations
        .range(start..=end)
        .map(|(day, observation)| {
            (*day, aggregate(&observation.headers, observation.origin.as_ref()))
        })
        .collect();

    Mechanism::ALL
        .iter()
        .map(|mechanism| {
            let name = mechanism.header_name();
            let mut seen: BTreeSet<String> = BTreeSet::new();
            let mut days = BTreeMap::new();
            let mut deploys = false;
            let mut verdict = true;

            let mut day = start;
            while day <= end {
                if let Some(aggregated) = aggregated_by_day.get(&day) {
                    seen.insert(aggregated.get_or(name, MISSING).to_string());
                    verdict = seen.len() == 1;
                    if let Some(observation) = observations.get(&day) {
                        deploys |= observation.headers.contains(name);
                    }
                }
                days.insert(day, verdict);
                day = day + Duration::days(1);
            }

            (name.to_string(), MechanismConsistency { deploys, days })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize_headers;

    fn day(offset: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 5, 1).unwrap() + Duration::days(offset as i64)
    }

    fn observation(pairs: &[(&str, &str)]) -> DailyObservation {
        DailyObservation {
            headers: pairs.iter().map(|(name, value)| (*name, *value)).collect(),
            origin: None,
        }
    }

    #[test]
    fn identical_values_stay_consistent() {
        let observations: BTreeMap<NaiveDate, DailyObservation> = (0..3)
            .map(|i| (day(i), observation(&[("X-Frame-Options", "DENY")])))
            .collect();
        let report = analyze_consistency(&observations, day(0), day(2), normalize_headers);
        let xfo = &report["X-Frame-Options"];
        assert!(xfo.deploys);
        assert!(xfo.days.values().all(|consistent| *consistent));
        // A header never sent is consistently <MISSING>, but not deployed.
        let hsts = &report["Strict-Transport-Security"];
        assert!(!hsts.deploys);
        assert!(hsts.days.values().all(|consistent| *consistent));
    }

    #[test]
    fn a_value_change_flips_the_verdict_permanently() {
        let mut observations = BTreeMap::new();
        observations.insert(day(0), observation(&[("X-Frame-Options", "DENY")]));
        observations.insert(day(1), observation(&[("X-Frame-Options", "SAMEORIGIN")]));
        observations.insert(day(2), observation(&[("X-Frame-Options", "DENY")]));
        let report = analyze_consistency(&observations, day(0), day(2), normalize_headers);
        let days = &report["X-Frame-Options"].days;
        assert_eq!(days[&day(0)], true);
        assert_eq!(days[&day(1)], false);
        assert_eq!(days[&day(2)], false);
    }

    #[test]
    fn missing_days_inherit_the_previous_verdict() {
        let mut observations = BTreeMap::new();
        observations.insert(day(0), observation(&[("X-Frame-Options", "DENY")]));
        observations.insert(day(2), observation(&[("X-Frame-Options", "DENY")]));
        let report = analyze_consistency(&observations, day(0), day(3), normalize_headers);
        let days = &report["X-Frame-Options"].days;
        assert!(days.values().all(|consistent| *consistent));
        assert_eq!(days.len(), 4);
    }

    #[test]
    fn case_variants_of_the_same_policy_are_consistent() {
        let mut observations = BTreeMap::new();
        observations.insert(day(0), observation(&[("X-Frame-Options", "DENY")]));
        observations.insert(day(1), observation(&[("x-frame-options", "deny")]));
        let report = analyze_consistency(&observations, day(0), day(1), normalize_headers);
        assert!(report["X-Frame-Options"].days.values().all(|consistent| *consistent));
    }
}
