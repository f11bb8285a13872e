//! Strict-Transport-Security (RFC 6797).

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use sechdr_core::level::{HstsAge, HstsPreload, HstsSub};

const SECONDS_PER_YEAR: u128 = 60 * 60 * 24 * 365;

/// Strict `max-age` grammar: digits, optionally quoted on both sides.
static MAX_AGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^max-age=(?:"(\d+)"|(\d+))$"#).expect("invalid max-age pattern")
});

/// RFC 6797 §6.1 leaves multiple header instances undefined and mandates
/// processing only one, so everything after the first comma is dropped.
/// Directives are lowercased, trimmed and sorted.
pub fn normalize(value: &str) -> String {
    let lowered = value.to_lowercase();
    let first = lowered.split(',').next().unwrap_or("");
    let mut tokens: Vec<&str> = first.split(';').map(str::trim).collect();
    tokens.sort_unstable();
    tokens.join(";")
}

fn classify_age(max_age: Option<u128>) -> HstsAge {
    match max_age {
        None => HstsAge::Absent,
        Some(0) => HstsAge::Disabled,
        Some(age) if age < SECONDS_PER_YEAR => HstsAge::Low,
        Some(_) => HstsAge::Big,
    }
}

/// Classifies a header value into its `(Age, Sub, Preload)` triple.
///
/// A repeated directive name or a `max-age` value outside the strict grammar
/// invalidates the whole header (both are RFC violations) and yields the
/// all-weakest triple.
pub fn classify(value: &str) -> (HstsAge, HstsSub, HstsPreload) {
    const INVALID: (HstsAge, HstsSub, HstsPreload) =
        (HstsAge::Absent, HstsSub::Absent, HstsPreload::Absent);

    let mut max_age = None;
    let mut include_sub_domains = false;
    let mut preload = false;
    let mut seen = BTreeSet::new();

    for token in normalize(value).split(';') {
        let directive = token.split('=').next().unwrap_or(token);
        if !seen.insert(directive.to_string()) {
            return INVALID;
        }
        match directive {
            "max-age" => {
                let Some(parsed) = MAX_AGE
                    .captures(token)
                    .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
                    .and_then(|digits| digits.as_str().parse::<u128>().ok())
                else {
                    return INVALID;
                };
                max_age = Some(parsed);
            }
            "includesubdomains" => include_sub_domains = true,
            "preload" => preload = true,
            _ => {}
        }
    }

    let age = classify_age(max_age);
    // A zero or absent max-age nullifies includeSubDomains, and the preload
    // list requires both includeSubDomains and a max-age of at least a year.
    let sub = if include_sub_domains && !matches!(age, HstsAge::Absent | HstsAge::Disabled) {
        HstsSub::Active
    } else {
        HstsSub::Absent
    };
    let preload = if preload && include_sub_domains && age == HstsAge::Big {
        HstsPreload::Active
    } else {
        HstsPreload::Absent
    };
    (age, sub, preload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEAKEST: (HstsAge, HstsSub, HstsPreload) =
        (HstsAge::Absent, HstsSub::Absent, HstsPreload::Absent);

    #[test]
    fn normalize_sorts_and_lowercases_directives() {
        assert_eq!(
            normalize("Preload; Max-Age=31536000; IncludeSubDomains"),
            "includesubdomains;max-age=31536000;preload"
        );
    }

    #[test]
    fn normalize_keeps_only_the_first_instance() {
        assert_eq!(normalize("max-age=100, max-age=200"), "max-age=100");
    }

    #[test]
    fn normalize_is_idempotent_and_case_insensitive() {
        let value = "Max-Age=31536000; includeSubDomains";
        assert_eq!(normalize(&normalize(value)), normalize(value));
        assert_eq!(normalize(&value.to_uppercase()), normalize(value));
    }

    #[test]
    fn full_deployment_classifies_to_the_strongest_triple() {
        assert_eq!(
            classify("max-age=31536000; includeSubDomains; preload"),
            (HstsAge::Big, HstsSub::Active, HstsPreload::Active)
        );
    }

    #[test]
    fn zero_max_age_disables_and_nullifies_subdomains() {
        assert_eq!(classify("max-age=0"), (HstsAge::Disabled, HstsSub::Absent, HstsPreload::Absent));
        assert_eq!(
            classify("max-age=0; includeSubDomains"),
            (HstsAge::Disabled, HstsSub::Absent, HstsPreload::Absent)
        );
    }

    #[test]
    fn short_max_age_blocks_preload() {
        assert_eq!(
            classify("max-age=3600; includeSubDomains; preload"),
            (HstsAge::Low, HstsSub::Active, HstsPreload::Absent)
        );
    }

    #[test]
    fn preload_requires_subdomains() {
        assert_eq!(
            classify("max-age=31536000; preload"),
            (HstsAge::Big, HstsSub::Absent, HstsPreload::Absent)
        );
    }

    #[test]
    fn duplicate_directives_invalidate_the_header() {
        assert_eq!(classify("max-age=100; max-age=200"), WEAKEST);
        assert_eq!(classify("includeSubDomains; includesubdomains; max-age=31536000"), WEAKEST);
    }

    #[test]
    fn malformed_max_age_invalidates_the_header() {
        assert_eq!(classify("max-age=abc"), WEAKEST);
        assert_eq!(classify("max-age="), WEAKEST);
        assert_eq!(classify("max-age=\"100"), WEAKEST);
        assert_eq!(classify("max-age=1.5"), WEAKEST);
    }

    #[test]
    fn quoted_max_age_is_accepted() {
        assert_eq!(
            classify("max-age=\"31536000\""),
            (HstsAge::Big, HstsSub::Absent, HstsPreload::Absent)
        );
    }

    #[test]
    fn empty_value_has_no_directives() {
        assert_eq!(classify(""), WEAKEST);
    }

    #[test]
    fn unknown_directives_are_ignored() {
        assert_eq!(
            classify("max-age=31536000; unknown-token"),
            (HstsAge::Big, HstsSub::Absent, HstsPreload::Absent)
        );
    }
}
