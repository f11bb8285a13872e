//! Cross-Origin-Opener-Policy.

use sechdr_core::level::Coop;

/// Segment order is kept; the first `;`-segment is the operative directive,
/// later ones carry parameters such as report endpoints.
pub fn normalize(value: &str) -> String {
    value.to_lowercase().split(';').map(str::trim).collect::<Vec<_>>().join(";")
}

pub fn classify(value: &str) -> Coop {
    let normalized = normalize(value);
    match normalized.split(';').next().unwrap_or("") {
        "same-origin" => Coop::SameOrigin,
        "same-origin-allow-popups" => Coop::SameOriginAllowPopups,
        _ => Coop::UnsafeNone,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_segment_decides() {
        assert_eq!(classify("same-origin"), Coop::SameOrigin);
        assert_eq!(classify("same-origin; report-to=\"default\""), Coop::SameOrigin);
        assert_eq!(classify("same-origin-allow-popups"), Coop::SameOriginAllowPopups);
    }

    #[test]
    fn unrecognized_values_are_unsafe() {
        assert_eq!(classify(""), Coop::UnsafeNone);
        assert_eq!(classify("unsafe-none"), Coop::UnsafeNone);
        assert_eq!(classify("noopener-allow-popups"), Coop::UnsafeNone);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify("Same-Origin"), Coop::SameOrigin);
    }
}
