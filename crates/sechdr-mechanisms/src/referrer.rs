//! Referrer-Policy.

use sechdr_core::level::ReferrerPolicy;

const KNOWN_POLICIES: [&str; 8] = [
    "unsafe-url",
    "same-origin",
    "no-referrer",
    "no-referrer-when-downgrade",
    "origin",
    "origin-when-cross-origin",
    "strict-origin",
    "strict-origin-when-cross-origin",
];

/// Token order is preserved: the position of the last valid token decides
/// the classification.
pub fn normalize(value: &str) -> String {
    value.to_lowercase().split(',').map(str::trim).collect::<Vec<_>>().join(",")
}

/// Scans the comma-separated list and keeps the last recognized policy
/// value; unknown tokens are skipped. With no recognized token the browser
/// default `strict-origin-when-cross-origin` applies.
pub fn classify(value: &str) -> ReferrerPolicy {
    let normalized = normalize(value);
    let mut policy = "";
    for token in normalized.split(',') {
        if KNOWN_POLICIES.contains(&token) {
            policy = token;
        }
    }
    match policy {
        "unsafe-url" => ReferrerPolicy::UnsafeUrl,
        "same-origin" => ReferrerPolicy::SameOrigin,
        "no-referrer" => ReferrerPolicy::NoReferrer,
        "no-referrer-when-downgrade" => ReferrerPolicy::NoReferrerWhenDowngrade,
        "origin" => ReferrerPolicy::Origin,
        "origin-when-cross-origin" => ReferrerPolicy::OriginWhenCrossOrigin,
        "strict-origin" => ReferrerPolicy::StrictOrigin,
        _ => ReferrerPolicy::StrictOriginWhenCrossOrigin,
    }
}
