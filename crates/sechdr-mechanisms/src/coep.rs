//! Cross-Origin-Embedder-Policy.

use sechdr_core::level::Coep;

/// Same shape as COOP: the first `;`-segment is the operative directive.
pub fn normalize(value: &str) -> String {
    value.to_lowercase().split(';').map(str::trim).collect::<Vec<_>>().join(";")
}

pub fn classify(value: &str) -> Coep {
    let normalized = normalize(value);
    match normalized.split(';').next().unwrap_or("") {
        "require-corp" => Coep::RequireCorp,
        "credentialless" => Coep::Credentialless,
        _ => Coep::UnsafeNone,
    }
}
