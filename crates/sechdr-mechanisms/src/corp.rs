//! Cross-Origin-Resource-Policy.

use sechdr_core::level::Corp;

/// Single-token header; canonicalization is a trim plus case fold.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn classify(value: &str) -> Corp {
    match normalize(value).as_str() {
        "same-origin" => Corp::SameOrigin,
        "same-site" => Corp::SameSite,
        _ => Corp::CrossOrigin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_values_classify() {
        assert_eq!(classify("same-origin"), Corp::SameOrigin);
        assert_eq!(classify(" Same-Site "), Corp::SameSite);
    }

    #[test]
    fn everything_else_is_cross_origin() {
        assert_eq!(classify(""), Corp::CrossOrigin);
        assert_eq!(classify("cross-origin"), Corp::CrossOrigin);
        assert_eq!(classify("same-origin; foo"), Corp::CrossOrigin);
    }
}
