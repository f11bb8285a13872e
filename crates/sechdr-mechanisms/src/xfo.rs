//! X-Frame-Options.

use sechdr_core::level::Xfo;

pub fn normalize(value: &str) -> String {
    let lowered = value.to_lowercase();
    let mut tokens: Vec<&str> = lowered.split(',').map(str::trim).collect();
    tokens.sort_unstable();
    tokens.join(",")
}

/// Modern browsers only honor `DENY` and `SAMEORIGIN`; everything else,
/// including the obsolete `ALLOW-FROM`, provides no framing protection.
pub fn classify(value: &str) -> Xfo {
    match normalize(value).as_str() {
        "deny" => Xfo::Deny,
        "sameorigin" => Xfo::Sameorigin,
        _ => Xfo::Unsafe,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_values_classify_exactly() {
        assert_eq!(classify("DENY"), Xfo::Deny);
        assert_eq!(classify("deny"), Xfo::Deny);
        assert_eq!(classify("SAMEORIGIN"), Xfo::Sameorigin);
        assert_eq!(classify(" sameorigin "), Xfo::Sameorigin);
    }

    #[test]
    fn allow_from_is_unsafe() {
        assert_eq!(classify("ALLOW-FROM https://example.com"), Xfo::Unsafe);
    }

    #[test]
    fn garbage_and_empty_are_unsafe() {
        assert_eq!(classify(""), Xfo::Unsafe);
        assert_eq!(classify("denyy"), Xfo::Unsafe);
        assert_eq!(classify("deny, sameorigin"), Xfo::Unsafe);
    }

    #[test]
    fn normalize_sorts_comma_tokens() {
        assert_eq!(normalize("SAMEORIGIN, DENY"), "deny,sameorigin");
        assert_eq!(normalize(&normalize("SAMEORIGIN, DENY")), "deny,sameorigin");
    }
}
