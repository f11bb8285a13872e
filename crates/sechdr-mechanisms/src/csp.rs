//! Content-Security-Policy.
//!
//! One header value is a comma-separated list of policies, each policy a
//! `;`-separated list of directives, each directive a name followed by
//! whitespace-separated source tokens. Three independent use-cases are
//! classified: XSS mitigation, framing control and TLS enforcement.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use sechdr_core::level::{CspFraming, CspTls, CspXss};
use sechdr_core::{max_by_rank, Origin};

/// Directives relevant to each of the three use-cases.
pub const XSS_DIRECTIVES: [&str; 2] = ["default-src", "script-src"];
pub const FRAMING_DIRECTIVES: [&str; 1] = ["frame-ancestors"];
pub const TLS_DIRECTIVES: [&str; 2] = ["block-all-mixed-content", "upgrade-insecure-requests"];

// Nonces and hashes are fresh per response and reporting endpoints are often
// session-scoped URLs; all three are collapsed to fixed placeholders so that
// otherwise-identical policies compare equal across observations.
static NONCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)'nonce-[A-Za-z0-9+/\-_]+={0,2}'").expect("invalid nonce pattern")
});
static HASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)'sha(256|384|512)-[A-Za-z0-9+/\-_]+={0,2}'").expect("invalid hash pattern")
});
static REPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)report-(uri|to)[^;,]*").expect("invalid report pattern")
});

fn redact(value: &str) -> String {
    let value = NONCE.replace_all(value, "'nonce-VALUE'");
    let value = HASH.replace_all(&value, "'sha${1}-VALUE'");
    REPORT.replace_all(&value, "report-${1} REPORT_URI").into_owned()
}

/// Canonical form of a whole header value.
pub fn normalize(value: &str) -> String {
    normalize_directives(value, None)
}

/// Canonical form restricted to `allowed` directive names, used to project a
/// policy onto the directive subset of one use-case.
///
/// Redaction runs on the raw value before any tokenizing; the placeholders
/// are fixed points of the redaction patterns, which keeps the whole
/// function idempotent.
pub fn normalize_directives(value: &str, allowed: Option<&[&str]>) -> String {
    let redacted = redact(value).to_lowercase();
    let mut policies: Vec<String> = redacted
        .split(',')
        .map(|policy| {
            let mut directives: Vec<String> = policy
                .trim()
                .split(';')
                .filter_map(|directive| {
                    let mut tokens: Vec<&str> = directive.split_whitespace().collect();
                    if tokens.is_empty() {
                        return None;
                    }
                    let name = tokens.remove(0);
                    if let Some(allowed) = allowed {
                        if !allowed.contains(&name) {
                            return None;
                        }
                    }
                    tokens.sort_unstable();
                    let mut line = name.to_string();
                    for token in tokens {
                        line.push(' ');
                        line.push_str(token);
                    }
                    Some(line)
                })
                .collect();
            directives.sort();
            directives.join(";")
        })
        .collect();
    policies.sort();
    policies.join(",")
}

/// Directive map of a single policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    directives: BTreeMap<String, BTreeSet<String>>,
}

impl Policy {
    /// Adds a directive unless the name was already present: within one
    /// policy, browsers honor only the first occurrence of a directive.
    pub fn add_directive(&mut self, name: &str, tokens: BTreeSet<String>) -> bool {
        let name = name.to_lowercase();
        if self.directives.contains_key(&name) {
            return false;
        }
        self.directives.insert(name, tokens);
        true
    }

    pub fn directive(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.directives.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.directives.contains_key(&name.to_lowercase())
    }
}

/// Splits a header value into its comma-separated policies.
pub fn parse(value: &str) -> Vec<Policy> {
    value
        .trim()
        .split(',')
        .map(|policy| {
            let mut parsed = Policy::default();
            for directive in policy.trim().split(';') {
                let mut tokens = directive.split_whitespace();
                let Some(name) = tokens.next() else {
                    continue;
                };
                parsed.add_directive(name, tokens.map(str::to_string).collect());
            }
            parsed
        })
        .collect()
}

// Escapes that neutralize 'unsafe-inline' (post-redaction spellings).
const SECURE_INLINE_ESCAPES: [&str; 5] =
    ["'nonce-value'", "'sha256-value'", "'sha384-value'", "'sha512-value'", "'strict-dynamic'"];

const BROAD_SCRIPT_SOURCES: [&str; 8] =
    ["*", "http:", "http://", "http://*", "https:", "https://", "https://*", "data:"];

const BROAD_ANCESTOR_SOURCES: [&str; 7] =
    ["*", "http:", "http://", "http://*", "https:", "https://", "https://*"];

fn policy_xss(policy: &Policy) -> CspXss {
    let Some(sources) =
        policy.directive("script-src").or_else(|| policy.directive("default-src"))
    else {
        return CspXss::Unsafe;
    };
    let escaped = SECURE_INLINE_ESCAPES.iter().any(|escape| sources.contains(*escape));
    if sources.contains("'unsafe-inline'") && !escaped {
        return CspXss::Unsafe;
    }
    let broad = BROAD_SCRIPT_SOURCES.iter().any(|source| sources.contains(*source));
    if broad && !sources.contains("'strict-dynamic'") {
        return CspXss::Unsafe;
    }
    CspXss::Safe
}

fn policy_framing(policy: &Policy, origin: Option<&Origin>) -> CspFraming {
    let Some(sources) = policy.directive("frame-ancestors") else {
        return CspFraming::Unsafe;
    };
    if sources.is_empty() || (sources.len() == 1 && sources.contains("'none'")) {
        return CspFraming::None;
    }
    let self_forms = self_source_forms(origin);
    if sources.iter().all(|source| self_forms.contains(source)) {
        return CspFraming::SelfOnly;
    }
    if BROAD_ANCESTOR_SOURCES.iter().any(|source| sources.contains(*source)) {
        return CspFraming::Unsafe;
    }
    CspFraming::Constrained
}

/// The source forms a policy can use to allow exactly its own origin:
/// `'self'`, the origin with and without a trailing slash, its
/// https-upgraded form, and the bare host[:port].
fn self_source_forms(origin: Option<&Origin>) -> BTreeSet<String> {
    let mut forms = BTreeSet::from(["'self'".to_string()]);
    if let Some(origin) = origin {
        for base in [origin.to_string(), origin.secure(), origin.host_port()] {
            forms.insert(format!("{base}/"));
            forms.insert(base);
        }
    }
    forms
}

fn policy_tls(policy: &Policy) -> CspTls {
    // block-all-mixed-content subsumes the upgrade behaviour, so it wins
    // when both directives are present.
    if policy.contains("block-all-mixed-content") {
        CspTls::BlockAllMixedContent
    } else if policy.contains("upgrade-insecure-requests") {
        CspTls::UpgradeInsecureRequests
    } else {
        CspTls::Unsafe
    }
}

// The classify_* folds below reduce multiple concurrently delivered policies
// to the single most protective one. Browsers enforce the intersection of
// all delivered policies, so this is an upper bound on the deployed
// protection, intended for measurement rather than enforcement.

pub fn classify_xss(value: &str) -> CspXss {
    parse(&normalize(value))
        .iter()
        .fold(CspXss::Unsafe, |acc, policy| max_by_rank(acc, policy_xss(policy)))
}

pub fn classify_framing(value: &str, origin: Option<&Origin>) -> CspFraming {
    parse(&normalize(value))
        .iter()
        .fold(CspFraming::Unsafe, |acc, policy| max_by_rank(acc, policy_framing(policy, origin)))
}

pub fn classify_tls(value: &str) -> CspTls {
    parse(&normalize(value))
        .iter()
        .fold(CspTls::Unsafe, |acc, policy| max_by_rank(acc, policy_tls(policy)))
}

/// All three use-cases at once.
pub fn classify(value: &str, origin: Option<&Origin>) -> (CspXss, CspFraming, CspTls) {
    (classify_xss(value), classify_framing(value, origin), classify_tls(value))
}
