//! Permissions-Policy.
//!
//! The engine defines no protection order for individual features; both
//! functions produce canonical strings used for equality comparison, the
//! classifier additionally folding origin knowledge into the allowlists.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use sechdr_core::Origin;

static ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^=]+)=(\*|\((.*)\))").expect("invalid permissions entry pattern")
});

static ALLOWLIST_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^=]+)=\((.*)\)").expect("invalid permissions allowlist pattern")
});

/// Canonical form: entries sorted, each non-`*` allowlist deduplicated and
/// sorted. Entries outside the `name=(allowlist)` / `name=*` grammar are
/// dropped.
pub fn normalize(value: &str) -> String {
    let lowered = value.to_lowercase();
    let mut directives: Vec<String> = lowered
        .split(',')
        .filter_map(|directive| {
            let caps = ENTRY.captures(directive.trim())?;
            let name = caps[1].to_string();
            let allowlist = match caps.get(3) {
                None => "*".to_string(),
                Some(content) => {
                    let members: BTreeSet<&str> = content.as_str().split_whitespace().collect();
                    format!("({})", members.into_iter().collect::<Vec<_>>().join(" "))
                }
            };
            Some(format!("{name}={allowlist}"))
        })
        .collect();
    directives.sort();
    directives.join(",")
}

/// Structural classification string.
///
/// All features default to `*`, so an allowlist containing `*` adds nothing
/// and its entry is dropped; allowlists naming the serving origin itself
/// collapse those spellings to `self`.
pub fn classify(value: &str, origin: Option<&Origin>) -> String {
    let lowered = value.to_lowercase();
    let mut directives: Vec<String> = lowered
        .split(',')
        .filter_map(|directive| {
            let caps = ALLOWLIST_ENTRY.captures(directive.trim())?;
            let name = caps[1].to_string();
            let mut members: BTreeSet<String> =
                caps[2].split_whitespace().map(str::to_string).collect();
            if members.contains("*") {
                return None;
            }
            if let Some(origin) = origin {
                let self_forms = quoted_self_forms(origin);
                if members.iter().any(|member| self_forms.contains(member)) {
                    members.retain(|member| !self_forms.contains(member));
                    members.insert("self".to_string());
                }
            }
            let list = members.into_iter().collect::<Vec<_>>().join(" ");
            Some(format!("{name}=({list})"))
        })
        .collect();
    directives.sort();
    directives.join(",")
}

/// Quoted spellings under which an allowlist can name the serving origin.
fn quoted_self_forms(origin: &Origin) -> BTreeSet<String> {
    [origin.to_string(), origin.secure(), origin.host_port()]
        .into_iter()
        .flat_map(|base| [format!("\"{base}\""), format!("\"{base}/\"")])
        .collect()
}
