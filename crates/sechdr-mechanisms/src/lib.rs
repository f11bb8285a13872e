//! Per-mechanism security header normalizers and classifiers.
//!
//! Each module owns one browser-enforced mechanism: a `normalize` function
//! producing the canonical form used for syntactic equality across
//! observations, and a `classify` function mapping a raw value onto the
//! mechanism's ordered security levels. Classification never fails; input
//! the grammar rejects degrades to the weakest level.

pub mod coep;
pub mod consistency;
pub mod coop;
pub mod corp;
pub mod csp;
pub mod hsts;
pub mod permissions;
pub mod referrer;
pub mod xfo;

use serde::{Deserialize, Serialize};

use sechdr_core::level::{
    Coep, Coop, Corp, CspFraming, CspTls, CspXss, HstsAge, HstsPreload, HstsSub, ReferrerPolicy,
    Xfo,
};
use sechdr_core::{Headers, Origin};

/// Canonical form of a header that was absent from the observation.
pub const MISSING: &str = "<MISSING>";

/// Keys under which the three CSP use-case projections are reported.
pub const CSP_XSS_KEY: &str = "Content-Security-Policy::XSS";
pub const CSP_FRAMING_KEY: &str = "Content-Security-Policy::FA";
pub const CSP_TLS_KEY: &str = "Content-Security-Policy::TLS";

/// The browser-enforced security mechanisms this engine understands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub enum Mechanism {
    Hsts,
    Xfo,
    Csp,
    PermissionsPolicy,
    ReferrerPolicy,
    Coop,
    Corp,
    Coep,
}

impl Mechanism {
    pub const ALL: [Mechanism; 8] = [
        Mechanism::Hsts,
        Mechanism::Xfo,
        Mechanism::Csp,
        Mechanism::PermissionsPolicy,
        Mechanism::ReferrerPolicy,
        Mechanism::Coop,
        Mechanism::Corp,
        Mechanism::Coep,
    ];

    /// The response header carrying this mechanism.
    pub fn header_name(&self) -> &'static str {
        match self {
            Mechanism::Hsts => "Strict-Transport-Security",
            Mechanism::Xfo => "X-Frame-Options",
            Mechanism::Csp => "Content-Security-Policy",
            Mechanism::PermissionsPolicy => "Permissions-Policy",
            Mechanism::ReferrerPolicy => "Referrer-Policy",
            Mechanism::Coop => "Cross-Origin-Opener-Policy",
            Mechanism::Corp => "Cross-Origin-Resource-Policy",
            Mechanism::Coep => "Cross-Origin-Embedder-Policy",
        }
    }
}

/// Canonical syntactic form of a raw header value. Idempotent and
/// case-insensitive for every mechanism; used only for equality testing,
/// never to decide safety.
pub fn normalize(mechanism: Mechanism, raw: &str) -> String {
    match mechanism {
        Mechanism::Hsts => hsts::normalize(raw),
        Mechanism::Xfo => xfo::normalize(raw),
        Mechanism::Csp => csp::normalize(raw),
        Mechanism::PermissionsPolicy => permissions::normalize(raw),
        Mechanism::ReferrerPolicy => referrer::normalize(raw),
        Mechanism::Coop => coop::normalize(raw),
        Mechanism::Corp => corp::normalize(raw),
        Mechanism::Coep => coep::normalize(raw),
    }
}

/// Security level(s) a single observed header value maps to.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Classification {
    Hsts(HstsAge, HstsSub, HstsPreload),
    Xfo(Xfo),
    Csp(CspXss, CspFraming, CspTls),
    PermissionsPolicy(String),
    ReferrerPolicy(ReferrerPolicy),
    Coop(Coop),
    Corp(Corp),
    Coep(Coep),
}

/// Classifies one raw header value. The origin is only consulted by the
/// mechanisms whose grammar can name the serving origin (CSP
/// `frame-ancestors` and Permissions-Policy allowlists).
pub fn classify(mechanism: Mechanism, raw: &str, origin: Option<&Origin>) -> Classification {
    match mechanism {
        Mechanism::Hsts => {
            let (age, sub, preload) = hsts::classify(raw);
            Classification::Hsts(age, sub, preload)
        }
        Mechanism::Xfo => Classification::Xfo(xfo::classify(raw)),
        Mechanism::Csp => {
            let (xss, framing, tls) = csp::classify(raw, origin);
            Classification::Csp(xss, framing, tls)
        }
        Mechanism::PermissionsPolicy => {
            Classification::PermissionsPolicy(permissions::classify(raw, origin))
        }
        Mechanism::ReferrerPolicy => Classification::ReferrerPolicy(referrer::classify(raw)),
        Mechanism::Coop => Classification::Coop(coop::classify(raw)),
        Mechanism::Corp => Classification::Corp(corp::classify(raw)),
        Mechanism::Coep => Classification::Coep(coep::classify(raw)),
    }
}

/// Canonical forms of one observation's relevant headers, with the CSP value
/// additionally projected onto its three use-case directive subsets. Absent
/// headers map to [`MISSING`].
pub fn normalize_headers(headers: &Headers, _origin: Option<&Origin>) -> Headers {
    let mut out = Headers::new();
    for mechanism in Mechanism::ALL {
        let name = mechanism.header_name();
        let value = match headers.get(name) {
            Some(raw) => normalize(mechanism, raw),
            None => MISSING.to_string(),
        };
        out.insert(name, value);
    }

    let csp_raw = headers.get(Mechanism::Csp.header_name());
    for (key, directives) in [
        (CSP_XSS_KEY, &csp::XSS_DIRECTIVES[..]),
        (CSP_FRAMING_KEY, &csp::FRAMING_DIRECTIVES[..]),
        (CSP_TLS_KEY, &csp::TLS_DIRECTIVES[..]),
    ] {
        let value = match csp_raw {
            Some(raw) => csp::normalize_directives(raw, Some(directives)),
            None => MISSING.to_string(),
        };
        out.insert(key, value);
    }
    out
}

/// Classification of one observation's relevant headers. Serializes under
/// the header names themselves so downstream tooling can join against the
/// canonical forms.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HeaderClassifications {
    #[serde(rename = "Strict-Transport-Security")]
    pub hsts: (HstsAge, HstsSub, HstsPreload),
    #[serde(rename = "X-Frame-Options")]
    pub xfo: Xfo,
    #[serde(rename = "Content-Security-Policy::XSS")]
    pub csp_xss: CspXss,
    #[serde(rename = "Content-Security-Policy::FA")]
    pub csp_framing: CspFraming,
    #[serde(rename = "Content-Security-Policy::TLS")]
    pub csp_tls: CspTls,
    #[serde(rename = "Content-Security-Policy")]
    pub csp: (CspXss, CspFraming, CspTls),
    #[serde(rename = "Permissions-Policy")]
    pub permissions_policy: String,
    #[serde(rename = "Referrer-Policy")]
    pub referrer_policy: ReferrerPolicy,
    #[serde(rename = "Cross-Origin-Opener-Policy")]
    pub coop: Coop,
    #[serde(rename = "Cross-Origin-Resource-Policy")]
    pub corp: Corp,
    #[serde(rename = "Cross-Origin-Embedder-Policy")]
    pub coep: Coep,
}

/// Classifies every relevant header of one observation. Absent headers are
/// classified like empty values and land on each mechanism's weakest level.
pub fn classify_headers(headers: &Headers, origin: Option<&Origin>) -> HeaderClassifications {
    let (csp_xss, csp_framing, csp_tls) =
        csp::classify(headers.get_or(Mechanism::Csp.header_name(), ""), origin);
    HeaderClassifications {
        hsts: hsts::classify(headers.get_or(Mechanism::Hsts.header_name(), "")),
        xfo: xfo::classify(headers.get_or(Mechanism::Xfo.header_name(), "")),
        csp_xss,
        csp_framing,
        csp_tls,
        csp: (csp_xss, csp_framing, csp_tls),
        permissions_policy: permissions::classify(
            headers.get_or(Mechanism::PermissionsPolicy.header_name(), ""),
            origin,
        ),
        referrer_policy: referrer::classify(
            headers.get_or(Mechanism::ReferrerPolicy.header_name(), ""),
        ),
        coop: coop::classify(headers.get_or(Mechanism::Coop.header_name(), "")),
        corp: corp::classify(headers.get_or(Mechanism::Corp.header_name(), "")),
        coep: coep::classify(headers.get_or(Mechanism::Coep.header_name(), "")),
    }
}

/// Stringified per-mechanism classifications, shaped like
/// [`normalize_headers`] output so both can drive the same consistency fold.
pub fn classified_view(headers: &Headers, origin: Option<&Origin>) -> Headers {
    Mechanism::ALL
        .iter()
        .map(|mechanism| {
            let name = mechanism.header_name();
            let value = classify(*mechanism, headers.get_or(name, ""), origin);
            (name.to_string(), serde_json::to_string(&value).unwrap_or_default())
        })
        .collect()
}
