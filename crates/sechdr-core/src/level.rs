//! Ordered security levels, one total order per mechanism facet.
//!
//! The discriminants encode protection strength (weakest first) and feed the
//! generic [`max_by_rank`] fold. The orders are load-bearing for every
//! downstream aggregate and must not be rearranged.

use serde::{Deserialize, Serialize};

/// A finite, totally ordered classification.
pub trait Rank: Copy {
    fn rank(&self) -> i8;
}

/// Returns whichever of two same-type levels ranks higher. Ties return the
/// first argument, which is sound because equal ranks are equal levels.
pub fn max_by_rank<L: Rank>(first: L, second: L) -> L {
    if first.rank() >= second.rank() {
        first
    } else {
        second
    }
}

macro_rules! impl_rank {
    ($($ty:ty),+ $(,)?) => {
        $(impl Rank for $ty {
            fn rank(&self) -> i8 {
                *self as i8
            }
        })+
    };
}

/// Strength of the HSTS `max-age` directive.
///
/// `Disabled` ranks below `Absent`: an explicit `max-age=0` actively evicts
/// the host from the browser's HSTS cache.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i8)]
pub enum HstsAge {
    Disabled = -1,
    Absent = 0,
    Low = 1,
    Big = 2,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i8)]
pub enum HstsSub {
    Absent = 0,
    Active = 1,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i8)]
pub enum HstsPreload {
    Absent = 0,
    Active = 1,
}

/// X-Frame-Options. `ALLOW-FROM` is ignored by modern browsers and lands in
/// `Unsafe` together with everything else unrecognized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i8)]
pub enum Xfo {
    Unsafe = 0,
    Sameorigin = 1,
    Deny = 2,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i8)]
pub enum CspXss {
    Unsafe = 0,
    Safe = 1,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i8)]
pub enum CspFraming {
    Unsafe = 0,
    Constrained = 1,
    #[serde(rename = "SELF")]
    SelfOnly = 2,
    None = 3,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i8)]
pub enum CspTls {
    Unsafe = 0,
    BlockAllMixedContent = 1,
    UpgradeInsecureRequests = 2,
}

/// Referrer-Policy values ordered by how little referrer they leak across
/// origins; `StrictOriginWhenCrossOrigin` is also the browser default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i8)]
pub enum ReferrerPolicy {
    UnsafeUrl = 0,
    SameOrigin = 1,
    NoReferrer = 2,
    NoReferrerWhenDowngrade = 3,
    Origin = 4,
    OriginWhenCrossOrigin = 5,
    StrictOrigin = 6,
    StrictOriginWhenCrossOrigin = 7,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i8)]
pub enum Coop {
    UnsafeNone = 0,
    SameOrigin = 1,
    SameOriginAllowPopups = 2,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i8)]
pub enum Corp {
    CrossOrigin = 0,
    SameSite = 1,
    SameOrigin = 2,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i8)]
pub enum Coep {
    UnsafeNone = 0,
    RequireCorp = 1,
    Credentialless = 2,
}

impl_rank!(
    HstsAge,
    HstsSub,
    HstsPreload,
    Xfo,
    CspXss,
    CspFraming,
    CspTls,
    ReferrerPolicy,
    Coop,
    Corp,
    Coep,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_by_rank_keeps_the_stronger_level() {
        assert_eq!(max_by_rank(HstsAge::Low, HstsAge::Big), HstsAge::Big);
        assert_eq!(max_by_rank(HstsAge::Big, HstsAge::Low), HstsAge::Big);
        assert_eq!(max_by_rank(Xfo::Unsafe, Xfo::Deny), Xfo::Deny);
    }

    #[test]
    fn max_by_rank_is_commutative_and_associative() {
        let levels = [
            CspFraming::Unsafe,
            CspFraming::Constrained,
            CspFraming::SelfOnly,
            CspFraming::None,
        ];
        for a in levels {
            for b in levels {
                assert_eq!(max_by_rank(a, b), max_by_rank(b, a));
                for c in levels {
                    assert_eq!(
                        max_by_rank(max_by_rank(a, b), c),
                        max_by_rank(a, max_by_rank(b, c))
                    );
                }
            }
        }
    }

    #[test]
    fn disabled_age_ranks_below_absent() {
        assert!(HstsAge::Disabled.rank() < HstsAge::Absent.rank());
        assert_eq!(max_by_rank(HstsAge::Disabled, HstsAge::Absent), HstsAge::Absent);
    }

    #[test]
    fn levels_serialize_as_tag_strings() {
        assert_eq!(
            serde_json::to_string(&ReferrerPolicy::StrictOriginWhenCrossOrigin).unwrap(),
            "\"STRICT_ORIGIN_WHEN_CROSS_ORIGIN\""
        );
        assert_eq!(serde_json::to_string(&CspFraming::SelfOnly).unwrap(), "\"SELF\"");
        assert_eq!(serde_json::to_string(&CspTls::BlockAllMixedContent).unwrap(), "\"BLOCK_ALL_MIXED_CONTENT\"");
    }
}
