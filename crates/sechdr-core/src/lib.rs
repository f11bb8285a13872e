//! Core value types for the security header measurement engine.
//!
//! Everything in this crate is a pure, deterministic function over immutable
//! inputs. Nothing here performs I/O, and classification never fails:
//! malformed input degrades to the weakest level of the mechanism at hand.

pub mod headers;
pub mod level;
pub mod origin;
pub mod stability;

pub use headers::Headers;
pub use level::{max_by_rank, Rank};
pub use origin::Origin;
