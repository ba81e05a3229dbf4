//! The incremental verification cache.
//!
//! Per-method verification outcomes are memoized keyed by the syntactic
//! content of the method plus everything it transitively depends on:
//!
//! - content fingerprints over AST shape ([`fingerprint`], position
//!   independent)
//! - dependency hashes folding in every transitively referenced non-method
//!   member ([`ProgramAnalysis`])
//! - access paths recording where inside a method a cached error points, so
//!   replayed errors can be re-positioned in a fresh AST ([`locate`])
//! - the process-lifetime concurrent store ([`VerificationCache`])
//!
//! Nothing here persists across process restarts and entries are never
//! shared across files.

mod analysis;
mod fingerprint;
mod locate;
mod store;

pub use analysis::{MemberId, MemberKind, ProgramAnalysis};
pub use fingerprint::{fingerprint, Fingerprint};
pub use locate::{access_path_to, locate, replay_error, AccessPath, PathCapture, PathStep};
pub use store::{CacheEntry, CacheKey, LocalizedError, VerificationCache};
