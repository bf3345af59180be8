//! Version tokens for optimistic concurrency control.
//!
//! A [`Version`] is an opaque monotonic token. Tokens are derived from
//! a high-resolution clock rather than a read-increment counter, so a
//! write never needs a preceding read just to allocate its version.
//!
//! # Tie-breaking
//!
//! Two writes inside the same clock tick would otherwise draw equal
//! tokens. [`VersionClock`] keeps a process-wide last-issued register
//! and issues `max(now_micros, last + 1)`, so tokens are strictly
//! increasing even when the clock stalls or ticks coarsely. An update
//! additionally floors the fresh token at `observed + 1`, keeping the
//! per-record invariant (every successful write strictly increases the
//! stored version) intact across clock skew against the caller's
//! observed version.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Opaque monotonic version token.
///
/// Callers never construct meaningful versions themselves; they only
/// echo back the version they last observed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// Raw token value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Version {
    fn from(raw: u64) -> Self {
        Version(raw)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Last token issued by this process.
static LAST_ISSUED: AtomicU64 = AtomicU64::new(0);

/// Process-wide allocator of strictly increasing version tokens.
pub struct VersionClock;

impl VersionClock {
    /// Allocate the next version token.
    pub fn next() -> Version {
        Self::next_after(Version(0))
    }

    /// Allocate a version token strictly greater than `observed`.
    ///
    /// Used on update so the new version always exceeds the version the
    /// caller read, even if that token was issued by a process with a
    /// faster clock.
    pub fn next_after(observed: Version) -> Version {
        let now = Self::now_micros();
        loop {
            let last = LAST_ISSUED.load(Ordering::SeqCst);
            let candidate = now.max(last + 1).max(observed.0 + 1);
            if LAST_ISSUED
                .compare_exchange(last, candidate, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return Version(candidate);
            }
        }
    }

    fn now_micros() -> u64 {
        // A pre-epoch clock degrades to 0; monotonicity still holds
        // through the last-issued register.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or_default()
    }
}
