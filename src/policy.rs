//! Conflict policy for puts.

use crate::error::BiMapError;

/// How a put resolves a pair that clashes with existing bindings.
///
/// The *anchor* is the side named first in the call (the key for
/// [`HashBiMap::put`](crate::HashBiMap::put), the value for a put through
/// the inverse view). Re-putting a pair that is already bound is a no-op
/// under every policy.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum PutPolicy {
    /// Rebind the anchor and evict whichever pair holds the other side.
    /// Never fails.
    #[default]
    Evict,
    /// Rebind the anchor, but fail with
    /// [`BiMapError::ValueAlreadyPresent`] if the other side is bound
    /// elsewhere.
    Replace,
    /// Fail on any conflict. The anchor is checked first, so a pair that
    /// clashes on both sides reports [`BiMapError::KeyAlreadyPresent`].
    Unique,
}

impl PutPolicy {
    /// Decides whether a put may proceed given which sides are already bound.
    pub(crate) fn check(self, anchor_bound: bool, other_bound: bool) -> Result<(), BiMapError> {
        match self {
            PutPolicy::Evict => Ok(()),
            PutPolicy::Replace if other_bound => Err(BiMapError::ValueAlreadyPresent),
            PutPolicy::Replace => Ok(()),
            PutPolicy::Unique if anchor_bound => Err(BiMapError::KeyAlreadyPresent),
            PutPolicy::Unique if other_bound => Err(BiMapError::ValueAlreadyPresent),
            PutPolicy::Unique => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: eviction never refuses a put.
    #[test]
    fn evict_accepts_everything() {
        for (a, o) in [(false, false), (true, false), (false, true), (true, true)] {
            assert_eq!(PutPolicy::Evict.check(a, o), Ok(()));
        }
    }

    /// Invariant: replace only refuses when the other side is bound.
    #[test]
    fn replace_refuses_other_side() {
        assert_eq!(PutPolicy::Replace.check(true, false), Ok(()));
        assert_eq!(
            PutPolicy::Replace.check(true, true),
            Err(BiMapError::ValueAlreadyPresent)
        );
    }

    /// Invariant: unique reports the anchor conflict before the other side.
    #[test]
    fn unique_reports_anchor_first() {
        assert_eq!(
            PutPolicy::Unique.check(true, true),
            Err(BiMapError::KeyAlreadyPresent)
        );
        assert_eq!(
            PutPolicy::Unique.check(false, true),
            Err(BiMapError::ValueAlreadyPresent)
        );
        assert_eq!(PutPolicy::Unique.check(false, false), Ok(()));
    }
}
