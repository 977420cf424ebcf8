//! Error type shared by every fallible map and cursor operation.

use thiserror::Error;

/// Result alias for bijective map operations.
pub type Result<T> = core::result::Result<T, BiMapError>;

/// Failures reported by [`HashBiMap`](crate::HashBiMap), its inverse view
/// and its cursors.
///
/// Absence is never an error: lookups and removals of missing keys return
/// `None`. Conflict errors are reported from the point of view of the
/// object the call was made on, so on an [`Inverse`](crate::Inverse) the
/// "key" is the forward map's value.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiMapError {
    /// The key is already bound to a different value.
    #[error("key already present")]
    KeyAlreadyPresent,

    /// The value is already bound to a different key.
    #[error("value already present")]
    ValueAlreadyPresent,

    /// The map changed structurally since the cursor last looked at it.
    #[error("map was structurally modified outside of this cursor")]
    ConcurrentModification,

    /// `remove`/`set_value` called before the first `next`, or after the
    /// current pair was removed. `set_value` may be repeated on the same
    /// pair; `remove` works once per yielded pair.
    #[error("cursor has no current pair")]
    IllegalCursorState,

    /// A cursor was handed a map other than the one it was created from.
    /// Clones count as different maps.
    #[error("cursor used with a map it was not created from")]
    WrongMap,
}
