//! Store operations: the interface the identity subsystem calls.
//!
//! Every operation follows the same shape: load the current row, mutate the
//! entity through its invariant-checked operations, and persist the result.
//! What makes this layer interesting is everything the engine cannot do for
//! it:
//!
//! * **Global uniqueness** of normalized user names, emails, and login
//!   pairs is emulated with marker rows written through the engine's
//!   conditional insert. The marker is claimed BEFORE the main row is
//!   written; losing the conditional insert is the authoritative "duplicate"
//!   decision. A crash between marker and row can leak an orphaned marker —
//!   an accepted trade-off, since no multi-row transaction exists to close
//!   the window. Finders treat a marker pointing at a missing row as
//!   absent.
//! * **The role index** is written by the same operations that update the
//!   embedded role list, row first so the index can lag but never lead the
//!   collection. The dual write is not atomic across the two physical
//!   locations; that window is this layer's principal consistency risk.
//!
//! No operation is retried here: a storage failure propagates verbatim,
//! because retrying a non-idempotent add could double-fire or report a
//! false duplicate.

use crate::Result;
use crate::model::ModelError;

mod errors;
pub use errors::StoreError;

mod roles;
pub use roles::RoleStore;

mod users;
pub use users::UserStore;

/// Requires a marker value to be present and non-empty before any write.
pub(crate) fn required(value: Option<&str>, field: &'static str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| ModelError::MissingValue { field }.into())
}
