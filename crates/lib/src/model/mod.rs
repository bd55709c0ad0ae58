//! Entity model for the identity subsystem
//!
//! The aggregates here are the only way data reaches storage: every mutation
//! goes through a named operation that re-validates the entity's local
//! invariants, so an invalid or duplicated member is rejected before a write
//! is ever attempted.

mod errors;
mod id;
mod role;
mod user;
mod values;

pub use errors::ModelError;
pub use id::{RoleId, UserId};
pub use role::Role;
pub use user::User;
pub use values::{LockoutInfo, LoginInfo, PhoneInfo, TokenInfo};
