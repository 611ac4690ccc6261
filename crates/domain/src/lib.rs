//! Core domain types for the Mariner media-server client.
//!
//! This crate is pure: no I/O, no async, no runtime dependencies. It defines
//! the canonical server identity, the in-process session, and the closed
//! error taxonomy that every other crate switches on.

pub mod errors;
pub mod identity;
pub mod session;

pub use errors::{AuthError, ExecError, ExecErrorCategory};
pub use identity::ServerIdentity;
pub use session::Session;
