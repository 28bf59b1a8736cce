//! Chat session identity
//!
//! A session carries the context id the remote service uses to keep the
//! conversation together. Nothing here is persisted.

mod session;

pub use session::*;
