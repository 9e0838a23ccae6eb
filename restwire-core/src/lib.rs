//! Core wire types for restwire.
//!
//! This crate provides the pieces shared by the server (`restwire`) and the
//! client (`restwire-client`) crates.
//!
//! ## Modules
//!
//! - [`negotiation`]: media types, [`Representation`] and the JSON-vs-protobuf policy
//! - [`codec`]: the [`WireMessage`] capability and the JSON/protobuf codecs
//! - [`error`]: decode and encode errors

mod codec;
mod error;
mod negotiation;

pub use codec::*;
pub use error::*;
pub use negotiation::*;
