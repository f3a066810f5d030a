//! Shared foundational types used across the bake macro toolchain.
//!
//! This crate provides content hashing for artifact identities, call-site
//! locations, and the internal result type.

#![warn(missing_docs)]

pub mod hash;
pub mod location;
pub mod result;

pub use hash::ContentHash;
pub use location::{CallSite, Location};
pub use result::{BakeResult, InternalError};
