//! Common types for the offer pricing workspace.
//!
//! This crate holds the data model shared by the purchase provider, the
//! price resolver and the configuration layer, together with the validation
//! and registry primitives every provider implementation builds on.

/// Offer, package and billing-period types.
pub mod offer;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Configuration validation types for provider settings.
pub mod validation;

pub use offer::*;
pub use registry::ImplementationRegistry;
pub use validation::*;
