//! Offer price resolution for onboarding and paywall screens.
//!
//! Screens that advertise a trial need a price string such as `"$4.99/mes"`
//! before the user can continue. This crate turns whatever the purchase
//! provider reports into that string and degrades to a configured fallback on
//! every failure: the provider being unavailable, the fetch failing or timing
//! out, or the offer having no packages. Resolution never surfaces an error.
//!
//! - [`resolve_price`] / [`resolve_detailed`]: the resolution algorithm over
//!   plain callbacks.
//! - [`OfferPriceResolver`]: the same algorithm wired to a
//!   [`PurchaseProviderService`](offer_provider::PurchaseProviderService).
//! - [`ResolutionTask`]: a background resolution that is abandoned when the
//!   owning screen drops it.
//! - [`has_active_subscription`]: entitlement check with the same
//!   absorb-all-failures policy.

pub mod entitlement;
pub mod resolution;
pub mod resolver;
pub mod task;

pub use entitlement::has_active_subscription;
pub use resolution::{
	resolve_detailed, resolve_price, select_package, PriceResolution, PriceRule, PriceSource,
	ResolutionFailure,
};
pub use offer_types::{DEFAULT_FALLBACK, DEFAULT_PERIOD_SUFFIX};
pub use resolver::{FetchError, OfferPriceResolver};
pub use task::{ResolutionState, ResolutionTask};
