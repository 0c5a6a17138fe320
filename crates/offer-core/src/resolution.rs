//! The price resolution algorithm.

use offer_types::{Offer, Package, PeriodTag, DEFAULT_FALLBACK, DEFAULT_PERIOD_SUFFIX};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

/// How one screen wants its price resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRule {
	/// Billing period to prefer among the offer's packages.
	pub preferred_period: PeriodTag,
	/// Appended verbatim to the selected package's display price.
	pub period_suffix: String,
	/// Returned verbatim whenever resolution cannot produce a live price.
	pub fallback: String,
}

impl PriceRule {
	pub fn new(
		preferred_period: PeriodTag,
		period_suffix: impl Into<String>,
		fallback: impl Into<String>,
	) -> Self {
		Self {
			preferred_period,
			period_suffix: period_suffix.into(),
			fallback: fallback.into(),
		}
	}
}

impl Default for PriceRule {
	fn default() -> Self {
		Self::new(PeriodTag::Monthly, DEFAULT_PERIOD_SUFFIX, DEFAULT_FALLBACK)
	}
}

/// Why a resolution ended on the fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum ResolutionFailure {
	/// The purchase subsystem reported it cannot be used.
	ProviderUnavailable,
	/// The offer fetch failed or timed out.
	FetchFailure(String),
	/// The provider had no current offer, or the offer had no packages.
	EmptyOffer,
}

impl fmt::Display for ResolutionFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ResolutionFailure::ProviderUnavailable => f.write_str("provider unavailable"),
			ResolutionFailure::FetchFailure(e) => write!(f, "fetch failed: {}", e),
			ResolutionFailure::EmptyOffer => f.write_str("empty offer"),
		}
	}
}

/// Where a resolved price came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
	/// Built from a provider package.
	Provider {
		package_id: String,
		period: PeriodTag,
	},
	/// The rule's fallback string.
	Fallback(ResolutionFailure),
}

/// Result of a resolution: the string to display and its origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceResolution {
	pub price: String,
	pub source: PriceSource,
}

impl PriceResolution {
	fn fallback(rule: &PriceRule, failure: ResolutionFailure) -> Self {
		Self {
			price: rule.fallback.clone(),
			source: PriceSource::Fallback(failure),
		}
	}

	pub fn is_fallback(&self) -> bool {
		matches!(self.source, PriceSource::Fallback(_))
	}
}

/// Picks the package to advertise.
///
/// The first package with the preferred period wins; otherwise the first
/// package of the offer. `None` only for an empty offer.
pub fn select_package(offer: &Offer, preferred_period: PeriodTag) -> Option<&Package> {
	offer
		.package_for(preferred_period)
		.or_else(|| offer.packages.first())
}

/// Resolves the display price and reports where it came from.
///
/// `fetch_offer` is only called when `can_purchase` returns true. Errors from
/// the fetch are logged and absorbed; the returned resolution always carries
/// a price.
pub async fn resolve_detailed<C, F, Fut, E>(
	can_purchase: C,
	fetch_offer: F,
	rule: &PriceRule,
) -> PriceResolution
where
	C: FnOnce() -> bool,
	F: FnOnce() -> Fut,
	Fut: Future<Output = Result<Option<Offer>, E>>,
	E: fmt::Display,
{
	if !can_purchase() {
		tracing::debug!("Purchases unavailable, using fallback price");
		return PriceResolution::fallback(rule, ResolutionFailure::ProviderUnavailable);
	}

	let offer = match fetch_offer().await {
		Ok(offer) => offer,
		Err(e) => {
			tracing::warn!(error = %e, "Failed to load offer, using fallback price");
			return PriceResolution::fallback(rule, ResolutionFailure::FetchFailure(e.to_string()));
		},
	};

	let Some(offer) = offer else {
		tracing::debug!("No current offer, using fallback price");
		return PriceResolution::fallback(rule, ResolutionFailure::EmptyOffer);
	};

	match select_package(&offer, rule.preferred_period) {
		Some(package) => {
			tracing::debug!(
				offer = %offer.identifier,
				package = %package.identifier,
				period = %package.billing_period,
				"Resolved offer price"
			);
			PriceResolution {
				price: format!("{}{}", package.display_price, rule.period_suffix),
				source: PriceSource::Provider {
					package_id: package.identifier.clone(),
					period: package.billing_period,
				},
			}
		},
		None => {
			tracing::debug!(offer = %offer.identifier, "Offer has no packages, using fallback price");
			PriceResolution::fallback(rule, ResolutionFailure::EmptyOffer)
		},
	}
}

/// Resolves the display price for `rule`.
///
/// Total: always returns a string, either the selected package's price plus
/// the rule's suffix or exactly the rule's fallback.
pub async fn resolve_price<C, F, Fut, E>(can_purchase: C, fetch_offer: F, rule: &PriceRule) -> String
where
	C: FnOnce() -> bool,
	F: FnOnce() -> Fut,
	Fut: Future<Output = Result<Option<Offer>, E>>,
	E: fmt::Display,
{
	resolve_detailed(can_purchase, fetch_offer, rule).await.price
}
