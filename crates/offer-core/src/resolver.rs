//! Price resolution wired to the purchase provider.

use crate::resolution::{resolve_detailed, PriceResolution, PriceRule};
use offer_provider::{PurchaseProviderError, PurchaseProviderService};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

/// Why an offer fetch did not produce an answer.
#[derive(Debug, Error)]
pub enum FetchError {
	/// The provider returned an error.
	#[error(transparent)]
	Provider(#[from] PurchaseProviderError),
	/// The provider did not answer within the configured timeout.
	#[error("Offer fetch timed out after {0:?}")]
	TimedOut(Duration),
}

/// Resolves display prices from the configured purchase provider.
///
/// Cloning is cheap; clones share the provider.
#[derive(Clone)]
pub struct OfferPriceResolver {
	provider: Arc<PurchaseProviderService>,
	fetch_timeout: Option<Duration>,
}

impl OfferPriceResolver {
	pub fn new(provider: Arc<PurchaseProviderService>) -> Self {
		Self {
			provider,
			fetch_timeout: None,
		}
	}

	/// Bounds every offer fetch. A fetch that runs longer resolves to the
	/// fallback.
	pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
		self.fetch_timeout = Some(timeout);
		self
	}

	pub fn provider(&self) -> &Arc<PurchaseProviderService> {
		&self.provider
	}

	/// Resolves `rule` against the provider and reports the price's origin.
	#[instrument(skip_all, fields(period = %rule.preferred_period))]
	pub async fn resolve_detailed(&self, rule: &PriceRule) -> PriceResolution {
		resolve_detailed(
			move || self.provider.can_make_purchases(),
			move || self.fetch_offer(),
			rule,
		)
		.await
	}

	/// Resolves `rule` against the provider.
	pub async fn resolve(&self, rule: &PriceRule) -> String {
		self.resolve_detailed(rule).await.price
	}

	async fn fetch_offer(&self) -> Result<Option<offer_types::Offer>, FetchError> {
		match self.fetch_timeout {
			Some(limit) => tokio::time::timeout(limit, self.provider.get_offerings())
				.await
				.map_err(|_| FetchError::TimedOut(limit))?
				.map_err(FetchError::from),
			None => Ok(self.provider.get_offerings().await?),
		}
	}
}
