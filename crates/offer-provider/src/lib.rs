//! Purchase provider module for the offer pricing workspace.
//!
//! This module defines the client contract the price resolver consumes: a
//! capability check, an asynchronous offerings fetch that may fail, and a
//! customer info lookup. Concrete providers register themselves through
//! [`ImplementationRegistry`] and are built from their TOML table.

use async_trait::async_trait;
use offer_types::{ConfigSchema, CustomerInfo, ImplementationRegistry, Offer};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod fixed;
}

/// Errors that can occur while talking to a purchase provider.
#[derive(Debug, Error)]
pub enum PurchaseProviderError {
	/// The provider SDK was never configured for this session.
	#[error("Provider not configured")]
	NotConfigured,
	/// Network communication with the provider failed.
	#[error("Network error: {0}")]
	Network(String),
	/// The provider answered with an error of its own.
	#[error("Provider error: {0}")]
	Provider(String),
	/// The implementation table in the configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the purchase provider client.
///
/// Implementations must be cheap to call repeatedly: the resolver asks for
/// offerings once per screen mount and never caches the answer.
#[async_trait]
pub trait PurchaseProviderInterface: Send + Sync {
	/// Returns the configuration schema for this implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Whether purchases can be made on this device and session.
	fn can_make_purchases(&self) -> bool;

	/// Fetches the current offer.
	///
	/// `Ok(None)` means the provider has no current offering for this user.
	async fn get_offerings(&self) -> Result<Option<Offer>, PurchaseProviderError>;

	/// Fetches the subscription state of the current customer.
	///
	/// `Ok(None)` means the provider cannot identify a customer yet.
	async fn get_customer_info(&self) -> Result<Option<CustomerInfo>, PurchaseProviderError>;
}

/// Type alias for provider factory functions.
pub type PurchaseProviderFactory =
	fn(&toml::Value) -> Result<Box<dyn PurchaseProviderInterface>, PurchaseProviderError>;

/// Registry trait for purchase provider implementations.
pub trait PurchaseProviderRegistry:
	ImplementationRegistry<Factory = PurchaseProviderFactory>
{
}

/// Get all registered purchase provider implementations.
///
/// Returns `(name, factory)` pairs. The name is what `provider.primary` and
/// the keys of `provider.implementations` refer to.
pub fn get_all_implementations() -> Vec<(&'static str, PurchaseProviderFactory)> {
	use implementations::fixed;

	vec![(fixed::Registry::NAME, fixed::Registry::factory())]
}

/// Service wrapping the configured purchase provider.
///
/// The resolver and the entitlement check only ever see this type, never a
/// concrete implementation.
pub struct PurchaseProviderService {
	/// The underlying provider implementation.
	backend: Box<dyn PurchaseProviderInterface>,
}

impl PurchaseProviderService {
	/// Creates a new service over the given backend.
	pub fn new(backend: Box<dyn PurchaseProviderInterface>) -> Self {
		Self { backend }
	}

	/// Builds the service from an implementation name and its config table.
	///
	/// The table is validated against the implementation's schema by its
	/// factory before anything is constructed.
	pub fn from_config(name: &str, config: &toml::Value) -> Result<Self, PurchaseProviderError> {
		let factory = get_all_implementations()
			.into_iter()
			.find_map(|(registered, factory)| (registered == name).then_some(factory))
			.ok_or_else(|| {
				PurchaseProviderError::Configuration(format!(
					"Unknown purchase provider implementation '{}'",
					name
				))
			})?;

		tracing::debug!(implementation = %name, "Building purchase provider");
		Ok(Self::new(factory(config)?))
	}

	pub fn can_make_purchases(&self) -> bool {
		self.backend.can_make_purchases()
	}

	pub async fn get_offerings(&self) -> Result<Option<Offer>, PurchaseProviderError> {
		self.backend.get_offerings().await
	}

	pub async fn get_customer_info(&self) -> Result<Option<CustomerInfo>, PurchaseProviderError> {
		self.backend.get_customer_info().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_registered_implementations() {
		let names: Vec<&str> = get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert_eq!(names, vec!["static"]);
	}

	#[test]
	fn test_unknown_implementation_rejected() {
		let config = toml::Value::Table(toml::map::Map::new());
		let result = PurchaseProviderService::from_config("revenuecat", &config);
		assert!(matches!(
			result,
			Err(PurchaseProviderError::Configuration(ref msg)) if msg.contains("revenuecat")
		));
	}

	#[tokio::test]
	async fn test_service_delegates_to_backend() {
		let config: toml::Value = toml::from_str(
			r#"
packages = [{ identifier = "$rc_monthly", billing_period = "monthly", display_price = "$4.99" }]
entitlements = ["premium"]
"#,
		)
		.unwrap();

		let service = PurchaseProviderService::from_config("static", &config).unwrap();
		assert!(service.can_make_purchases());

		let offer = service.get_offerings().await.unwrap().unwrap();
		assert_eq!(offer.packages.len(), 1);

		let info = service.get_customer_info().await.unwrap().unwrap();
		assert!(info.is_premium());
	}
}
