//! Static purchase provider backed by the configuration file.
//!
//! The offer, its packages and the customer's entitlements are declared in
//! `[provider.implementations.static]`. Switches for availability, fetch
//! failures and latency let a deployment reproduce every fallback path of the
//! resolver without a real store connection.

use crate::{
	PurchaseProviderError, PurchaseProviderFactory, PurchaseProviderInterface,
	PurchaseProviderRegistry,
};
use async_trait::async_trait;
use offer_types::{
	ConfigSchema, CustomerInfo, Field, FieldType, ImplementationRegistry, Offer, Package,
	PeriodTag, Schema, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for the simulated latency, in milliseconds.
const MAX_LATENCY_MS: i64 = 60_000;

/// Configuration for the static provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticProviderConfig {
	/// Whether purchases can be made. When false the provider behaves like an
	/// SDK that was never configured.
	#[serde(default = "default_available")]
	pub available: bool,
	/// When set, every fetch fails with this message as a network error.
	#[serde(default)]
	pub fail_fetch: Option<String>,
	/// Delay applied before every fetch answers.
	#[serde(default)]
	pub latency_ms: u64,
	/// Whether a current offering exists for the user.
	#[serde(default = "default_current_offering")]
	pub current_offering: bool,
	/// Identifier reported for the offering.
	#[serde(default = "default_offering_id")]
	pub offering_id: String,
	/// Packages of the offering, in display order.
	#[serde(default)]
	pub packages: Vec<Package>,
	/// User id reported in customer info.
	#[serde(default = "default_app_user_id")]
	pub app_user_id: String,
	/// Active entitlements of the customer.
	#[serde(default)]
	pub entitlements: Vec<String>,
}

fn default_available() -> bool {
	true
}

fn default_current_offering() -> bool {
	true
}

fn default_offering_id() -> String {
	"default".to_string()
}

fn default_app_user_id() -> String {
	"anonymous".to_string()
}

impl Default for StaticProviderConfig {
	fn default() -> Self {
		Self {
			available: default_available(),
			fail_fetch: None,
			latency_ms: 0,
			current_offering: default_current_offering(),
			offering_id: default_offering_id(),
			packages: Vec::new(),
			app_user_id: default_app_user_id(),
			entitlements: Vec::new(),
		}
	}
}

/// Configuration schema for the static provider.
pub struct StaticProviderSchema;

impl StaticProviderSchema {
	fn package_schema() -> Schema {
		Schema::new(
			vec![
				Field::new("identifier", FieldType::String),
				Field::new("billing_period", FieldType::String).with_validator(|value| {
					value
						.as_str()
						.unwrap_or_default()
						.parse::<PeriodTag>()
						.map(|_| ())
				}),
				Field::new("display_price", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(price) if !price.trim().is_empty() => Ok(()),
						_ => Err("display_price cannot be empty".to_string()),
					}
				}),
			],
			vec![Field::new("product_id", FieldType::String)],
		)
	}
}

impl ConfigSchema for StaticProviderSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("available", FieldType::Boolean),
				Field::new("fail_fetch", FieldType::String),
				Field::new(
					"latency_ms",
					FieldType::Integer {
						min: Some(0),
						max: Some(MAX_LATENCY_MS),
					},
				),
				Field::new("current_offering", FieldType::Boolean),
				Field::new("offering_id", FieldType::String),
				Field::new(
					"packages",
					FieldType::Array(Box::new(FieldType::Table(Self::package_schema()))),
				),
				Field::new("app_user_id", FieldType::String),
				Field::new("entitlements", FieldType::Array(Box::new(FieldType::String))),
			],
		);
		schema.validate(config)
	}
}

/// Purchase provider answering from its configuration.
pub struct StaticProvider {
	config: StaticProviderConfig,
}

impl StaticProvider {
	/// Creates a new static provider with the given configuration.
	pub fn new(config: StaticProviderConfig) -> Self {
		Self { config }
	}

	/// Applies the configured latency and failure before a fetch answers.
	async fn simulate_round_trip(&self) -> Result<(), PurchaseProviderError> {
		if self.config.latency_ms > 0 {
			tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
		}
		match &self.config.fail_fetch {
			Some(message) => Err(PurchaseProviderError::Network(message.clone())),
			None => Ok(()),
		}
	}
}

#[async_trait]
impl PurchaseProviderInterface for StaticProvider {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(StaticProviderSchema)
	}

	fn can_make_purchases(&self) -> bool {
		self.config.available
	}

	async fn get_offerings(&self) -> Result<Option<Offer>, PurchaseProviderError> {
		if !self.config.available {
			return Err(PurchaseProviderError::NotConfigured);
		}
		self.simulate_round_trip().await?;

		if !self.config.current_offering {
			return Ok(None);
		}

		Ok(Some(Offer::new(
			self.config.offering_id.clone(),
			self.config.packages.clone(),
		)))
	}

	async fn get_customer_info(&self) -> Result<Option<CustomerInfo>, PurchaseProviderError> {
		if !self.config.available {
			return Ok(None);
		}
		self.simulate_round_trip().await?;

		Ok(Some(CustomerInfo {
			app_user_id: self.config.app_user_id.clone(),
			active_entitlements: self.config.entitlements.clone(),
		}))
	}
}

/// Factory function to create a static provider from configuration.
///
/// Configuration parameters (all optional):
/// - `available`, `fail_fetch`, `latency_ms`
/// - `current_offering`, `offering_id`, `packages`
/// - `app_user_id`, `entitlements`
pub fn create_provider(
	config: &toml::Value,
) -> Result<Box<dyn PurchaseProviderInterface>, PurchaseProviderError> {
	StaticProviderSchema
		.validate(config)
		.map_err(|e| PurchaseProviderError::Configuration(e.to_string()))?;

	let provider_config: StaticProviderConfig = config.clone().try_into().map_err(|e| {
		PurchaseProviderError::Configuration(format!("Invalid static provider config: {}", e))
	})?;

	Ok(Box::new(StaticProvider::new(provider_config)))
}

/// Registry for the static provider implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "static";
	type Factory = PurchaseProviderFactory;

	fn factory() -> Self::Factory {
		create_provider
	}
}

impl PurchaseProviderRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	fn two_packages() -> Vec<Package> {
		vec![
			Package::new("$rc_annual", PeriodTag::Annual, "$39.99"),
			Package::new("$rc_monthly", PeriodTag::Monthly, "$4.99"),
		]
	}

	#[tokio::test]
	async fn test_returns_configured_offer() {
		let provider = StaticProvider::new(StaticProviderConfig {
			packages: two_packages(),
			..Default::default()
		});

		assert!(provider.can_make_purchases());
		let offer = provider.get_offerings().await.unwrap().unwrap();
		assert_eq!(offer.identifier, "default");
		assert_eq!(offer.packages, two_packages());
	}

	#[tokio::test]
	async fn test_unavailable_provider() {
		let provider = StaticProvider::new(StaticProviderConfig {
			available: false,
			packages: two_packages(),
			..Default::default()
		});

		assert!(!provider.can_make_purchases());
		assert!(matches!(
			provider.get_offerings().await,
			Err(PurchaseProviderError::NotConfigured)
		));
		assert!(provider.get_customer_info().await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_fail_fetch_and_missing_offering() {
		let failing = StaticProvider::new(StaticProviderConfig {
			fail_fetch: Some("offline".to_string()),
			..Default::default()
		});
		match failing.get_offerings().await {
			Err(PurchaseProviderError::Network(msg)) => assert_eq!(msg, "offline"),
			other => panic!("expected network error, got {:?}", other),
		}

		let no_offering = StaticProvider::new(StaticProviderConfig {
			current_offering: false,
			..Default::default()
		});
		assert!(no_offering.get_offerings().await.unwrap().is_none());
	}

	#[tokio::test(start_paused = true)]
	async fn test_latency_is_applied() {
		let provider = StaticProvider::new(StaticProviderConfig {
			latency_ms: 1_500,
			..Default::default()
		});

		let start = tokio::time::Instant::now();
		provider.get_offerings().await.unwrap();
		assert!(start.elapsed() >= Duration::from_millis(1_500));
	}

	#[test]
	fn test_factory_parses_packages() {
		let config: toml::Value = toml::from_str(
			r#"
offering_id = "onboarding"
packages = [
  { identifier = "$rc_annual", billing_period = "annual", display_price = "$39.99" },
  { identifier = "$rc_monthly", billing_period = "monthly", display_price = "$4.99", product_id = "rc_monthly_499" },
]
"#,
		)
		.unwrap();

		assert!(Registry::factory()(&config).is_ok());

		let parsed: StaticProviderConfig = config.try_into().unwrap();
		assert_eq!(parsed.offering_id, "onboarding");
		assert_eq!(parsed.packages[1].billing_period, PeriodTag::Monthly);
		assert_eq!(parsed.packages[1].product_id.as_deref(), Some("rc_monthly_499"));
	}

	#[test]
	fn test_factory_rejects_invalid_packages() {
		let config: toml::Value = toml::from_str(
			r#"
packages = [{ identifier = "$rc_monthly", billing_period = "fortnightly", display_price = "$4.99" }]
"#,
		)
		.unwrap();
		let err = create_provider(&config).err().unwrap();
		assert!(err.to_string().contains("fortnightly"));

		let config: toml::Value = toml::from_str(
			r#"
packages = [{ identifier = "$rc_monthly", billing_period = "monthly", display_price = "" }]
"#,
		)
		.unwrap();
		let err = create_provider(&config).err().unwrap();
		assert!(err.to_string().contains("packages[0].display_price"));
	}

	#[test]
	fn test_schema_bounds_latency() {
		let schema = StaticProvider::new(StaticProviderConfig::default()).config_schema();

		let ok: toml::Value = toml::from_str("latency_ms = 250").unwrap();
		assert!(schema.validate(&ok).is_ok());

		let too_slow: toml::Value = toml::from_str("latency_ms = 120000").unwrap();
		assert!(schema.validate(&too_slow).is_err());

		let wrong_type: toml::Value = toml::from_str("available = \"yes\"").unwrap();
		assert!(matches!(
			schema.validate(&wrong_type),
			Err(ValidationError::TypeMismatch { .. })
		));
	}
}
