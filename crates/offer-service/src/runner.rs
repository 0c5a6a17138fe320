//! Wiring between configuration, provider and resolver.

use offer_config::{Config, ConfigError, ProfileConfig};
use offer_core::{has_active_subscription, OfferPriceResolver, PriceRule, ResolutionTask};
use offer_provider::{PurchaseProviderError, PurchaseProviderService};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that stop the service before any price is resolved.
#[derive(Debug, Error)]
pub enum ServiceError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error("Failed to build purchase provider: {0}")]
	Provider(#[from] PurchaseProviderError),
	#[error("Unknown profile '{0}'")]
	UnknownProfile(String),
}

/// Converts a configured profile into the resolver's rule.
pub fn price_rule(profile: &ProfileConfig) -> PriceRule {
	PriceRule::new(
		profile.preferred_period,
		profile.period_suffix.clone(),
		profile.fallback.clone(),
	)
}

/// Builds the resolver for the configured primary provider.
pub fn build_resolver(config: &Config) -> Result<OfferPriceResolver, ServiceError> {
	let primary = &config.provider.primary;
	let table = config.provider.primary_config().ok_or_else(|| {
		ConfigError::Validation(format!(
			"Primary provider '{}' not found in implementations",
			primary
		))
	})?;

	let service = PurchaseProviderService::from_config(primary, table)?;
	let resolver = OfferPriceResolver::new(Arc::new(service));

	Ok(match config.resolver.fetch_timeout() {
		Some(timeout) => resolver.with_fetch_timeout(timeout),
		None => resolver,
	})
}

/// Resolves the requested profiles concurrently.
///
/// An empty `requested` list means every configured profile. Names that are
/// not configured are rejected before anything is fetched.
pub async fn resolve_profiles(
	resolver: &OfferPriceResolver,
	config: &Config,
	requested: &[String],
) -> Result<BTreeMap<String, String>, ServiceError> {
	let names: Vec<String> = if requested.is_empty() {
		config.profile_names().into_iter().map(str::to_string).collect()
	} else {
		requested.to_vec()
	};

	let mut tasks = Vec::with_capacity(names.len());
	for name in names {
		let profile = config
			.profiles
			.get(&name)
			.ok_or_else(|| ServiceError::UnknownProfile(name.clone()))?;
		tasks.push((name, price_rule(profile)));
	}

	let mut tasks: Vec<(String, ResolutionTask)> = tasks
		.into_iter()
		.map(|(name, rule)| (name, ResolutionTask::spawn(resolver.clone(), rule)))
		.collect();

	let mut prices = BTreeMap::new();
	for (name, task) in tasks.iter_mut() {
		let price = task.wait().await;
		tracing::info!(profile = %name, price = %price, "Resolved profile price");
		prices.insert(name.clone(), price);
	}
	Ok(prices)
}

/// Entitlement status of the current customer.
pub async fn premium_status(resolver: &OfferPriceResolver) -> bool {
	has_active_subscription(resolver.provider()).await
}

/// Renders resolved prices as `name: price` lines.
pub fn render_text(prices: &BTreeMap<String, String>) -> String {
	prices
		.iter()
		.map(|(name, price)| format!("{}: {}", name, price))
		.collect::<Vec<_>>()
		.join("\n")
}

/// Renders resolved prices as a JSON object.
pub fn render_json(
	prices: &BTreeMap<String, String>,
	premium: Option<bool>,
) -> Result<String, serde_json::Error> {
	let mut value = serde_json::json!({ "prices": prices });
	if let Some(premium) = premium {
		value["premium"] = serde_json::Value::Bool(premium);
	}
	serde_json::to_string_pretty(&value)
}
