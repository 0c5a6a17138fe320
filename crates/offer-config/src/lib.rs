//! Configuration for the offer pricing service.
//!
//! Configuration is a single TOML file with three sections:
//!
//! - `[resolver]`: settings shared by every resolution (optional).
//! - `[provider]`: which purchase provider implementation to use and the raw
//!   table of each implementation, validated by the implementation itself.
//! - `[profiles.<name>]`: one pricing rule per screen.
//!
//! `${VAR}` and `${VAR:-default}` references are substituted from the
//! environment before parsing.

use offer_types::{PeriodTag, DEFAULT_FALLBACK, DEFAULT_PERIOD_SUFFIX};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Largest accepted configuration file, in bytes.
const MAX_CONFIG_SIZE: usize = 1024 * 1024;

/// Largest accepted fetch timeout, in milliseconds.
const MAX_FETCH_TIMEOUT_MS: u64 = 60_000;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Settings shared by every resolution.
	#[serde(default)]
	pub resolver: ResolverConfig,
	/// Purchase provider selection and implementation tables.
	pub provider: ProviderConfig,
	/// Pricing rules keyed by screen name.
	pub profiles: BTreeMap<String, ProfileConfig>,
}

/// Settings shared by every resolution.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ResolverConfig {
	/// Upper bound for one offer fetch. Unbounded when absent.
	pub fetch_timeout_ms: Option<u64>,
}

impl ResolverConfig {
	pub fn fetch_timeout(&self) -> Option<Duration> {
		self.fetch_timeout_ms.map(Duration::from_millis)
	}
}

/// Purchase provider selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Map of implementation names to their raw configuration tables.
	pub implementations: HashMap<String, toml::Value>,
}

impl ProviderConfig {
	/// Configuration table of the primary implementation.
	pub fn primary_config(&self) -> Option<&toml::Value> {
		self.implementations.get(&self.primary)
	}
}

/// Pricing rule of one screen.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProfileConfig {
	/// Billing period to prefer. Defaults to monthly.
	#[serde(default)]
	pub preferred_period: PeriodTag,
	/// Appended to the provider's display price.
	#[serde(default = "default_period_suffix")]
	pub period_suffix: String,
	/// Shown whenever no live price is available.
	#[serde(default = "default_fallback")]
	pub fallback: String,
}

/// Returns the default period suffix.
fn default_period_suffix() -> String {
	DEFAULT_PERIOD_SUFFIX.to_string()
}

/// Returns the default fallback price.
fn default_fallback() -> String {
	DEFAULT_FALLBACK.to_string()
}

impl Default for ProfileConfig {
	fn default() -> Self {
		Self {
			preferred_period: PeriodTag::default(),
			period_suffix: default_period_suffix(),
			fallback: default_fallback(),
		}
	}
}

/// Substitutes `${VAR}` and `${VAR:-default}` with environment values.
///
/// A reference to an unset variable without a default is an error.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	if input.len() > MAX_CONFIG_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_CONFIG_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut resolved = String::with_capacity(input.len());
	let mut last = 0;
	for cap in re.captures_iter(input) {
		let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};

		let value = match (std::env::var(name.as_str()), cap.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					name.as_str()
				)))
			},
		};

		resolved.push_str(&input[last..whole.start()]);
		resolved.push_str(&value);
		last = whole.end();
	}
	resolved.push_str(&input[last..]);

	Ok(resolved)
}

impl Config {
	/// Loads, resolves and validates the configuration file at `path`.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				e.kind(),
				format!("Cannot read {}: {}", path.display(), e),
			))
		})?;
		content.parse()
	}

	/// Profile names in sorted order.
	pub fn profile_names(&self) -> Vec<&str> {
		self.profiles.keys().map(String::as_str).collect()
	}

	/// Validates cross-field constraints serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.provider.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Provider primary implementation cannot be empty".into(),
			));
		}
		if self.provider.primary_config().is_none() {
			return Err(ConfigError::Validation(format!(
				"Primary provider '{}' not found in implementations",
				self.provider.primary
			)));
		}

		if let Some(timeout) = self.resolver.fetch_timeout_ms {
			if timeout == 0 || timeout > MAX_FETCH_TIMEOUT_MS {
				return Err(ConfigError::Validation(format!(
					"resolver.fetch_timeout_ms must be between 1 and {}",
					MAX_FETCH_TIMEOUT_MS
				)));
			}
		}

		if self.profiles.is_empty() {
			return Err(ConfigError::Validation(
				"At least one pricing profile must be configured".into(),
			));
		}
		for (name, profile) in &self.profiles {
			if profile.fallback.trim().is_empty() {
				return Err(ConfigError::Validation(format!(
					"Profile '{}' must have a non-empty fallback",
					name
				)));
			}
			if profile.preferred_period == PeriodTag::Unknown {
				return Err(ConfigError::Validation(format!(
					"Profile '{}' has an unrecognized preferred_period",
					name
				)));
			}
		}

		Ok(())
	}
}

/// Parses a configuration string: env substitution, TOML, validation.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
