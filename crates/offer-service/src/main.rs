//! Main entry point for the offer price service.
//!
//! Loads a configuration file, builds the configured purchase provider and
//! resolves the display price of every requested profile. Prices always
//! resolve: when the provider is unavailable or fails, the profile's fallback
//! is printed instead.

use clap::Parser;
use offer_config::Config;
use std::path::PathBuf;

mod runner;

use runner::{build_resolver, premium_status, render_json, render_text, resolve_profiles};

/// Command-line arguments for the offer price service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	/// Profile to resolve (repeatable, defaults to every configured profile)
	#[arg(short, long = "profile")]
	profiles: Vec<String>,

	/// Print the result as JSON
	#[arg(long)]
	json: bool,

	/// Also report whether the customer has an active entitlement
	#[arg(long)]
	entitlement: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	// stdout carries the prices
	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	tracing::info!("Started offer price service");

	let config = Config::from_file(&args.config).await?;
	tracing::info!(
		provider = %config.provider.primary,
		profiles = config.profiles.len(),
		"Loaded configuration"
	);

	let resolver = build_resolver(&config)?;
	let prices = resolve_profiles(&resolver, &config, &args.profiles).await?;

	let premium = if args.entitlement {
		Some(premium_status(&resolver).await)
	} else {
		None
	};

	if args.json {
		println!("{}", render_json(&prices, premium)?);
	} else {
		println!("{}", render_text(&prices));
		if let Some(premium) = premium {
			println!("premium: {}", premium);
		}
	}

	tracing::info!("Stopped offer price service");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[test]
	fn test_args_default_values() {
		let args = Args::parse_from(["offer-price"]);

		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
		assert!(args.profiles.is_empty());
		assert!(!args.json);
		assert!(!args.entitlement);
	}

	#[test]
	fn test_args_custom_values() {
		let args = Args::parse_from([
			"offer-price",
			"--config",
			"custom.toml",
			"-l",
			"debug",
			"--profile",
			"free_trial",
			"-p",
			"trial_paywall",
			"--json",
			"--entitlement",
		]);

		assert_eq!(args.config, PathBuf::from("custom.toml"));
		assert_eq!(args.log_level, "debug");
		assert_eq!(args.profiles, vec!["free_trial", "trial_paywall"]);
		assert!(args.json);
		assert!(args.entitlement);
	}

	fn write_config(available: bool) -> NamedTempFile {
		let mut file = NamedTempFile::new().unwrap();
		write!(
			file,
			r#"
[resolver]
fetch_timeout_ms = 5000

[provider]
primary = "static"

[provider.implementations.static]
available = {}
packages = [
  {{ identifier = "$rc_weekly", billing_period = "weekly", display_price = "$1.49" }},
]

[profiles.weekly]
preferred_period = "weekly"
period_suffix = "/semana"
fallback = "$0.49/semana"

[profiles.free_trial]
"#,
			available
		)
		.unwrap();
		file
	}

	#[tokio::test]
	async fn test_config_file_to_prices() {
		let file = write_config(true);
		let config = Config::from_file(file.path()).await.unwrap();
		let resolver = build_resolver(&config).unwrap();
		let prices = resolve_profiles(&resolver, &config, &[]).await.unwrap();

		assert_eq!(prices["weekly"], "$1.49/semana");
		// No monthly package, so the first package is advertised.
		assert_eq!(prices["free_trial"], "$1.49/mes");
	}

	#[tokio::test]
	async fn test_config_file_unavailable_provider_to_fallbacks() {
		let file = write_config(false);
		let config = Config::from_file(file.path()).await.unwrap();
		let resolver = build_resolver(&config).unwrap();
		let prices = resolve_profiles(&resolver, &config, &[]).await.unwrap();

		assert_eq!(prices["weekly"], "$0.49/semana");
		assert_eq!(prices["free_trial"], "$0.99/mes");
	}
}
