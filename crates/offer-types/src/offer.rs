//! Offer and package types as reported by the purchase provider.
//!
//! These are read-only snapshots. The provider owns them and hands out a fresh
//! copy on every fetch; nothing in the workspace caches or mutates them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Suffix appended to the provider price when none is configured.
pub const DEFAULT_PERIOD_SUFFIX: &str = "/mes";

/// Price shown when no live price can be determined and none is configured.
pub const DEFAULT_FALLBACK: &str = "$0.99/mes";

/// Billing period of a package.
///
/// Mirrors the package types of the store SDK. Tags the workspace does not
/// know about deserialize to [`PeriodTag::Unknown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodTag {
	Lifetime,
	Annual,
	SixMonth,
	ThreeMonth,
	TwoMonth,
	#[default]
	Monthly,
	Weekly,
	Custom,
	#[serde(other)]
	Unknown,
}

impl PeriodTag {
	/// Returns the configuration spelling of this tag.
	pub fn as_str(&self) -> &'static str {
		match self {
			PeriodTag::Lifetime => "lifetime",
			PeriodTag::Annual => "annual",
			PeriodTag::SixMonth => "six_month",
			PeriodTag::ThreeMonth => "three_month",
			PeriodTag::TwoMonth => "two_month",
			PeriodTag::Monthly => "monthly",
			PeriodTag::Weekly => "weekly",
			PeriodTag::Custom => "custom",
			PeriodTag::Unknown => "unknown",
		}
	}
}

impl FromStr for PeriodTag {
	type Err = String;

	/// Parses the configuration spelling. Unlike deserialization, unknown
	/// spellings are an error here.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"lifetime" => Ok(PeriodTag::Lifetime),
			"annual" => Ok(PeriodTag::Annual),
			"six_month" => Ok(PeriodTag::SixMonth),
			"three_month" => Ok(PeriodTag::ThreeMonth),
			"two_month" => Ok(PeriodTag::TwoMonth),
			"monthly" => Ok(PeriodTag::Monthly),
			"weekly" => Ok(PeriodTag::Weekly),
			"custom" => Ok(PeriodTag::Custom),
			"unknown" => Ok(PeriodTag::Unknown),
			other => Err(format!("Unrecognized billing period '{}'", other)),
		}
	}
}

impl fmt::Display for PeriodTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One purchasable plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
	/// Provider-side package identifier (e.g. "$rc_monthly").
	pub identifier: String,
	/// Billing period of the plan.
	pub billing_period: PeriodTag,
	/// Localized price with currency symbol, ready for display (e.g. "$4.99").
	pub display_price: String,
	/// Store product identifier, kept for a later checkout step.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub product_id: Option<String>,
}

impl Package {
	pub fn new(
		identifier: impl Into<String>,
		billing_period: PeriodTag,
		display_price: impl Into<String>,
	) -> Self {
		Self {
			identifier: identifier.into(),
			billing_period,
			display_price: display_price.into(),
			product_id: None,
		}
	}
}

/// A provider-supplied bundle of purchasable packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
	/// Provider-side offering identifier (e.g. "default").
	pub identifier: String,
	/// Available packages in provider order. May be empty.
	#[serde(default)]
	pub packages: Vec<Package>,
}

impl Offer {
	pub fn new(identifier: impl Into<String>, packages: Vec<Package>) -> Self {
		Self {
			identifier: identifier.into(),
			packages,
		}
	}

	/// Returns the first package with the given billing period, if any.
	pub fn package_for(&self, period: PeriodTag) -> Option<&Package> {
		self.packages.iter().find(|p| p.billing_period == period)
	}
}

/// Subscription state of the current customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
	/// Provider user id the entitlements belong to.
	pub app_user_id: String,
	/// Identifiers of the currently active entitlements.
	#[serde(default)]
	pub active_entitlements: Vec<String>,
}

impl CustomerInfo {
	/// A customer is premium when at least one entitlement is active.
	pub fn is_premium(&self) -> bool {
		!self.active_entitlements.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_period_tag_snake_case() {
		let json = serde_json::to_string(&PeriodTag::SixMonth).unwrap();
		assert_eq!(json, "\"six_month\"");

		let tag: PeriodTag = serde_json::from_str("\"monthly\"").unwrap();
		assert_eq!(tag, PeriodTag::Monthly);
		assert_eq!(tag.to_string(), "monthly");
	}

	#[test]
	fn test_unrecognized_period_maps_to_unknown() {
		let tag: PeriodTag = serde_json::from_str("\"fortnightly\"").unwrap();
		assert_eq!(tag, PeriodTag::Unknown);
		assert!("fortnightly".parse::<PeriodTag>().is_err());
		assert_eq!("three_month".parse::<PeriodTag>(), Ok(PeriodTag::ThreeMonth));
	}

	#[test]
	fn test_package_for_returns_first_match() {
		let offer = Offer::new(
			"default",
			vec![
				Package::new("$rc_annual", PeriodTag::Annual, "$39.99"),
				Package::new("$rc_monthly", PeriodTag::Monthly, "$4.99"),
				Package::new("monthly_promo", PeriodTag::Monthly, "$2.99"),
			],
		);

		let monthly = offer.package_for(PeriodTag::Monthly).unwrap();
		assert_eq!(monthly.identifier, "$rc_monthly");
		assert!(offer.package_for(PeriodTag::Weekly).is_none());
	}

	#[test]
	fn test_customer_premium() {
		let mut info = CustomerInfo {
			app_user_id: "user_1".to_string(),
			active_entitlements: vec![],
		};
		assert!(!info.is_premium());

		info.active_entitlements.push("premium".to_string());
		assert!(info.is_premium());
	}
}
