//! Premium entitlement check.

use offer_provider::PurchaseProviderService;

/// Whether the current customer has at least one active entitlement.
///
/// Returns false when purchases are unavailable, when the provider cannot
/// identify a customer, and when the lookup fails. Failures are logged, never
/// returned.
pub async fn has_active_subscription(provider: &PurchaseProviderService) -> bool {
	if !provider.can_make_purchases() {
		return false;
	}

	match provider.get_customer_info().await {
		Ok(Some(info)) => info.is_premium(),
		Ok(None) => false,
		Err(e) => {
			tracing::warn!(error = %e, "Failed to check subscription status");
			false
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use offer_provider::implementations::fixed::{StaticProvider, StaticProviderConfig};

	fn service(config: StaticProviderConfig) -> PurchaseProviderService {
		PurchaseProviderService::new(Box::new(StaticProvider::new(config)))
	}

	#[tokio::test]
	async fn test_active_entitlement() {
		let provider = service(StaticProviderConfig {
			entitlements: vec!["premium".to_string()],
			..Default::default()
		});
		assert!(has_active_subscription(&provider).await);
	}

	#[tokio::test]
	async fn test_no_entitlements() {
		let provider = service(StaticProviderConfig::default());
		assert!(!has_active_subscription(&provider).await);
	}

	#[tokio::test]
	async fn test_failures_read_as_not_premium() {
		let unavailable = service(StaticProviderConfig {
			available: false,
			entitlements: vec!["premium".to_string()],
			..Default::default()
		});
		assert!(!has_active_subscription(&unavailable).await);

		let failing = service(StaticProviderConfig {
			fail_fetch: Some("timeout".to_string()),
			entitlements: vec!["premium".to_string()],
			..Default::default()
		});
		assert!(!has_active_subscription(&failing).await);
	}
}
