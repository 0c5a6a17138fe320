//! Registry trait for self-registering implementations.

/// Base trait for implementation registries.
///
/// Every provider implementation module exposes a `Registry` struct that
/// implements this trait, declaring the name it is referenced by in
/// configuration and the factory that builds it.
pub trait ImplementationRegistry {
	/// Name used under `[provider.implementations.<NAME>]` in the config file.
	const NAME: &'static str;

	/// Factory function type for this kind of implementation.
	type Factory;

	/// Returns the factory that builds the implementation from its config table.
	fn factory() -> Self::Factory;
}
