//! Registry trait for self-registering implementations.

/// Base trait for implementation registries.
///
/// Each backend module (node, wallet) provides a `Registry` struct that
/// declares the name used under `implementations.<name>` in the configuration
/// and the factory that builds it.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// for example "evm_alloy" for `node.implementations.evm_alloy`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
