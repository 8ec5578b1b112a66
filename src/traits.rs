use std::sync::Arc;

use crate::component::Component;
use crate::erased::SharedKey;
use crate::error::Result;

/// Implemented by application types that embed a [`Component`].
///
/// Only [`component`](HasComponent::component) is required; the rest
/// forwards to it.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lazy_component::{Component, HasComponent};
///
/// struct DbConfig {
///     url: String,
/// }
///
/// struct Pool {
///     url: String,
/// }
///
/// struct StorageComponent {
///     inner: Component<DbConfig>,
/// }
///
/// impl HasComponent for StorageComponent {
///     type Dependency = DbConfig;
///
///     fn component(&self) -> &Component<DbConfig> {
///         &self.inner
///     }
/// }
///
/// impl StorageComponent {
///     fn pool(&self) -> Arc<Pool> {
///         self.shared_here(|| Pool {
///             url: self.dependency().url.clone(),
///         })
///     }
/// }
///
/// let storage = StorageComponent {
///     inner: Component::new(DbConfig { url: "postgres://db".into() }),
/// };
/// assert!(Arc::ptr_eq(&storage.pool(), &storage.pool()));
/// ```
pub trait HasComponent {
	/// The dependency the embedded component holds.
	type Dependency;

	fn component(&self) -> &Component<Self::Dependency>;

	fn dependency(&self) -> &Self::Dependency {
		self.component().dependency()
	}

	/// See [`Component::shared`].
	fn shared<T, F>(&self, key: impl Into<SharedKey>, factory: F) -> Arc<T>
	where
		T: Send + Sync + 'static,
		F: FnOnce() -> T,
	{
		self.component().shared(key, factory)
	}

	/// See [`Component::shared_here`].
	#[track_caller]
	fn shared_here<T, F>(&self, factory: F) -> Arc<T>
	where
		T: Send + Sync + 'static,
		F: FnOnce() -> T,
	{
		self.component().shared_here(factory)
	}

	/// See [`Component::try_shared`].
	fn try_shared<T, E, F>(&self, key: impl Into<SharedKey>, factory: F) -> Result<Arc<T>, E>
	where
		T: Send + Sync + 'static,
		F: FnOnce() -> Result<T, E>,
	{
		self.component().try_shared(key, factory)
	}
}
