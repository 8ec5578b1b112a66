use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use crate::builder::{ComponentBuilder, ComponentConfig};
use crate::cache::SharedCache;
use crate::erased::SharedKey;
use crate::error::Result;
#[cfg(feature = "metrics")]
use crate::metrics::SharedMetrics;

/// Holds one immutable dependency and the shared values built from it.
///
/// The dependency is fixed at construction. Shared values are created on
/// first request by a caller-supplied factory and then returned, as the same
/// `Arc`, to every later request for the same key. Dropping the component
/// releases every value it cached.
///
/// Application types usually embed a `Component` and implement
/// [`HasComponent`](crate::HasComponent) to expose it.
///
/// # Thread Safety
///
/// `Component<D>` is `Send + Sync` when `D` is. Concurrent requests for the
/// same key run the factory once; the other callers block until it returns.
///
/// A factory runs with the component's lock held. It may request other
/// shared values from the same component on its own thread, but must not wait
/// on another thread that does so.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lazy_component::Component;
///
/// struct Pool(Vec<u32>);
///
/// let component = Component::new("db-config");
///
/// let first = component.shared("pool", || Pool(vec![1, 2, 3]));
/// let second: Arc<Pool> = component.shared("pool", || unreachable!());
///
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
pub struct Component<D> {
	dependency: D,
	cache: SharedCache,
}

/// Dependency type for components that need no injected data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EmptyDependency;

/// A component without a dependency.
pub type EmptyComponent = Component<EmptyDependency>;

impl<D> Component<D> {
	/// Create a component with default settings.
	pub fn new(dependency: D) -> Self {
		ComponentBuilder::new(dependency).build()
	}

	/// Start configuring a component around `dependency`.
	pub fn builder(dependency: D) -> ComponentBuilder<D> {
		ComponentBuilder::new(dependency)
	}

	pub(crate) fn from_config(dependency: D, config: ComponentConfig) -> Self {
		Self {
			dependency,
			cache: SharedCache::new(config.name, config.capacity),
		}
	}

	/// The dependency this component was constructed with.
	pub fn dependency(&self) -> &D {
		&self.dependency
	}

	/// Consume the component, dropping its shared values and returning the
	/// dependency.
	pub fn into_dependency(self) -> D {
		self.dependency
	}

	/// Label used in this component's log events.
	pub fn name(&self) -> &str {
		self.cache.name()
	}

	/// Return the value shared under `key`, building it with `factory` on the
	/// first request.
	///
	/// `factory` runs at most once per key for the lifetime of the component,
	/// even under concurrent calls. If it panics nothing is stored, and a
	/// later call will try again.
	///
	/// # Panics
	///
	/// Panics if `key` already holds a value that is not a `T`. That means two
	/// call sites share a key by mistake.
	pub fn shared<T, F>(&self, key: impl Into<SharedKey>, factory: F) -> Arc<T>
	where
		T: Send + Sync + 'static,
		F: FnOnce() -> T,
	{
		match self.cache.get_or_try_insert_with(key.into(), || Ok::<_, Infallible>(factory())) {
			Ok(value) => value,
			Err(never) => match never {},
		}
	}

	/// [`shared`](Self::shared) keyed on the caller's source location.
	///
	/// Each call site gets its own slot, so a component can keep several
	/// shared values of one type without naming them.
	///
	/// ```
	/// use lazy_component::Component;
	///
	/// let component = Component::new(());
	/// let read = component.shared_here(|| String::from("read"));
	/// let write = component.shared_here(|| String::from("write"));
	/// assert_ne!(read, write);
	/// ```
	#[track_caller]
	pub fn shared_here<T, F>(&self, factory: F) -> Arc<T>
	where
		T: Send + Sync + 'static,
		F: FnOnce() -> T,
	{
		self.shared(SharedKey::caller(), factory)
	}

	/// Like [`shared`](Self::shared), with a fallible factory.
	///
	/// An `Err` from `factory` is returned unchanged and nothing is stored.
	///
	/// # Panics
	///
	/// Panics on a type mismatch, like [`shared`](Self::shared).
	pub fn try_shared<T, E, F>(&self, key: impl Into<SharedKey>, factory: F) -> Result<Arc<T>, E>
	where
		T: Send + Sync + 'static,
		F: FnOnce() -> Result<T, E>,
	{
		self.cache.get_or_try_insert_with(key.into(), factory)
	}

	/// Like [`shared`](Self::shared), returning a clone of the value.
	pub fn shared_clone<T, F>(&self, key: impl Into<SharedKey>, factory: F) -> T
	where
		T: Clone + Send + Sync + 'static,
		F: FnOnce() -> T,
	{
		(*self.shared(key, factory)).clone()
	}

	/// Look up a shared value without constructing it.
	///
	/// Returns `Ok(None)` if nothing is stored under `key` and
	/// `Err(SharedError::TypeMismatch)` if something of another type is.
	pub fn get<T: Send + Sync + 'static>(&self, key: impl Into<SharedKey>) -> Result<Option<Arc<T>>> {
		self.cache.get(&key.into())
	}

	/// Check whether a value is stored under `key`.
	pub fn contains(&self, key: impl Into<SharedKey>) -> bool {
		self.cache.contains(&key.into())
	}

	/// Number of shared values built so far.
	pub fn len(&self) -> usize {
		self.cache.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	#[cfg(feature = "metrics")]
	pub fn metrics(&self) -> SharedMetrics {
		self.cache.metrics()
	}
}

impl Component<EmptyDependency> {
	/// Create a component that carries no dependency.
	pub fn empty() -> Self {
		Self::new(EmptyDependency)
	}
}

impl<D: Default> Default for Component<D> {
	fn default() -> Self {
		Self::new(D::default())
	}
}

impl<D: fmt::Debug> fmt::Debug for Component<D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Component")
			.field("name", &self.name())
			.field("dependency", &self.dependency)
			.field("shared", &self.len())
			.finish()
	}
}
