//! # Lazy Component
//!
//! A component holds one immutable **dependency** and lazily builds
//! **shared** values from it:
//! - **At most one construction per key**, even under concurrent access
//! - **Type-checked retrieval** of heterogeneous values without a unified enum
//! - **Reentrant**: a factory may request other shared values on its own thread
//! - **Scoped lifetime**: cached values are released with the component
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use lazy_component::Component;
//!
//! struct ConnectionPool {
//!     url: String,
//! }
//!
//! let component = Component::new(String::from("postgres://db"));
//!
//! let pool = component.shared("conn-pool", || ConnectionPool {
//!     url: component.dependency().clone(),
//! });
//!
//! // Later requests return the same instance without calling the factory.
//! let again: Arc<ConnectionPool> = component.shared("conn-pool", || unreachable!());
//! assert!(Arc::ptr_eq(&pool, &again));
//! assert_eq!(again.url, "postgres://db");
//! ```
//!
//! ## Keys
//!
//! Every shared slot needs its own key. Pass one explicitly, or let the call
//! site name the slot with [`Component::shared_here`] or the [`shared!`]
//! macro:
//!
//! ```rust
//! use lazy_component::{Component, shared};
//!
//! let component = Component::empty();
//! let reader = shared!(component, || String::from("reader"));
//! let writer = shared!(component, || String::from("writer"));
//! assert_ne!(reader, writer);
//! ```
//!
//! ## Thread Safety
//!
//! `Component<D>` is `Send + Sync` when `D` is, and can be shared across
//! threads via `Arc`:
//!
//! ```rust,ignore
//! let component = Arc::new(Component::new(config));
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|_| {
//!         let component = component.clone();
//!         thread::spawn(move || component.shared("pool", build_pool))
//!     })
//!     .collect();
//! ```
//!
//! Factories run with the component's lock held. Do not block inside a
//! factory on another thread that calls back into the same component.

mod builder;
mod cache;
mod component;
mod erased;
mod error;
#[cfg(feature = "metrics")]
mod metrics;
mod traits;

pub use builder::ComponentBuilder;
pub use component::{Component, EmptyComponent, EmptyDependency};
pub use erased::SharedKey;
pub use error::{Result, SharedError};
#[cfg(feature = "metrics")]
pub use metrics::SharedMetrics;
pub use traits::HasComponent;

/// Fetch or build a shared value keyed on the macro's call site.
///
/// Works with a [`Component`] or anything implementing [`HasComponent`]
/// (the trait must be in scope).
///
/// ```
/// use lazy_component::{Component, shared};
///
/// let component = Component::new(3_u32);
/// let doubled = shared!(component, || component.dependency() * 2);
/// assert_eq!(*doubled, 6);
/// ```
#[macro_export]
macro_rules! shared {
	($component:expr, $factory:expr $(,)?) => {
		$component.shared(
			$crate::SharedKey::named(concat!(
				module_path!(),
				"@",
				file!(),
				":",
				line!(),
				":",
				column!()
			)),
			$factory,
		)
	};
}
