use std::any::{Any, TypeId, type_name};
use std::borrow::Cow;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use crate::error::{Result, SharedError};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum KeyRepr {
	/// Caller-chosen identifier.
	Named(Cow<'static, str>),
	/// Source location of the requesting call site.
	CallSite(&'static Location<'static>),
}

/// Identifies one slot of shared state inside a component.
///
/// Keys must be unique per logical slot: two slots holding values of the
/// same type still need distinct keys. Keys come from either an explicit
/// name or the source location of the call site.
///
/// # Example
///
/// ```
/// use lazy_component::SharedKey;
///
/// let explicit = SharedKey::named("conn-pool");
/// let from_str: SharedKey = "conn-pool".into();
/// assert_eq!(explicit, from_str);
///
/// // Two different call sites never collide.
/// let a = SharedKey::caller();
/// let b = SharedKey::caller();
/// assert_ne!(a, b);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SharedKey {
	repr: KeyRepr,
}

impl SharedKey {
	/// Create a key from an explicit name.
	pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
		Self {
			repr: KeyRepr::Named(name.into()),
		}
	}

	/// Create a key identifying the caller's source location.
	///
	/// Propagates through other `#[track_caller]` functions, so wrappers
	/// such as `Component::shared_here` key on *their* caller.
	#[track_caller]
	pub fn caller() -> Self {
		Self::at(Location::caller())
	}

	/// Create a key for a specific source location.
	pub fn at(location: &'static Location<'static>) -> Self {
		Self {
			repr: KeyRepr::CallSite(location),
		}
	}

	/// Returns true if this key was derived from a call site.
	pub fn is_call_site(&self) -> bool {
		matches!(self.repr, KeyRepr::CallSite(_))
	}
}

impl fmt::Display for SharedKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.repr {
			KeyRepr::Named(name) => f.write_str(name),
			KeyRepr::CallSite(location) => write!(f, "{location}"),
		}
	}
}

impl From<&'static str> for SharedKey {
	fn from(name: &'static str) -> Self {
		Self::named(name)
	}
}

impl From<String> for SharedKey {
	fn from(name: String) -> Self {
		Self::named(name)
	}
}

impl From<&'static Location<'static>> for SharedKey {
	fn from(location: &'static Location<'static>) -> Self {
		Self::at(location)
	}
}

/// Type-erased shared value with its runtime type tag.
///
/// Stores the value as `Arc<dyn Any>` so lookups hand out the same instance
/// to every caller with a reference count bump.
pub(crate) struct Slot {
	value: Arc<dyn Any + Send + Sync>,
	type_id: TypeId,
	type_name: &'static str,
}

impl Slot {
	pub fn new<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
		Self {
			value,
			type_id: TypeId::of::<T>(),
			type_name: type_name::<T>(),
		}
	}

	/// Clone the stored `Arc` as a `T`, or report what the slot really holds.
	pub fn value_arc<T: Send + Sync + 'static>(&self, key: &SharedKey) -> Result<Arc<T>> {
		if self.type_id != TypeId::of::<T>() {
			return Err(self.mismatch::<T>(key));
		}
		Arc::clone(&self.value).downcast::<T>().map_err(|_| self.mismatch::<T>(key))
	}

	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	fn mismatch<T>(&self, key: &SharedKey) -> SharedError {
		SharedError::TypeMismatch {
			key: key.clone(),
			expected: type_name::<T>(),
			found: self.type_name,
		}
	}
}

impl fmt::Debug for Slot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Slot").field("type", &self.type_name()).finish_non_exhaustive()
	}
}
