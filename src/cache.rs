use std::borrow::Cow;
use std::cell::RefCell;
#[cfg(feature = "metrics")]
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ahash::RandomState;
use hashbrown::HashMap;
use hashbrown::hash_map::Entry as MapEntry;
use parking_lot::ReentrantMutex;

use crate::erased::{SharedKey, Slot};
use crate::error::Result;
#[cfg(feature = "metrics")]
use crate::metrics::SharedMetrics;

type Slots = HashMap<SharedKey, Slot, RandomState>;

/// Keyed store of lazily constructed, type-erased values.
///
/// Each key is written at most once and never evicted; values live until the
/// cache is dropped.
///
/// # Locking
///
/// A single reentrant mutex guards the map and is held while a factory runs,
/// so concurrent callers for the same key wait for the first construction and
/// then observe its result. A factory may itself request other keys on the
/// same thread. The `RefCell` is never borrowed across a factory call, which
/// is what makes that re-entry sound.
///
/// A factory must not block on another thread that calls back into the same
/// cache: that thread waits on the lock the factory's thread holds.
pub(crate) struct SharedCache {
	slots: ReentrantMutex<RefCell<Slots>>,
	/// Label carried by log events
	name: Cow<'static, str>,
	#[cfg(feature = "metrics")]
	hits: AtomicU64,
	#[cfg(feature = "metrics")]
	misses: AtomicU64,
	#[cfg(feature = "metrics")]
	constructions: AtomicU64,
	#[cfg(feature = "metrics")]
	failures: AtomicU64,
}

impl SharedCache {
	pub fn new(name: Cow<'static, str>, capacity: usize) -> Self {
		Self {
			slots: ReentrantMutex::new(RefCell::new(HashMap::with_capacity_and_hasher(
				capacity,
				RandomState::new(),
			))),
			name,
			#[cfg(feature = "metrics")]
			hits: AtomicU64::new(0),
			#[cfg(feature = "metrics")]
			misses: AtomicU64::new(0),
			#[cfg(feature = "metrics")]
			constructions: AtomicU64::new(0),
			#[cfg(feature = "metrics")]
			failures: AtomicU64::new(0),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Return the value stored under `key`, constructing it with `factory`
	/// first if the key is empty.
	///
	/// An `Err` from the factory is returned as is and leaves the key empty.
	/// A panicking factory unwinds through here with the same effect.
	///
	/// # Panics
	///
	/// Panics if the key already holds a value of a type other than `T`.
	pub fn get_or_try_insert_with<T, E, F>(&self, key: SharedKey, factory: F) -> Result<Arc<T>, E>
	where
		T: Send + Sync + 'static,
		F: FnOnce() -> Result<T, E>,
	{
		let guard = self.slots.lock();

		// Scoped so the borrow ends before the factory runs.
		let existing = guard.borrow().get(&key).map(|slot| slot.value_arc::<T>(&key));
		if let Some(found) = existing {
			#[cfg(feature = "metrics")]
			self.hits.fetch_add(1, Ordering::Relaxed);
			tracing::trace!(component = %self.name, %key, "shared value hit");
			return Ok(expect_type(found));
		}

		#[cfg(feature = "metrics")]
		self.misses.fetch_add(1, Ordering::Relaxed);
		tracing::debug!(
			component = %self.name,
			%key,
			ty = std::any::type_name::<T>(),
			"constructing shared value"
		);

		let value = match factory() {
			Ok(value) => Arc::new(value),
			Err(err) => {
				#[cfg(feature = "metrics")]
				self.failures.fetch_add(1, Ordering::Relaxed);
				tracing::warn!(component = %self.name, %key, "shared value factory failed");
				return Err(err);
			}
		};

		let mut slots = guard.borrow_mut();
		match slots.entry(key) {
			MapEntry::Occupied(occupied) => {
				// The factory re-entered with its own key and a nested call
				// stored first. Stored entries are never replaced.
				tracing::warn!(
					component = %self.name,
					key = %occupied.key(),
					"shared value stored during its own construction, keeping the first"
				);
				Ok(expect_type(occupied.get().value_arc::<T>(occupied.key())))
			}
			MapEntry::Vacant(vacant) => {
				tracing::debug!(component = %self.name, key = %vacant.key(), "shared value stored");
				vacant.insert(Slot::new(Arc::clone(&value)));
				#[cfg(feature = "metrics")]
				self.constructions.fetch_add(1, Ordering::Relaxed);
				Ok(value)
			}
		}
	}

	/// Look up `key` without constructing anything.
	pub fn get<T: Send + Sync + 'static>(&self, key: &SharedKey) -> Result<Option<Arc<T>>> {
		let guard = self.slots.lock();
		let slots = guard.borrow();
		slots.get(key).map(|slot| slot.value_arc::<T>(key)).transpose()
	}

	pub fn contains(&self, key: &SharedKey) -> bool {
		self.slots.lock().borrow().contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.slots.lock().borrow().len()
	}

	#[cfg(feature = "metrics")]
	pub fn metrics(&self) -> SharedMetrics {
		SharedMetrics {
			hits: self.hits.load(Ordering::Relaxed),
			misses: self.misses.load(Ordering::Relaxed),
			constructions: self.constructions.load(Ordering::Relaxed),
			failures: self.failures.load(Ordering::Relaxed),
			entry_count: self.len(),
		}
	}
}

/// Unwrap a typed lookup, treating a mismatch as a caller bug.
fn expect_type<T>(found: Result<Arc<T>>) -> Arc<T> {
	match found {
		Ok(value) => value,
		Err(err) => panic!("{err}"),
	}
}
