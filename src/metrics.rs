//! Shared-value cache metrics.

/// Counters describing how a component's shared values were resolved.
///
/// # Example
///
/// ```
/// use lazy_component::Component;
///
/// let component = Component::new("db-config");
/// component.shared("pool", || 1_u32);
/// component.shared("pool", || 2_u32);
///
/// let metrics = component.metrics();
/// assert_eq!(metrics.constructions, 1);
/// assert_eq!(metrics.hits, 1);
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedMetrics {
	/// Lookups that found a stored value.
	pub hits: u64,
	/// Lookups that had to run a factory.
	pub misses: u64,
	/// Factories that completed and had their value stored.
	pub constructions: u64,
	/// Fallible factories that returned an error.
	pub failures: u64,
	/// Current number of stored values.
	pub entry_count: usize,
}

impl SharedMetrics {
	/// Ratio of hits to all lookups, between 0.0 and 1.0.
	///
	/// Returns 0.0 if nothing has been looked up yet.
	pub fn hit_rate(&self) -> f64 {
		let total = self.total_lookups();
		if total == 0 {
			0.0
		} else {
			self.hits as f64 / total as f64
		}
	}

	pub fn total_lookups(&self) -> u64 {
		self.hits + self.misses
	}
}
