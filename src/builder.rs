use std::any::type_name;
use std::borrow::Cow;

use crate::component::Component;

/// Builder for configuring a [`Component`].
///
/// # Example
///
/// ```
/// use lazy_component::ComponentBuilder;
///
/// let component = ComponentBuilder::new("db-config")
///     .name("storage")
///     .capacity(8)
///     .build();
///
/// assert_eq!(component.name(), "storage");
/// assert_eq!(*component.dependency(), "db-config");
/// ```
pub struct ComponentBuilder<D> {
	dependency: D,
	name: Option<Cow<'static, str>>,
	capacity: usize,
}

impl<D> ComponentBuilder<D> {
	/// Create a new builder around the component's dependency.
	pub fn new(dependency: D) -> Self {
		Self {
			dependency,
			name: None,
			capacity: 0,
		}
	}

	/// Set the label attached to this component's log events.
	///
	/// Default: the type name of the dependency.
	pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
		let name = name.into();
		assert!(!name.is_empty(), "component name must not be empty");
		self.name = Some(name);
		self
	}

	/// Reserve room for this many shared values up front.
	///
	/// Default: 0 (allocate on first construction)
	pub fn capacity(mut self, capacity: usize) -> Self {
		self.capacity = capacity;
		self
	}

	/// Build the component with the configured settings.
	pub fn build(self) -> Component<D> {
		let config = ComponentConfig {
			name: self.name.unwrap_or(Cow::Borrowed(type_name::<D>())),
			capacity: self.capacity,
		};
		Component::from_config(self.dependency, config)
	}
}

/// Validated settings handed from the builder to the component.
#[derive(Debug, Clone)]
pub(crate) struct ComponentConfig {
	pub name: Cow<'static, str>,
	pub capacity: usize,
}
