use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Weak};
use std::thread;

use lazy_component::{
	Component, ComponentBuilder, EmptyComponent, EmptyDependency, HasComponent, SharedError, SharedKey, shared,
};

#[derive(Debug)]
struct ConnectionPool {
	url: String,
	size: usize,
}

fn new_connection_pool(url: &str, calls: &AtomicUsize) -> ConnectionPool {
	calls.fetch_add(1, Ordering::SeqCst);
	ConnectionPool {
		url: url.to_string(),
		size: 4,
	}
}

#[test]
fn test_conn_pool_scenario() {
	let component = Component::new("db-config");
	let calls = AtomicUsize::new(0);

	let first = component.shared("connPool", || new_connection_pool(component.dependency(), &calls));
	let second = component.shared("connPool", || new_connection_pool(component.dependency(), &calls));

	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert!(Arc::ptr_eq(&first, &second));
	assert_eq!(second.url, "db-config");
	assert_eq!(second.size, 4);
}

#[test]
fn test_memoization_skips_second_factory() {
	let component = Component::empty();
	let second_called = AtomicUsize::new(0);

	let first = component.shared("k", || String::from("first"));
	let second = component.shared("k", || {
		second_called.fetch_add(1, Ordering::SeqCst);
		String::from("second")
	});

	assert!(Arc::ptr_eq(&first, &second));
	assert_eq!(*second, "first");
	assert_eq!(second_called.load(Ordering::SeqCst), 0);
}

fn contend(threads: usize) {
	let component = Arc::new(Component::new("db-config"));
	let calls = Arc::new(AtomicUsize::new(0));
	let barrier = Arc::new(Barrier::new(threads));

	let handles: Vec<_> = (0..threads)
		.map(|_| {
			let component = Arc::clone(&component);
			let calls = Arc::clone(&calls);
			let barrier = Arc::clone(&barrier);
			thread::spawn(move || {
				barrier.wait();
				component.shared("connPool", || new_connection_pool(component.dependency(), &calls))
			})
		})
		.collect();

	let pools: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();

	assert_eq!(calls.load(Ordering::SeqCst), 1, "{threads} threads");
	assert_eq!(pools.len(), threads);
	assert!(pools.iter().all(|pool| Arc::ptr_eq(pool, &pools[0])));
}

#[test]
fn test_single_construction_2_threads() {
	contend(2);
}

#[test]
fn test_single_construction_8_threads() {
	contend(8);
}

#[test]
fn test_single_construction_64_threads() {
	contend(64);
}

#[test]
fn test_key_independence() {
	let component = Component::empty();
	let calls_a = AtomicUsize::new(0);
	let calls_b = AtomicUsize::new(0);

	let a = component.shared("a", || {
		calls_a.fetch_add(1, Ordering::SeqCst);
		1_u32
	});
	assert_eq!(calls_b.load(Ordering::SeqCst), 0);

	let b = component.shared("b", || {
		calls_b.fetch_add(1, Ordering::SeqCst);
		1_u32
	});

	assert!(!Arc::ptr_eq(&a, &b));
	assert_eq!(calls_a.load(Ordering::SeqCst), 1);
	assert_eq!(calls_b.load(Ordering::SeqCst), 1);
	assert_eq!(component.len(), 2);
}

#[test]
fn test_dependency_unchanged_across_shared_calls() {
	let config = vec![String::from("primary"), String::from("replica")];
	let component = Component::new(config.clone());

	for i in 0..10 {
		assert_eq!(component.dependency(), &config);
		component.shared(format!("slot-{i}"), || i);
		assert_eq!(component.dependency(), &config);
	}

	assert_eq!(component.into_dependency(), config);
}

#[test]
fn test_drop_releases_cached_values() {
	let component = Component::empty();
	let pool = component.shared("pool", || vec![0_u8; 64]);
	let weak: Weak<Vec<u8>> = Arc::downgrade(&pool);

	assert_eq!(Arc::strong_count(&pool), 2);

	drop(component);
	assert_eq!(Arc::strong_count(&pool), 1);

	drop(pool);
	assert!(weak.upgrade().is_none());
}

#[test]
fn test_into_dependency_releases_cached_values() {
	let component = Component::new(5_u32);
	let weak = Arc::downgrade(&component.shared("n", || String::from("cached")));

	assert!(weak.upgrade().is_some());
	assert_eq!(component.into_dependency(), 5);
	assert!(weak.upgrade().is_none());
}

#[test]
#[should_panic(expected = "shared value `k` holds a `i32`")]
fn test_type_mismatch_panics() {
	let component = Component::empty();
	component.shared("k", || 1_i32);
	component.shared("k", || String::from("not an int"));
}

#[test]
fn test_type_mismatch_reported_by_get() {
	let component = Component::empty();
	component.shared("k", || 1_i32);

	match component.get::<String>("k") {
		Err(SharedError::TypeMismatch {
			key,
			expected,
			found,
		}) => {
			assert_eq!(key, SharedKey::named("k"));
			assert_eq!(expected, std::any::type_name::<String>());
			assert_eq!(found, "i32");
		}
		other => panic!("expected a type mismatch, got {other:?}"),
	}
}

#[test]
fn test_failed_factory_is_retried() {
	let component = Component::empty();
	let attempts = AtomicUsize::new(0);
	let connect = || {
		if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
			Err("connection refused")
		} else {
			Ok(ConnectionPool {
				url: "db".to_string(),
				size: 2,
			})
		}
	};

	assert_eq!(component.try_shared("pool", connect).unwrap_err(), "connection refused");
	assert!(component.is_empty());

	let pool = component.try_shared("pool", connect).unwrap();
	assert_eq!(pool.size, 2);
	assert_eq!(attempts.load(Ordering::SeqCst), 2);

	// Stored now; the factory is not consulted again.
	component.try_shared("pool", connect).unwrap();
	assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_failure_does_not_block_other_threads() {
	let component = Arc::new(Component::empty());

	let failing = {
		let component = Arc::clone(&component);
		thread::spawn(move || component.try_shared("pool", || Err::<u32, _>("down")))
	};
	assert!(failing.join().unwrap().is_err());

	let value = component.try_shared("pool", || Ok::<_, &str>(9_u32)).unwrap();
	assert_eq!(*value, 9);
}

#[test]
fn test_reentrant_factories() {
	let component = Component::new(2_u64);

	let product = component.shared("product", || {
		let a = component.shared("a", || *component.dependency() * 3);
		let b = component.shared("b", || {
			let a: Arc<u64> = component.shared("a", || unreachable!("already stored"));
			*a + 1
		});
		*a * *b
	});

	assert_eq!(*product, 42);
	assert_eq!(component.len(), 3);
}

#[test]
fn test_reentrant_factories_across_threads() {
	let component = Arc::new(Component::new(1_u64));

	let handles: Vec<_> = (0..8)
		.map(|_| {
			let component = Arc::clone(&component);
			thread::spawn(move || {
				let outer = component.shared("outer", || {
					let inner = component.shared("inner", || *component.dependency() + 1);
					*inner * 10
				});
				(*outer, *component.shared("inner", || 0_u64))
			})
		})
		.collect();

	for handle in handles {
		assert_eq!(handle.join().unwrap(), (20, 2));
	}
}

#[test]
fn test_call_site_keys_via_macro_and_method() {
	let component = Component::empty();

	let mut via_macro = Vec::new();
	let mut via_method = Vec::new();
	for i in 0..3_u32 {
		via_macro.push(shared!(component, || i));
		via_method.push(component.shared_here(|| i + 100));
	}

	assert!(via_macro.iter().all(|v| **v == 0));
	assert!(via_method.iter().all(|v| **v == 100));
	assert_eq!(component.len(), 2);
}

struct Storage {
	inner: Component<String>,
}

impl HasComponent for Storage {
	type Dependency = String;

	fn component(&self) -> &Component<String> {
		&self.inner
	}
}

impl Storage {
	fn primary(&self) -> Arc<ConnectionPool> {
		self.shared_here(|| ConnectionPool {
			url: format!("{}/primary", self.dependency()),
			size: 8,
		})
	}

	fn replica(&self) -> Arc<ConnectionPool> {
		self.shared_here(|| ConnectionPool {
			url: format!("{}/replica", self.dependency()),
			size: 2,
		})
	}

	fn cache(&self) -> Arc<Vec<u8>> {
		shared!(self, Vec::new)
	}
}

#[test]
fn test_embedded_component() {
	let storage = Storage {
		inner: ComponentBuilder::new(String::from("postgres://db")).name("storage").build(),
	};

	assert!(Arc::ptr_eq(&storage.primary(), &storage.primary()));
	assert_eq!(storage.primary().url, "postgres://db/primary");
	assert_eq!(storage.replica().url, "postgres://db/replica");
	assert!(storage.cache().is_empty());
	assert_eq!(storage.component().len(), 3);
	assert_eq!(storage.component().name(), "storage");
}

#[test]
fn test_empty_component() {
	let component: EmptyComponent = Component::empty();
	assert_eq!(*component.dependency(), EmptyDependency);
	assert_eq!(std::mem::size_of::<EmptyDependency>(), 0);

	let value = component.shared("x", || 1_u8);
	assert_eq!(*value, 1);
}

#[test]
fn test_components_do_not_share_caches() {
	let a = Component::empty();
	let b = Component::empty();

	let from_a = a.shared("pool", || 1_u32);
	let from_b = b.shared("pool", || 2_u32);

	assert_eq!(*from_a, 1);
	assert_eq!(*from_b, 2);
	assert!(!Arc::ptr_eq(&from_a, &from_b));
}
