//! Keyed snapshot cache with per-entry expiry and single-flight recomputation.

use std::{
	collections::HashMap,
	future::Future,
	hash::Hash,
	sync::{Arc, Mutex as StdMutex},
	time::Duration,
};

use tokio::{
	sync::{Mutex, RwLock},
	time::Instant,
};

pub struct Cached<V> {
	pub value: Arc<V>,
	/// `false` only for the caller that computed the value.
	pub from_cache: bool,
}

struct CacheEntry<V> {
	value: Arc<V>,
	/// `None` when the TTL does not fit the clock and the entry never expires.
	expires_at: Option<Instant>,
}
impl<V> CacheEntry<V> {
	fn is_fresh(&self, now: Instant) -> bool {
		self.expires_at.is_none_or(|expires_at| now < expires_at)
	}
}

/// Entries are published whole, so readers never see a partially computed value.
pub struct SnapshotCache<K, V> {
	ttl: Duration,
	entries: RwLock<HashMap<K, CacheEntry<V>>>,
	flights: StdMutex<HashMap<K, Arc<Mutex<()>>>>,
}
impl<K, V> SnapshotCache<K, V>
where
	K: Eq + Hash + Clone,
{
	pub fn new(ttl: Duration) -> Self {
		Self { ttl, entries: RwLock::new(HashMap::new()), flights: StdMutex::new(HashMap::new()) }
	}

	/// Returns the value for `key` if it has not expired.
	pub async fn get(&self, key: &K) -> Option<Arc<V>> {
		let entries = self.entries.read().await;

		entries.get(key).filter(|entry| entry.is_fresh(Instant::now())).map(|entry| entry.value.clone())
	}

	/// Returns the fresh value for `key`, or computes and publishes it. Concurrent misses on the
	/// same key wait for the first caller's computation instead of running their own. A failed
	/// computation publishes nothing.
	pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, compute: F) -> Result<Cached<V>, E>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<V, E>>,
	{
		if let Some(value) = self.get(&key).await {
			return Ok(Cached { value, from_cache: true });
		}

		let flight = self.flight(&key);
		let result = {
			let _guard = flight.lock().await;

			self.fill(&key, compute).await
		};

		self.release(&key, flight);

		result
	}

	pub async fn invalidate(&self, key: &K) {
		self.entries.write().await.remove(key);
	}

	pub async fn clear(&self) {
		self.entries.write().await.clear();
	}

	async fn fill<F, Fut, E>(&self, key: &K, compute: F) -> Result<Cached<V>, E>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<V, E>>,
	{
		if let Some(value) = self.get(key).await {
			return Ok(Cached { value, from_cache: true });
		}

		let value = Arc::new(compute().await?);
		let expires_at = Instant::now().checked_add(self.ttl);

		self.entries
			.write()
			.await
			.insert(key.clone(), CacheEntry { value: value.clone(), expires_at });

		Ok(Cached { value, from_cache: false })
	}

	fn flight(&self, key: &K) -> Arc<Mutex<()>> {
		let mut flights = self.flights.lock().unwrap_or_else(|err| err.into_inner());

		flights.entry(key.clone()).or_default().clone()
	}

	/// Drops the flight lock for `key` once no other caller holds it. Clones are taken and
	/// dropped under the same map lock, so a lock that is still shared is never removed.
	fn release(&self, key: &K, flight: Arc<Mutex<()>>) {
		let mut flights = self.flights.lock().unwrap_or_else(|err| err.into_inner());

		drop(flight);

		if flights.get(key).is_some_and(|current| Arc::strong_count(current) == 1) {
			flights.remove(key);
		}
	}

	#[cfg(test)]
	fn flights_in_use(&self) -> usize {
		self.flights.lock().unwrap_or_else(|err| err.into_inner()).len()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	const TTL: Duration = Duration::from_secs(3_600);

	#[tokio::test(start_paused = true)]
	async fn second_read_within_ttl_is_a_hit() {
		let cache: SnapshotCache<&str, u32> = SnapshotCache::new(TTL);
		let first = cache
			.get_or_try_insert_with("stats", || async { Ok::<_, ()>(7) })
			.await
			.expect("Compute succeeds.");
		let second = cache
			.get_or_try_insert_with("stats", || async { Ok::<_, ()>(8) })
			.await
			.expect("Compute succeeds.");

		assert!(!first.from_cache);
		assert!(second.from_cache);
		assert_eq!(*second.value, 7);
	}

	#[tokio::test(start_paused = true)]
	async fn expired_entries_are_recomputed() {
		let cache: SnapshotCache<&str, u32> = SnapshotCache::new(TTL);

		cache.get_or_try_insert_with("stats", || async { Ok::<_, ()>(1) }).await.expect("Compute.");

		tokio::time::advance(TTL + Duration::from_secs(1)).await;

		assert!(cache.get(&"stats").await.is_none());

		let refreshed = cache
			.get_or_try_insert_with("stats", || async { Ok::<_, ()>(2) })
			.await
			.expect("Compute succeeds.");

		assert!(!refreshed.from_cache);
		assert_eq!(*refreshed.value, 2);
	}

	#[tokio::test(start_paused = true)]
	async fn concurrent_misses_compute_once() {
		let cache: Arc<SnapshotCache<&str, u32>> = Arc::new(SnapshotCache::new(TTL));
		let calls = Arc::new(AtomicUsize::new(0));
		let mut handles = Vec::new();

		for _ in 0..8 {
			let cache = cache.clone();
			let calls = calls.clone();

			handles.push(tokio::spawn(async move {
				cache
					.get_or_try_insert_with("stats", || async {
						calls.fetch_add(1, Ordering::SeqCst);
						tokio::time::sleep(Duration::from_millis(50)).await;

						Ok::<_, ()>(42)
					})
					.await
					.map(|cached| (cached.from_cache, *cached.value))
			}));
		}

		let mut computed = 0;

		for handle in handles {
			let (from_cache, value) = handle.await.expect("Task joins.").expect("Compute succeeds.");

			assert_eq!(value, 42);

			if !from_cache {
				computed += 1;
			}
		}

		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert_eq!(computed, 1);
		assert_eq!(cache.flights_in_use(), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn flight_locks_are_released_after_each_fill() {
		let cache: SnapshotCache<u32, u32> = SnapshotCache::new(TTL);

		for key in 0..64 {
			cache.get_or_try_insert_with(key, || async move { Ok::<_, ()>(key) }).await.expect("Compute.");
		}

		let failed = cache.get_or_try_insert_with(64, || async { Err::<u32, _>("boom") }).await;
		let hit = cache
			.get_or_try_insert_with(7, || async { Ok::<_, ()>(0) })
			.await
			.expect("Compute succeeds.");

		assert!(failed.is_err());
		assert!(hit.from_cache);
		assert_eq!(*hit.value, 7);
		assert_eq!(cache.flights_in_use(), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn failures_are_not_cached() {
		let cache: SnapshotCache<&str, u32> = SnapshotCache::new(TTL);
		let failed = cache.get_or_try_insert_with("stats", || async { Err::<u32, _>("boom") }).await;

		assert!(failed.is_err());
		assert!(cache.get(&"stats").await.is_none());

		let recovered = cache
			.get_or_try_insert_with("stats", || async { Ok::<_, &str>(3) })
			.await
			.expect("Compute succeeds.");

		assert!(!recovered.from_cache);
	}

	#[tokio::test(start_paused = true)]
	async fn invalidate_and_clear_drop_entries() {
		let cache: SnapshotCache<&str, u32> = SnapshotCache::new(TTL);

		cache.get_or_try_insert_with("a", || async { Ok::<_, ()>(1) }).await.expect("Compute.");
		cache.get_or_try_insert_with("b", || async { Ok::<_, ()>(2) }).await.expect("Compute.");
		cache.invalidate(&"a").await;

		assert!(cache.get(&"a").await.is_none());
		assert_eq!(cache.get(&"b").await.as_deref(), Some(&2));

		cache.clear().await;

		assert!(cache.get(&"b").await.is_none());
	}
}
