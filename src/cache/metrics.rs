// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for token cache activity.
#[derive(Debug, Default)]
pub struct CacheMetrics {
	hits: AtomicU64,
	fetches: AtomicU64,
	failures: AtomicU64,
	shared: AtomicU64,
	stores: AtomicU64,
	expirations: AtomicU64,
}
impl CacheMetrics {
	/// Returns how many retrievals were served from a valid cached token.
	pub fn hits(&self) -> u64 {
		self.hits.load(Ordering::Relaxed)
	}

	/// Returns how many exchanges the cache started.
	pub fn fetches(&self) -> u64 {
		self.fetches.load(Ordering::Relaxed)
	}

	/// Returns how many exchanges failed.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Returns how many waiters reused another caller's fetch outcome.
	pub fn shared(&self) -> u64 {
		self.shared.load(Ordering::Relaxed)
	}

	/// Returns how many tokens were installed (fetched or stored explicitly).
	pub fn stores(&self) -> u64 {
		self.stores.load(Ordering::Relaxed)
	}

	/// Returns how many tokens the expiry timer cleared.
	pub fn expirations(&self) -> u64 {
		self.expirations.load(Ordering::Relaxed)
	}

	pub(crate) fn record_hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_fetch(&self) {
		self.fetches.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_shared(&self) {
		self.shared.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_store(&self) {
		self.stores.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_expiration(&self) {
		self.expirations.fetch_add(1, Ordering::Relaxed);
	}
}
