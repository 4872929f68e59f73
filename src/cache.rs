//! Single-token cache with single-flight refetch and early expiry.
//!
//! [`TokenCache`] is either empty or holds one valid [`AccessToken`]. A hit returns the shared
//! token immediately. On a miss exactly one caller runs the exchange while the others wait on
//! the fetch gate and then receive that same outcome, token or error. Every stored token gets
//! an expiry timer that empties the cache [`DEFAULT_EXPIRY_MARGIN`] before the token really
//! expires, so a stale token is never handed out.
//!
//! Two independent locks guard the cache:
//!
//! - the fetch gate, an async mutex held across the exchange, serializes fetches;
//! - the mutation gate, a short synchronous mutex, covers the token, its generation, and the
//!   pending timer, and is never held across an `.await`.

mod expiry;
mod metrics;

pub use metrics::*;

// std
use std::sync::{
	Weak,
	atomic::{AtomicU64, Ordering},
};
// crates.io
use tokio::runtime::Handle;
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	cache::expiry::ExpiryTimer,
	clock::{Clock, SystemClock},
	error::ArgumentError,
	obs::{self, CacheEvent, FlowKind, FlowSpan},
};

/// Default lead time between clearing a token and its real expiry.
pub const DEFAULT_EXPIRY_MARGIN: Duration = Duration::minutes(2);
/// Delay used when a stored token is already inside the expiry margin.
pub const MIN_EXPIRY_DELAY: Duration = Duration::milliseconds(100);

/// Boxed future returned by [`TokenSource::fetch_token`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<AccessToken>> + 'a + Send>>;

/// Anything that can produce a fresh access token on demand.
pub trait TokenSource
where
	Self: Send + Sync,
{
	/// Fetches a new token; called at most once at a time per cache.
	fn fetch_token(&self) -> TokenFuture<'_>;
}

/// Shared access token cache for one client identity.
pub struct TokenCache<S>
where
	S: ?Sized + TokenSource,
{
	source: Arc<S>,
	clock: Arc<dyn Clock>,
	expiry_margin: Duration,
	slot: Arc<Mutex<CacheSlot>>,
	fetch_gate: AsyncMutex<Option<Error>>,
	fetch_epoch: AtomicU64,
	metrics: Arc<CacheMetrics>,
}
impl<S> TokenCache<S>
where
	S: ?Sized + TokenSource,
{
	/// Creates an empty cache that fetches from `source`.
	pub fn new(source: impl Into<Arc<S>>) -> Self {
		Self {
			source: source.into(),
			clock: Arc::new(SystemClock),
			expiry_margin: DEFAULT_EXPIRY_MARGIN,
			slot: Default::default(),
			fetch_gate: AsyncMutex::new(None),
			fetch_epoch: AtomicU64::new(0),
			metrics: Default::default(),
		}
	}

	/// Replaces the clock used to compute expiry delays.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Overrides how long before real expiry a token is cleared (defaults to two minutes).
	pub fn with_expiry_margin(mut self, margin: Duration) -> Self {
		self.expiry_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Token source backing this cache.
	pub fn source(&self) -> &Arc<S> {
		&self.source
	}

	/// Shared activity counters.
	pub fn metrics(&self) -> Arc<CacheMetrics> {
		self.metrics.clone()
	}

	/// Returns the cached token without fetching.
	pub fn current(&self) -> Option<Arc<AccessToken>> {
		let now = self.clock.now();

		self.slot.lock().token.as_ref().filter(|token| !token.is_expired_at(now)).cloned()
	}

	/// Returns a valid token, fetching one if the cache is empty.
	///
	/// Concurrent callers that miss share a single fetch: they all receive the same token, or
	/// the same error. A failed fetch leaves the cache empty so the next call tries again.
	pub async fn retrieve(&self) -> Result<Arc<AccessToken>> {
		FlowSpan::new(FlowKind::Retrieve, "retrieve")
			.observe(async move {
				let ticket = self.fetch_epoch.load(Ordering::Acquire);

				if let Some(token) = self.current() {
					self.record(CacheEvent::Hit);

					return Ok(token);
				}

				let mut last_failure = self.fetch_gate.lock().await;

				if let Some(token) = self.current() {
					self.record(CacheEvent::Hit);

					return Ok(token);
				}
				// A fetch failed while this caller waited; the failure is this caller's too. A
				// successful one is shared only through the slot, which was empty above.
				if self.fetch_epoch.load(Ordering::Acquire) != ticket {
					if let Some(e) = last_failure.as_ref() {
						self.record(CacheEvent::Shared);

						return Err(e.clone());
					}
				}

				self.record(CacheEvent::Fetch);

				let outcome = self.fetch_and_store().await;

				*last_failure = outcome.as_ref().err().cloned();

				if last_failure.is_some() {
					self.metrics.record_failure();
				}

				self.fetch_epoch.fetch_add(1, Ordering::Release);

				outcome
			})
			.await
	}

	/// Installs `token`, replacing any cached one, and schedules its expiry.
	///
	/// The previous expiry timer is cancelled first. Expiry fires
	/// [`with_expiry_margin`](Self::with_expiry_margin) before `expires_at`, or after
	/// [`MIN_EXPIRY_DELAY`] when that instant already passed. Requires a Tokio runtime context.
	pub fn store(&self, token: AccessToken) -> Result<Arc<AccessToken>> {
		let runtime = Handle::try_current().map_err(|_| ArgumentError::RuntimeUnavailable)?;
		let token = Arc::new(token);
		let delay = self.expiry_delay(&token);
		let mut slot = self.slot.lock();

		if let Some(timer) = slot.expiry.take() {
			timer.cancel();
		}

		slot.generation = slot.generation.wrapping_add(1);
		slot.token = Some(token.clone());

		let generation = slot.generation;
		let weak_slot = Arc::downgrade(&self.slot);
		let metrics = self.metrics.clone();

		slot.expiry = Some(ExpiryTimer::schedule(&runtime, delay.unsigned_abs(), move || {
			expire_generation(&weak_slot, generation, &metrics);
		}));

		drop(slot);
		self.record(CacheEvent::Store);

		Ok(token)
	}

	async fn fetch_and_store(&self) -> Result<Arc<AccessToken>> {
		let token = self.source.fetch_token().await?;

		self.store(token)
	}

	fn expiry_delay(&self, token: &AccessToken) -> Duration {
		let delay = token.expires_at() - self.expiry_margin - self.clock.now();

		if delay.is_positive() { delay } else { MIN_EXPIRY_DELAY }
	}

	fn record(&self, event: CacheEvent) {
		match event {
			CacheEvent::Hit => self.metrics.record_hit(),
			CacheEvent::Fetch => self.metrics.record_fetch(),
			CacheEvent::Shared => self.metrics.record_shared(),
			CacheEvent::Store => self.metrics.record_store(),
			CacheEvent::Expire => self.metrics.record_expiration(),
		}

		obs::record_cache_event(event);
	}
}
impl<S> Debug for TokenCache<S>
where
	S: ?Sized + TokenSource,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let slot = self.slot.lock();

		f.debug_struct("TokenCache")
			.field("token", &slot.token)
			.field("generation", &slot.generation)
			.field("expiry_margin", &self.expiry_margin)
			.finish()
	}
}

#[derive(Debug, Default)]
struct CacheSlot {
	token: Option<Arc<AccessToken>>,
	generation: u64,
	expiry: Option<ExpiryTimer>,
}

/// Clears the token only if no newer store superseded the timer that fired.
fn expire_generation(slot: &Weak<Mutex<CacheSlot>>, generation: u64, metrics: &CacheMetrics) {
	let Some(slot) = slot.upgrade() else {
		return;
	};
	let mut slot = slot.lock();

	if slot.generation != generation || slot.token.is_none() {
		return;
	}

	slot.token = None;
	drop(slot);
	metrics.record_expiration();
	obs::record_cache_event(CacheEvent::Expire);
}
