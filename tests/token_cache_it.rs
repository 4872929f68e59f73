// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use time::{Duration, macros::datetime};
use tokio::time::sleep;
// self
use oauth2_jwt_bearer::{
	auth::AccessToken,
	cache::{TokenCache, TokenFuture, TokenSource},
	clock::{Clock, ManualClock},
	error::{AuthServerError, Error},
};

const FETCH_LATENCY: StdDuration = StdDuration::from_millis(50);

/// Issues `token-N` for the N-th call, failing the first `failures` calls.
struct CountingSource {
	calls: AtomicUsize,
	failures: usize,
	lifetime: Duration,
	clock: ManualClock,
}
impl CountingSource {
	fn new(clock: &ManualClock, lifetime: Duration) -> Self {
		Self { calls: AtomicUsize::new(0), failures: 0, lifetime, clock: clock.clone() }
	}

	fn failing_first(mut self, failures: usize) -> Self {
		self.failures = failures;

		self
	}

	fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl TokenSource for CountingSource {
	fn fetch_token(&self) -> TokenFuture<'_> {
		Box::pin(async move {
			let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

			sleep(FETCH_LATENCY).await;

			if call <= self.failures {
				return Err(Error::from(AuthServerError {
					status: 500,
					body: format!("failure {call}"),
					oauth_error: None,
					oauth_error_description: None,
					retry_after: None,
				}));
			}

			Ok(AccessToken::expiring_in(format!("token-{call}"), self.clock.now(), self.lifetime)?)
		})
	}
}

/// Issues one-minute tokens; the clock passes the first one's expiry before it is returned.
struct LapsingSource {
	calls: AtomicUsize,
	clock: ManualClock,
}
impl TokenSource for LapsingSource {
	fn fetch_token(&self) -> TokenFuture<'_> {
		Box::pin(async move {
			let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

			sleep(FETCH_LATENCY).await;

			let token = AccessToken::expiring_in(
				format!("token-{call}"),
				self.clock.now(),
				Duration::minutes(1),
			)?;

			if call == 1 {
				self.clock.advance(Duration::minutes(2));
			}

			Ok(token)
		})
	}
}

fn build_cache(source: CountingSource, clock: &ManualClock) -> Arc<TokenCache<CountingSource>> {
	Arc::new(TokenCache::new(source).with_clock(Arc::new(clock.clone())))
}

async fn retrieve_concurrently(
	cache: &Arc<TokenCache<CountingSource>>,
	callers: usize,
) -> Vec<Result<Arc<AccessToken>, Error>> {
	let mut tasks = Vec::with_capacity(callers);

	for _ in 0..callers {
		let cache = cache.clone();

		tasks.push(tokio::spawn(async move { cache.retrieve().await }));
	}

	let mut outcomes = Vec::with_capacity(callers);

	for task in tasks {
		outcomes.push(task.await.expect("Retrieve task should not panic."));
	}

	outcomes
}

#[tokio::test(start_paused = true)]
async fn concurrent_misses_share_a_single_fetch() {
	let clock = ManualClock::new(datetime!(2025-01-01 00:00 UTC));
	let cache = build_cache(CountingSource::new(&clock, Duration::hours(1)), &clock);
	let tokens = retrieve_concurrently(&cache, 16)
		.await
		.into_iter()
		.collect::<Result<Vec<_>, _>>()
		.expect("Every caller should receive the fetched token.");

	assert_eq!(cache.source().calls(), 1);
	assert!(tokens.iter().all(|token| Arc::ptr_eq(token, &tokens[0])));
	assert_eq!(tokens[0].expose(), "token-1");

	let metrics = cache.metrics();

	assert_eq!(metrics.fetches(), 1);
	assert_eq!(metrics.stores(), 1);
	assert_eq!(metrics.hits(), 15);
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_is_shared_and_leaves_cache_empty() {
	let clock = ManualClock::new(datetime!(2025-01-01 00:00 UTC));
	let cache = build_cache(CountingSource::new(&clock, Duration::hours(1)).failing_first(1), &clock);
	let outcomes = retrieve_concurrently(&cache, 8).await;

	assert_eq!(cache.source().calls(), 1);

	for outcome in &outcomes {
		let Err(Error::AuthServer(err)) = outcome else {
			panic!("Every caller should receive the shared failure, got {outcome:?}.");
		};

		assert_eq!(err.status, 500);
		assert_eq!(err.body, "failure 1");
	}

	assert!(cache.current().is_none());
	assert_eq!(cache.metrics().failures(), 1);
	assert_eq!(cache.metrics().shared(), 7);

	let token = cache.retrieve().await.expect("The next retrieve should fetch again.");

	assert_eq!(token.expose(), "token-2");
	assert_eq!(cache.source().calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn token_is_refetched_once_the_expiry_margin_is_reached() {
	let clock = ManualClock::new(datetime!(2025-01-01 00:00 UTC));
	let cache = build_cache(CountingSource::new(&clock, Duration::minutes(10)), &clock);
	let first = cache.retrieve().await.expect("Initial retrieve should succeed.");

	sleep(StdDuration::from_secs(7 * 60)).await;

	let cached = cache.retrieve().await.expect("Cached retrieve should succeed.");

	assert!(Arc::ptr_eq(&first, &cached));
	assert_eq!(cache.source().calls(), 1);

	// Expiry fires at expires_at - 2 min, i.e. 8 min after the store.
	sleep(StdDuration::from_secs(61)).await;

	assert!(cache.current().is_none());
	assert_eq!(cache.metrics().expirations(), 1);

	let refreshed = cache.retrieve().await.expect("Retrieve after expiry should succeed.");

	assert_eq!(refreshed.expose(), "token-2");
	assert_eq!(cache.source().calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn store_replaces_token_and_cancels_previous_expiry() {
	let clock = ManualClock::new(datetime!(2025-01-01 00:00 UTC));
	let cache = build_cache(CountingSource::new(&clock, Duration::hours(1)), &clock);
	let short = AccessToken::expiring_in("short", clock.now(), Duration::minutes(3))
		.expect("Short token should build.");
	let long = AccessToken::expiring_in("long", clock.now(), Duration::hours(1))
		.expect("Long token should build.");

	cache.store(short).expect("Storing the short token should succeed.");
	cache.store(long).expect("Storing the long token should succeed.");
	// The short token's timer would have fired after one minute.
	sleep(StdDuration::from_secs(5 * 60)).await;

	let token = cache.retrieve().await.expect("Retrieve should hit the stored token.");

	assert_eq!(token.expose(), "long");
	assert_eq!(cache.source().calls(), 0);
	assert_eq!(cache.metrics().expirations(), 0);
	assert_eq!(cache.metrics().stores(), 2);
}

#[tokio::test(start_paused = true)]
async fn token_inside_margin_expires_after_minimum_delay() {
	let clock = ManualClock::new(datetime!(2025-01-01 00:00 UTC));
	let cache = build_cache(CountingSource::new(&clock, Duration::hours(1)), &clock);
	let token = AccessToken::expiring_in("brief", clock.now(), Duration::seconds(90))
		.expect("Brief token should build.");

	cache.store(token).expect("Storing should succeed.");
	sleep(StdDuration::from_millis(50)).await;

	assert_eq!(cache.current().map(|token| token.expose().to_owned()), Some("brief".into()));

	sleep(StdDuration::from_millis(60)).await;

	assert!(cache.current().is_none());
	assert_eq!(cache.metrics().expirations(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_cache_disarms_pending_expiry() {
	let clock = ManualClock::new(datetime!(2025-01-01 00:00 UTC));
	let cache = build_cache(CountingSource::new(&clock, Duration::hours(1)), &clock);
	let metrics = cache.metrics();

	cache.retrieve().await.expect("Retrieve should succeed.");
	drop(cache);
	sleep(StdDuration::from_secs(2 * 60 * 60)).await;

	assert_eq!(metrics.expirations(), 0);
}

#[tokio::test(start_paused = true)]
async fn queued_caller_refetches_when_the_fetched_token_is_already_gone() {
	let clock = ManualClock::new(datetime!(2025-01-01 00:00 UTC));
	let cache = Arc::new(
		TokenCache::new(LapsingSource { calls: AtomicUsize::new(0), clock: clock.clone() })
			.with_clock(Arc::new(clock.clone())),
	);
	let fetcher = tokio::spawn({
		let cache = cache.clone();

		async move { cache.retrieve().await }
	});

	tokio::task::yield_now().await;

	let queued = tokio::spawn({
		let cache = cache.clone();

		async move { cache.retrieve().await }
	});
	let first = fetcher
		.await
		.expect("Fetcher task should not panic.")
		.expect("The first fetch should succeed.");
	let second = queued
		.await
		.expect("Queued task should not panic.")
		.expect("The queued caller should fetch a live token.");

	assert_eq!(first.expose(), "token-1");
	assert_eq!(second.expose(), "token-2");
	assert!(!second.is_expired_at(clock.now()));
	assert_eq!(cache.source().calls.load(Ordering::SeqCst), 2);
	assert_eq!(cache.metrics().shared(), 0);
}
