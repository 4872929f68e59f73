// self
use crate::obs::{CacheEvent, FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_jwt_bearer_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a cache transition via the global metrics recorder and tracing (when enabled).
pub fn record_cache_event(event: CacheEvent) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("oauth2_jwt_bearer_cache_total", "event" => event.as_str()).increment(1);
	}
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(event = event.as_str(), "token cache transition");
	}

	#[cfg(not(any(feature = "metrics", feature = "tracing")))]
	{
		let _ = event;
	}
}
