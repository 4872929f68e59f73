//! Optional observability helpers for exchanges and the token cache.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_jwt_bearer.flow` with the `flow`
//!   and `stage` (call site) fields, a `warn` event when a flow fails, and `debug` events for
//!   cache transitions.
//! - Enable `metrics` to increment the `oauth2_jwt_bearer_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`, and the
//!   `oauth2_jwt_bearer_cache_total` counter labeled by `event`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Assertion signing plus token endpoint exchange.
	Exchange,
	/// Cache lookup that may trigger an exchange.
	Retrieve,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Exchange => "jwt_bearer_exchange",
			FlowKind::Retrieve => "cache_retrieve",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Token cache state transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheEvent {
	/// A valid token was returned without fetching.
	Hit,
	/// The caller became the fetch leader.
	Fetch,
	/// The caller reused the outcome of a fetch it waited on.
	Shared,
	/// A token was installed and its expiry scheduled.
	Store,
	/// The expiry timer cleared the token.
	Expire,
}
impl CacheEvent {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheEvent::Hit => "hit",
			CacheEvent::Fetch => "fetch",
			CacheEvent::Shared => "shared",
			CacheEvent::Store => "store",
			CacheEvent::Expire => "expire",
		}
	}
}
impl Display for CacheEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
