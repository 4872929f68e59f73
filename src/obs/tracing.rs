// self
use crate::{
	_prelude::*,
	obs::{self, FlowKind, FlowOutcome},
};

/// Future type produced by [`FlowSpan::instrument`]; a passthrough when tracing is disabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future type produced by [`FlowSpan::instrument`]; a passthrough when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Span around one exchange or cache lookup.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	kind: FlowKind,
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span for `kind`, tagged with the call-site `stage`.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("oauth2_jwt_bearer.flow", flow = kind.as_str(), stage);

			Self { kind, span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self { kind }
		}
	}

	/// Operation this span covers.
	pub fn kind(&self) -> FlowKind {
		self.kind
	}

	/// Instruments `fut` without holding a span guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Runs `fut` inside the span and records its attempt and outcome.
	pub async fn observe<T, E, Fut>(self, fut: Fut) -> Result<T, E>
	where
		E: Display,
		Fut: Future<Output = Result<T, E>>,
	{
		obs::record_flow_outcome(self.kind, FlowOutcome::Attempt);

		let result = self.instrument(fut).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(self.kind, FlowOutcome::Success),
			Err(e) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(parent: &self.span, error = %e, "flow failed");
				#[cfg(not(feature = "tracing"))]
				let _ = e;

				obs::record_flow_outcome(self.kind, FlowOutcome::Failure);
			},
		}

		result
	}
}
