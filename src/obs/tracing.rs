// self
use crate::{_prelude::*, obs::FlowKind, provider::IdentitySource};

/// Future returned by [`FlowSpan::instrument`]; a plain passthrough when tracing is disabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`FlowSpan::instrument`]; a plain passthrough when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Span wrapping one provider call.
///
/// Carries the flow name and the target resource. The `source` field starts empty and is filled
/// by [`record_endpoint_selection`] once a fetch has picked its protocol. Credentials, tokens and
/// the identity header never become span fields.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span for `kind` against `resource`.
	pub fn new(kind: FlowKind, resource: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self {
				span: tracing::info_span!(
					"managed_identity.flow",
					flow = kind.as_str(),
					resource,
					source = tracing::field::Empty,
				),
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, resource);

			Self {}
		}
	}

	/// Runs `fut` inside the span; no guard is held across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			tracing::Instrument::instrument(fut, self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Fills the `source` field of the current flow span and logs the chosen protocol.
pub fn record_endpoint_selection(source: IdentitySource) {
	#[cfg(feature = "tracing")]
	{
		tracing::Span::current().record("source", source.as_str());
		tracing::debug!(source = source.as_str(), "managed identity endpoint selected");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = source;
	}
}
