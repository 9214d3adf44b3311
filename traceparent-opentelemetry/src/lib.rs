//! [OpenTelemetry] integration for the [`traceparent`] codec.
//!
//! The `traceparent` crate has its own [`TraceContext`] type and knows
//! nothing about any tracing library. This crate sits at the boundary:
//!
//! - [`ToSpanContext`] and [`ToTraceContext`] convert between
//!   [`TraceContext`] and OpenTelemetry's [`SpanContext`].
//! - [`TraceparentPropagator`] is a [`TextMapPropagator`] that reads and
//!   writes the `traceparent` and `tracestate` headers through
//!   [`TraceparentCodec`](traceparent::TraceparentCodec), so that header
//!   validation is identical on both sides.
//!
//! ```
//! use opentelemetry::propagation::TextMapPropagator;
//! use opentelemetry::trace::TraceContextExt;
//! use std::collections::HashMap;
//! use traceparent_opentelemetry::TraceparentPropagator;
//!
//! let propagator = TraceparentPropagator::new();
//! let mut headers = HashMap::new();
//! headers.insert(
//!     "traceparent".to_string(),
//!     "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01".to_string(),
//! );
//!
//! let cx = propagator.extract(&headers);
//! assert!(cx.span().span_context().is_remote());
//! ```
//!
//! [OpenTelemetry]: https://opentelemetry.io/
//! [`TextMapPropagator`]: opentelemetry::propagation::TextMapPropagator
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![cfg_attr(
    docsrs,
    feature(doc_cfg, doc_auto_cfg),
    deny(rustdoc::broken_intra_doc_links)
)]

mod propagator;

pub use propagator::TraceparentPropagator;

use opentelemetry::trace::{self as otel, SpanContext};
use std::str::FromStr;
use traceparent::{SpanId, TraceContext, TraceFlags, TraceId, TraceState, Version};

/// Conversion of a [`TraceContext`] into an OpenTelemetry [`SpanContext`].
pub trait ToSpanContext {
    /// Build the equivalent [`SpanContext`].
    ///
    /// The header version is dropped; OpenTelemetry only models version `00`.
    fn to_span_context(&self) -> SpanContext;
}

impl ToSpanContext for TraceContext {
    fn to_span_context(&self) -> SpanContext {
        let trace_state = if self.trace_state().is_empty() {
            otel::TraceState::NONE
        } else {
            let header = self.trace_state().header();
            otel::TraceState::from_str(&header).unwrap_or_default()
        };

        SpanContext::new(
            otel::TraceId::from_bytes(self.trace_id().to_bytes()),
            otel::SpanId::from_bytes(self.span_id().to_bytes()),
            otel::TraceFlags::new(self.trace_flags().to_u8()),
            self.is_remote(),
            trace_state,
        )
    }
}

/// Conversion of an OpenTelemetry [`SpanContext`] into a [`TraceContext`].
pub trait ToTraceContext {
    /// Build the equivalent version `00` [`TraceContext`].
    ///
    /// A trace state the codec's grammar rejects is replaced by an empty one.
    fn to_trace_context(&self) -> TraceContext;
}

impl ToTraceContext for SpanContext {
    fn to_trace_context(&self) -> TraceContext {
        let header = self.trace_state().header();
        TraceContext::new(
            Version::V00,
            TraceId::from_bytes(self.trace_id().to_bytes()),
            SpanId::from_bytes(self.span_id().to_bytes()),
            TraceFlags::new(self.trace_flags().to_u8()),
            self.is_remote(),
            TraceState::from_str(&header).unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    fn conversion_data() -> Vec<(TraceContext, SpanContext)> {
        vec![
            (
                TraceContext::new(Version::V00, TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736_u128), SpanId::from(0x00f0_67aa_0ba9_02b7_u64), TraceFlags::SAMPLED, true, TraceState::from_str("foo=bar").unwrap()),
                SpanContext::new(otel::TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap(), otel::SpanId::from_hex("00f067aa0ba902b7").unwrap(), otel::TraceFlags::SAMPLED, true, otel::TraceState::from_str("foo=bar").unwrap()),
            ),
            (
                TraceContext::new(Version::V00, TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736_u128), SpanId::from(0x00f0_67aa_0ba9_02b7_u64), TraceFlags::NOT_SAMPLED, false, TraceState::NONE),
                SpanContext::new(otel::TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap(), otel::SpanId::from_hex("00f067aa0ba902b7").unwrap(), otel::TraceFlags::NOT_SAMPLED, false, otel::TraceState::NONE),
            ),
        ]
    }

    #[test]
    fn converts_both_ways() {
        for (trace_context, span_context) in conversion_data() {
            assert_eq!(trace_context.to_span_context(), span_context);
            assert_eq!(span_context.to_trace_context(), trace_context);
        }
    }

    #[test]
    fn new_trace_converts_to_invalid_span_context() {
        let cx = TraceContext::new_trace().unwrap();
        let span_context = cx.to_span_context();

        assert_eq!(span_context.span_id(), otel::SpanId::INVALID);
        assert_eq!(span_context.trace_id().to_bytes(), cx.trace_id().to_bytes());
        assert!(span_context.is_sampled());
        assert!(!span_context.is_valid());
    }
}
