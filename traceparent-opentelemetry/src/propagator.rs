use crate::{ToSpanContext, ToTraceContext};
use opentelemetry::{
    propagation::{text_map_propagator::FieldIter, Extractor, Injector, TextMapPropagator},
    trace::{SpanContext, TraceContextExt},
    Context,
};
use std::sync::OnceLock;
use traceparent::{
    tp_debug, TraceparentCodec, TraceparentResult, TRACEPARENT_HEADER, TRACESTATE_HEADER,
};

// TODO Replace this with LazyLock once the minimum supported Rust version reaches 1.80.
static TRACE_CONTEXT_HEADER_FIELDS: OnceLock<[String; 2]> = OnceLock::new();

fn trace_context_header_fields() -> &'static [String; 2] {
    TRACE_CONTEXT_HEADER_FIELDS
        .get_or_init(|| [TRACEPARENT_HEADER.to_owned(), TRACESTATE_HEADER.to_owned()])
}

/// Propagates `SpanContext`s in [W3C TraceContext] format under the
/// `traceparent` and `tracestate` headers, using [`TraceparentCodec`] for
/// both directions.
///
/// Extraction is strict. A header that the codec rejects (bad format,
/// unsupported version, upper case ids, unparsable `tracestate`) or one that
/// carries an all-zero trace or span id leaves the context unchanged.
///
/// [W3C TraceContext]: https://www.w3.org/TR/trace-context/
#[derive(Clone, Debug, Default)]
pub struct TraceparentPropagator {
    codec: TraceparentCodec,
}

impl TraceparentPropagator {
    /// Create a new `TraceparentPropagator` with the default codec
    /// configuration.
    pub fn new() -> Self {
        TraceparentPropagator {
            codec: TraceparentCodec::new(),
        }
    }

    /// Create a new `TraceparentPropagator` using `codec`.
    pub fn with_codec(codec: TraceparentCodec) -> Self {
        TraceparentPropagator { codec }
    }

    /// Extract span context from w3c trace-context header.
    fn extract_span_context(&self, extractor: &dyn Extractor) -> TraceparentResult<SpanContext> {
        let traceparent = extractor.get(TRACEPARENT_HEADER).unwrap_or("");
        let tracestate = extractor.get(TRACESTATE_HEADER).unwrap_or("");

        let cx = self.codec.decode_with_state(traceparent, tracestate)?;
        Ok(cx.to_span_context())
    }
}

impl TextMapPropagator for TraceparentPropagator {
    /// Encodes the active `SpanContext` and injects it into the `Injector`.
    /// Invalid span contexts are not propagated.
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector) {
        let span = cx.span();
        let span_context = span.span_context();
        if span_context.is_valid() {
            let trace_context = span_context.to_trace_context();
            injector.set(TRACEPARENT_HEADER, self.codec.encode(&trace_context));
            injector.set(TRACESTATE_HEADER, span_context.trace_state().header());
        }
    }

    /// Decodes the `SpanContext` carried by the `Extractor` and attaches it
    /// to `cx` as a remote parent. If no valid `SpanContext` was found, `cx`
    /// is returned unchanged.
    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context {
        match self.extract_span_context(extractor) {
            Ok(span_context) if span_context.is_valid() => {
                cx.with_remote_span_context(span_context)
            }
            Ok(_) => {
                tp_debug!(
                    name: "TraceparentPropagator.ExtractFailed",
                    reason = "traceparent carries an all-zero trace or span id"
                );
                cx.clone()
            }
            Err(err) => {
                tp_debug!(
                    name: "TraceparentPropagator.ExtractFailed",
                    reason = format!("{err}")
                );
                cx.clone()
            }
        }
    }

    fn fields(&self) -> FieldIter<'_> {
        FieldIter::new(trace_context_header_fields())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::{SpanId, TraceFlags, TraceId, TraceState};
    use std::collections::HashMap;
    use std::str::FromStr;

    #[rustfmt::skip]
    fn extract_data() -> Vec<(&'static str, &'static str, SpanContext)> {
        vec![
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-00", "foo=bar", SpanContext::new(TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap(), SpanId::from_hex("00f067aa0ba902b7").unwrap(), TraceFlags::default(), true, TraceState::from_str("foo=bar").unwrap())),
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01", "foo=bar", SpanContext::new(TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap(), SpanId::from_hex("00f067aa0ba902b7").unwrap(), TraceFlags::SAMPLED, true, TraceState::from_str("foo=bar").unwrap())),
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01", "", SpanContext::new(TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap(), SpanId::from_hex("00f067aa0ba902b7").unwrap(), TraceFlags::SAMPLED, true, TraceState::NONE)),
        ]
    }

    fn extract(traceparent: &str, tracestate: &str) -> Context {
        let mut extractor = HashMap::new();
        extractor.insert(TRACEPARENT_HEADER.to_string(), traceparent.to_string());
        extractor.insert(TRACESTATE_HEADER.to_string(), tracestate.to_string());
        TraceparentPropagator::new().extract(&extractor)
    }

    #[test]
    fn extract_w3c() {
        for (traceparent, tracestate, expected_context) in extract_data() {
            assert_eq!(
                extract(traceparent, tracestate).span().span_context(),
                &expected_context
            )
        }
    }

    #[rustfmt::skip]
    fn extract_data_invalid() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("02-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01", "foo=bar",             "unsupported version"),
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7",    "foo=bar",             "missing flags"),
            ("00-AB000000000000000000000000000000-cd00000000000000-01", "foo=bar",             "upper case trace ID"),
            ("00-00000000000000000000000000000000-0000000000000000-01", "foo=bar",             "zero trace ID and span ID"),
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01", "foo=bar",             "zero span ID"),
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01", "key=value,malformed", "malformed tracestate"),
            ("",                                                        "",                    "missing headers"),
        ]
    }

    #[test]
    fn extract_w3c_reject_invalid() {
        for (traceparent, tracestate, reason) in extract_data_invalid() {
            assert_eq!(
                extract(traceparent, tracestate).span().span_context(),
                &SpanContext::empty_context(),
                "{reason}"
            )
        }
    }

    #[test]
    fn inject_w3c() {
        let propagator = TraceparentPropagator::new();
        for (traceparent, tracestate, span_context) in extract_data() {
            let mut injector = HashMap::new();
            propagator.inject_context(
                &Context::new().with_remote_span_context(span_context),
                &mut injector,
            );

            assert_eq!(
                injector.get(TRACEPARENT_HEADER).map(String::as_str),
                Some(traceparent)
            );
            assert_eq!(
                injector.get(TRACESTATE_HEADER).map(String::as_str),
                Some(tracestate)
            );
        }
    }

    #[test]
    fn inject_skips_invalid_span_context() {
        let propagator = TraceparentPropagator::new();
        let mut injector: HashMap<String, String> = HashMap::new();
        propagator.inject_context(&Context::new(), &mut injector);
        assert!(injector.is_empty());
    }

    #[test]
    fn fields_lists_both_headers() {
        let propagator = TraceparentPropagator::new();
        assert_eq!(
            propagator.fields().collect::<Vec<_>>(),
            vec![TRACEPARENT_HEADER, TRACESTATE_HEADER]
        );
    }
}
