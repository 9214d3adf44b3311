//! # W3C Traceparent Codec
//!
//! The `traceparent` header has four fields:
//!
//!    - version
//!    - trace-id
//!    - parent-id
//!    - trace-flags
//!
//! `traceparent: 00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01`
//!
//! See the [w3c trace-context docs] for more details.
//!
//! [w3c trace-context docs]: https://w3c.github.io/trace-context/
use crate::config::CodecConfig;
use crate::error::{TraceparentError, TraceparentResult};
use crate::tp_debug;
use crate::trace::{SpanId, TraceContext, TraceFlags, TraceId, Version};
use crate::trace_state::TraceState;
use std::sync::OnceLock;

/// HTTP header name carrying the encoded [`TraceContext`].
pub const TRACEPARENT_HEADER: &str = "traceparent";
/// HTTP header name carrying the companion [`TraceState`].
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Number of `-` separated fields in a `traceparent` header.
const TRACEPARENT_PARTS: usize = 4;
/// Width in hex digits of version, trace-id, parent-id and trace-flags.
const FIELD_WIDTHS: [usize; TRACEPARENT_PARTS] = [2, 32, 16, 2];

// TODO Replace this with LazyLock once the minimum supported Rust version reaches 1.80.
static DEFAULT_CODEC: OnceLock<TraceparentCodec> = OnceLock::new();

/// Codec built from [`CodecConfig::default`] on first use.
pub(crate) fn default_codec() -> &'static TraceparentCodec {
    DEFAULT_CODEC.get_or_init(TraceparentCodec::new)
}

/// Encodes and decodes [`TraceContext`]s in [W3C TraceContext] format.
///
/// Decoding is strict: the header must be exactly four `-` separated fields
/// of 2, 32, 16 and 2 lowercase hex digits, and the version must be one of
/// the configured [`CodecConfig::supported_versions`]. The version is checked
/// before the remaining fields are decoded, so an unknown future version is
/// reported as [`TraceparentError::InvalidVersion`] rather than as a corrupt
/// header.
///
/// [W3C TraceContext]: https://www.w3.org/TR/trace-context/
#[derive(Clone, Debug)]
pub struct TraceparentCodec {
    config: CodecConfig,
}

impl Default for TraceparentCodec {
    fn default() -> Self {
        TraceparentCodec::new()
    }
}

impl TraceparentCodec {
    /// Create a new `TraceparentCodec` using [`CodecConfig::default`].
    pub fn new() -> Self {
        TraceparentCodec::with_config(CodecConfig::default())
    }

    /// Create a new `TraceparentCodec` with the given configuration.
    pub fn with_config(config: CodecConfig) -> Self {
        TraceparentCodec { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Renders `cx` as a `traceparent` header value.
    ///
    /// The canonical form is 55 characters long; it never fails.
    pub fn encode(&self, cx: &TraceContext) -> String {
        format!(
            "{}-{}-{}-{}",
            cx.version(),
            cx.trace_id(),
            cx.span_id(),
            cx.trace_flags()
        )
    }

    /// Decodes a `traceparent` header value.
    ///
    /// The returned context is marked remote and carries an empty
    /// [`TraceState`].
    pub fn decode(&self, traceparent: &str) -> TraceparentResult<TraceContext> {
        self.decode_traceparent(traceparent)
            .map_err(|err| log_decode_failure(traceparent, err))
    }

    /// Decodes a `traceparent` header value together with its companion
    /// `tracestate` header.
    ///
    /// A `tracestate` that fails to parse fails the whole decode with
    /// [`TraceparentError::TraceStateInvalid`].
    pub fn decode_with_state(
        &self,
        traceparent: &str,
        tracestate: &str,
    ) -> TraceparentResult<TraceContext> {
        let cx = self.decode(traceparent)?;
        let trace_state = tracestate.parse::<TraceState>().map_err(|err| {
            tp_debug!(
                name: "Traceparent.TraceStateInvalid",
                tracestate = tracestate,
                reason = format!("{err}")
            );
            TraceparentError::from(err)
        })?;

        Ok(cx.with_trace_state(trace_state))
    }

    fn decode_traceparent(&self, traceparent: &str) -> TraceparentResult<TraceContext> {
        let parts = split_fields(traceparent)
            .ok_or_else(|| TraceparentError::InvalidFormat(traceparent.to_string()))?;
        let [version, trace_id, span_id, flags] = parts;

        let version = Version::from_hex(version)
            .ok()
            .filter(|v| self.config.supports(*v))
            .ok_or_else(|| TraceparentError::InvalidVersion(version.to_string()))?;

        let trace_id = TraceId::from_hex(trace_id).map_err(|source| {
            let value = trace_id.to_string();
            TraceparentError::TraceIdDecodeFailed { value, source }
        })?;

        let span_id = SpanId::from_hex(span_id).map_err(|source| {
            let value = span_id.to_string();
            TraceparentError::SpanIdDecodeFailed { value, source }
        })?;

        let trace_flags = TraceFlags::from_hex(flags).map_err(|source| {
            let value = flags.to_string();
            TraceparentError::FlagsDecodeFailed { value, source }
        })?;

        Ok(TraceContext::new(
            version,
            trace_id,
            span_id,
            trace_flags,
            true,
            TraceState::NONE,
        ))
    }
}

/// Splits a header into its four fields, checking field count, widths and
/// that every character is a hex digit of either case.
fn split_fields(traceparent: &str) -> Option<[&str; TRACEPARENT_PARTS]> {
    let mut parts = traceparent.split('-');
    let mut fields = [""; TRACEPARENT_PARTS];
    for (field, width) in fields.iter_mut().zip(FIELD_WIDTHS) {
        let part = parts.next()?;
        if part.len() != width || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        *field = part;
    }

    if parts.next().is_some() {
        return None;
    }

    Some(fields)
}

fn log_decode_failure(traceparent: &str, err: TraceparentError) -> TraceparentError {
    tp_debug!(
        name: "Traceparent.DecodeFailed",
        traceparent = traceparent,
        reason = format!("{err}")
    );
    err
}
