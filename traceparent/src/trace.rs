//! Identifier model and the [`TraceContext`] value.
use crate::codec::default_codec;
use crate::error::{ParseIdError, TraceparentError, TraceparentResult};
use crate::id_generator::{IdGenerator, TimeOrderedIdGenerator};
use crate::tp_warn;
use crate::trace_state::TraceState;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::str::FromStr;

/// Decodes exactly `2 * N` lowercase hex digits into `N` bytes.
pub(crate) fn decode_lower_hex<const N: usize>(hex: &str) -> Result<[u8; N], ParseIdError> {
    if hex.len() != N * 2 {
        return Err(ParseIdError::InvalidLength {
            expected: N * 2,
            found: hex.len(),
        });
    }
    if let Some((index, c)) = hex
        .char_indices()
        .find(|(_, c)| !matches!(c, '0'..='9' | 'a'..='f'))
    {
        return Err(ParseIdError::InvalidCharacter { c, index });
    }

    Ok(const_hex::decode_to_array::<_, N>(hex)?)
}

/// Version of the `traceparent` header format.
///
/// Only [`Version::V00`] is understood by default; other versions can be
/// accepted through [`CodecConfig`](crate::CodecConfig). `ff` is never a
/// valid version.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version(u8);

impl Version {
    /// Version `00`, the current W3C Trace Context version.
    pub const V00: Version = Version(0x00);

    /// Version `ff`, forbidden by the W3C specification.
    pub const INVALID: Version = Version(0xff);

    /// Construct a version from its numeric tag.
    pub const fn new(version: u8) -> Self {
        Version(version)
    }

    /// Parses the two lowercase hex digit form of a version.
    pub fn from_hex(hex: &str) -> Result<Self, ParseIdError> {
        decode_lower_hex::<1>(hex).map(|[b]| Version(b))
    }

    /// Returns the version tag as a `u8`.
    pub fn to_u8(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.0)
    }
}

/// Flags that can be set on a [`TraceContext`].
///
/// The current version of the specification only defines a single flag,
/// [`TraceFlags::SAMPLED`]. Other bits are kept as received so that a
/// decoded header re-encodes byte for byte. See the W3C TraceContext
/// specification's [trace-flags] section for more details.
///
/// [trace-flags]: https://www.w3.org/TR/trace-context/#trace-flags
#[derive(Clone, Debug, Default, PartialEq, Eq, Copy, Hash)]
pub struct TraceFlags(u8);

impl TraceFlags {
    /// Trace flags with the `sampled` flag set to `0`.
    pub const NOT_SAMPLED: TraceFlags = TraceFlags(0x00);

    /// Trace flags with the `sampled` flag set to `1`.
    ///
    /// See the `sampled` section of the [W3C TraceContext specification] for details.
    ///
    /// [W3C TraceContext specification]: https://www.w3.org/TR/trace-context/#sampled-flag
    pub const SAMPLED: TraceFlags = TraceFlags(0x01);

    /// Construct new trace flags
    pub const fn new(flags: u8) -> Self {
        TraceFlags(flags)
    }

    /// Parses the two lowercase hex digit form of the flags.
    pub fn from_hex(hex: &str) -> Result<Self, ParseIdError> {
        decode_lower_hex::<1>(hex).map(|[b]| TraceFlags(b))
    }

    /// Returns `true` if the `sampled` flag is set
    pub fn is_sampled(&self) -> bool {
        (*self & TraceFlags::SAMPLED) == TraceFlags::SAMPLED
    }

    /// Returns copy of the current flags with the `sampled` flag set.
    pub fn with_sampled(&self, sampled: bool) -> Self {
        if sampled {
            *self | TraceFlags::SAMPLED
        } else {
            *self & !TraceFlags::SAMPLED
        }
    }

    /// Returns the flags as a `u8`
    pub fn to_u8(self) -> u8 {
        self.0
    }
}

impl BitAnd for TraceFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for TraceFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl Not for TraceFlags {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

impl fmt::Display for TraceFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.0)
    }
}

/// A 16-byte value which identifies a given trace.
///
/// The id is valid if it contains at least one non-zero byte.
#[derive(Clone, PartialEq, Eq, Copy, Hash)]
pub struct TraceId([u8; 16]);

impl TraceId {
    /// Invalid trace id
    pub const INVALID: TraceId = TraceId([0; 16]);

    /// Create a trace id from its representation as a byte array.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        TraceId(bytes)
    }

    /// Return the representation of this trace id as a byte array.
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }

    /// Converts exactly 32 lowercase hex digits to a trace id.
    ///
    /// # Examples
    ///
    /// ```
    /// use traceparent::TraceId;
    ///
    /// assert!(TraceId::from_hex("58406520a006649127e371903a2de979").is_ok());
    ///
    /// assert!(TraceId::from_hex("42").is_err());
    /// assert!(TraceId::from_hex("58406520A006649127E371903A2DE979").is_err());
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self, ParseIdError> {
        decode_lower_hex(hex).map(TraceId)
    }
}

impl From<u128> for TraceId {
    fn from(value: u128) -> Self {
        TraceId(value.to_be_bytes())
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&const_hex::encode(self.0))
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&const_hex::encode(self.0))
    }
}

/// An 8-byte value which identifies a given span.
///
/// The id is valid if it contains at least one non-zero byte.
/// [`SpanId::INVALID`] doubles as the "no parent yet" sentinel of a freshly
/// started trace.
#[derive(Clone, PartialEq, Eq, Copy, Hash)]
pub struct SpanId([u8; 8]);

impl SpanId {
    /// Invalid span id
    pub const INVALID: SpanId = SpanId([0; 8]);

    /// Create a span id from its representation as a byte array.
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        SpanId(bytes)
    }

    /// Return the representation of this span id as a byte array.
    pub const fn to_bytes(self) -> [u8; 8] {
        self.0
    }

    /// Converts exactly 16 lowercase hex digits to a span id.
    ///
    /// # Examples
    ///
    /// ```
    /// use traceparent::SpanId;
    ///
    /// assert!(SpanId::from_hex("58406520a0066491").is_ok());
    ///
    /// assert!(SpanId::from_hex("not_hex").is_err());
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self, ParseIdError> {
        decode_lower_hex(hex).map(SpanId)
    }
}

impl From<u64> for SpanId {
    fn from(value: u64) -> Self {
        SpanId(value.to_be_bytes())
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&const_hex::encode(self.0))
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&const_hex::encode(self.0))
    }
}

/// The fields carried by a `traceparent` header, plus the companion
/// `tracestate`.
///
/// A `TraceContext` is immutable. Contexts are obtained by decoding an
/// inbound header ([`TraceparentCodec::decode`]), by starting a new trace
/// ([`TraceContext::new_trace`]), or by deriving from an existing context
/// ([`TraceContext::with_new_parent_id`]).
///
/// Its [`Display`](fmt::Display) output is the canonical header value and
/// [`FromStr`] decodes with the default codec.
///
/// Equality compares every field, including [`TraceContext::is_remote`] and
/// the [`TraceState`]. A decoded context is always remote and carries an
/// empty trace state, so `decode(encode(cx)) == cx` only holds for remote
/// contexts without a trace state. A context from
/// [`TraceContext::new_trace`] is local and does not compare equal to its
/// own decoded header, although every header field does.
///
/// `TraceContext` is `Send + Sync` and can be shared across threads.
///
/// [`TraceparentCodec::decode`]: crate::TraceparentCodec::decode
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TraceContext {
    version: Version,
    trace_id: TraceId,
    span_id: SpanId,
    trace_flags: TraceFlags,
    trace_state: TraceState,
    is_remote: bool,
}

impl TraceContext {
    /// Construct a new `TraceContext` from its parts.
    pub fn new(
        version: Version,
        trace_id: TraceId,
        span_id: SpanId,
        trace_flags: TraceFlags,
        is_remote: bool,
        trace_state: TraceState,
    ) -> Self {
        TraceContext {
            version,
            trace_id,
            span_id,
            trace_flags,
            trace_state,
            is_remote,
        }
    }

    /// Starts a new sampled trace with a time-ordered trace id.
    ///
    /// The parent id is [`SpanId::INVALID`] so the first span created under
    /// this context can tell it has no real parent yet.
    pub fn new_trace() -> TraceparentResult<Self> {
        Self::new_trace_with(&TimeOrderedIdGenerator::default())
    }

    /// Starts a new sampled trace, taking the trace id from `id_generator`.
    ///
    /// Fails with [`TraceparentError::Generation`] if the generator fails or
    /// hands out the all-zero trace id.
    pub fn new_trace_with(id_generator: &dyn IdGenerator) -> TraceparentResult<Self> {
        let trace_id = id_generator
            .new_trace_id()
            .and_then(|trace_id| {
                if trace_id == TraceId::INVALID {
                    Err(TraceparentError::Generation(
                        "id generator returned the invalid trace ID".into(),
                    ))
                } else {
                    Ok(trace_id)
                }
            })
            .map_err(|err| {
                tp_warn!(
                    name: "Traceparent.GenerationFailed",
                    error = format!("{err}")
                );
                err
            })?;

        Ok(TraceContext {
            version: Version::V00,
            trace_id,
            span_id: SpanId::INVALID,
            trace_flags: TraceFlags::SAMPLED,
            trace_state: TraceState::NONE,
            is_remote: false,
        })
    }

    /// Returns a copy of this context with the parent id replaced.
    ///
    /// `span_id` must be exactly 16 lowercase hex digits, otherwise
    /// [`TraceparentError::InvalidSpanIdFormat`] is returned. `self` is left
    /// untouched either way.
    ///
    /// ```
    /// use traceparent::TraceContext;
    ///
    /// let cx: TraceContext = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"
    ///     .parse()
    ///     .unwrap();
    /// let child = cx.with_new_parent_id("b7ad6b7169203331").unwrap();
    /// assert_eq!(child.trace_id(), cx.trace_id());
    /// assert!(cx.with_new_parent_id("B7AD6B7169203331").is_err());
    /// ```
    pub fn with_new_parent_id(&self, span_id: &str) -> TraceparentResult<Self> {
        let span_id = SpanId::from_hex(span_id)
            .map_err(|_| TraceparentError::InvalidSpanIdFormat(span_id.to_string()))?;

        Ok(self.with_parent_span_id(span_id))
    }

    /// Returns a copy of this context with the parent id replaced by an
    /// already typed [`SpanId`].
    pub fn with_parent_span_id(&self, span_id: SpanId) -> Self {
        TraceContext {
            span_id,
            ..self.clone()
        }
    }

    /// Returns a copy of this context carrying `trace_state`.
    pub fn with_trace_state(&self, trace_state: TraceState) -> Self {
        TraceContext {
            trace_state,
            ..self.clone()
        }
    }

    /// The header format [`Version`] of this context.
    pub fn version(&self) -> Version {
        self.version
    }

    /// The [`TraceId`] for this context.
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// The [`SpanId`] of the propagated parent span.
    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    /// Returns details about the trace.
    pub fn trace_flags(&self) -> TraceFlags {
        self.trace_flags
    }

    /// A reference to the context's [`TraceState`].
    pub fn trace_state(&self) -> &TraceState {
        &self.trace_state
    }

    /// Returns `true` if the context was decoded from an inbound header.
    pub fn is_remote(&self) -> bool {
        self.is_remote
    }

    /// Returns `true` if the `sampled` trace flag is set.
    pub fn is_sampled(&self) -> bool {
        self.trace_flags.is_sampled()
    }

    /// Returns `true` if both the trace id and the span id are non-zero.
    ///
    /// A context returned by [`TraceContext::new_trace`] is not valid until a
    /// parent id has been assigned.
    pub fn is_valid(&self) -> bool {
        self.trace_id != TraceId::INVALID && self.span_id != SpanId::INVALID
    }
}

impl fmt::Display for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.version, self.trace_id, self.span_id, self.trace_flags
        )
    }
}

impl FromStr for TraceContext {
    type Err = TraceparentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        default_codec().decode(s)
    }
}
