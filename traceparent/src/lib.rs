//! Encoding and decoding of the [W3C Trace Context] `traceparent` header.
//!
//! A `traceparent` header identifies the incoming request in a tracing
//! system. It has four fixed-width, hyphen separated fields:
//!
//! ```text
//! traceparent: 00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01
//!              |  |                                |                |
//!              |  trace-id (16 bytes)              parent-id        trace-flags
//!              version                             (8 bytes)        (1 byte)
//! ```
//!
//! This crate provides:
//!
//! - [`TraceContext`], an immutable value holding the decoded fields, backed
//!   by fixed-size byte arrays ([`TraceId`], [`SpanId`]) so that a field of the
//!   wrong width cannot be represented.
//! - [`TraceparentCodec`], which validates and decodes header strings and
//!   renders contexts back into their canonical form. The set of accepted
//!   versions is configured through [`CodecConfig`].
//! - [`IdGenerator`] implementations for starting new traces, with
//!   time-ordered (UUIDv7) trace ids by default.
//!
//! # Example
//!
//! ```
//! use traceparent::{TraceContext, TraceparentCodec};
//!
//! let codec = TraceparentCodec::new();
//! let cx = codec
//!     .decode("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01")
//!     .unwrap();
//! assert!(cx.is_sampled());
//! assert!(cx.is_remote());
//!
//! // Continue the trace with a new parent span.
//! let child = cx.with_new_parent_id("b7ad6b7169203331").unwrap();
//! assert_eq!(
//!     codec.encode(&child),
//!     "00-4bf92f3577b34da6a3ce929d0e0e4736-b7ad6b7169203331-01"
//! );
//!
//! // Or start a brand new trace.
//! let fresh = TraceContext::new_trace().unwrap();
//! assert!(fresh.is_sampled());
//! ```
//!
//! # Crate Feature Flags
//!
//! * `internal-logs` (default): emit internal diagnostics through [`tracing`].
//! * `testing`: exposes [`IncrementIdGenerator`] for deterministic ids.
//!
//! [W3C Trace Context]: https://www.w3.org/TR/trace-context/
//! [`tracing`]: https://crates.io/crates/tracing
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

#[doc(hidden)]
pub mod internal_logging;

pub mod codec;
pub mod config;
pub mod error;
pub mod id_generator;
pub mod trace;
pub mod trace_state;

pub use codec::{TraceparentCodec, TRACEPARENT_HEADER, TRACESTATE_HEADER};
pub use config::CodecConfig;
pub use error::{ParseIdError, TraceparentError, TraceparentResult};
pub use id_generator::{IdGenerator, RandomIdGenerator, TimeOrderedIdGenerator};
pub use trace::{SpanId, TraceContext, TraceFlags, TraceId, Version};
pub use trace_state::{TraceState, TraceStateError};

#[cfg(any(test, feature = "testing"))]
pub use id_generator::IncrementIdGenerator;

#[cfg(feature = "internal-logs")]
#[doc(hidden)]
pub mod _private {
    pub use tracing::{debug, warn}; // Re-export for the internal logging macros
}
