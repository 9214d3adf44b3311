//! Id Generator
#[cfg(any(test, feature = "testing"))]
pub use increment::IncrementIdGenerator;

use crate::error::{TraceparentError, TraceparentResult};
use crate::trace::{SpanId, TraceId};
use rand::{rngs, Rng, SeedableRng};
use std::cell::RefCell;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::{NoContext, Timestamp, Uuid};

/// Interface for generating IDs
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// Generate a new `TraceId`
    fn new_trace_id(&self) -> TraceparentResult<TraceId>;

    /// Generate a new `SpanId`
    fn new_span_id(&self) -> SpanId;
}

/// Default [`IdGenerator`] implementation.
///
/// Trace ids are version 7 UUIDs: the leading 48 bits hold the Unix time in
/// milliseconds and the rest is random, so ids sort roughly by creation
/// time. The trace id is the UUID's 16 bytes, which is its textual form
/// without the hyphens. Span ids are random.
#[derive(Clone, Debug, Default)]
pub struct TimeOrderedIdGenerator {
    _private: (),
}

impl IdGenerator for TimeOrderedIdGenerator {
    fn new_trace_id(&self) -> TraceparentResult<TraceId> {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| TraceparentError::Generation(Box::new(err)))?;
        let secs = since_epoch.as_secs();
        let timestamp = Timestamp::from_unix(NoContext, secs, since_epoch.subsec_nanos());

        Ok(TraceId::from_bytes(Uuid::new_v7(timestamp).into_bytes()))
    }

    fn new_span_id(&self) -> SpanId {
        CURRENT_RNG.with(|rng| SpanId::from(rng.borrow_mut().random::<u64>()))
    }
}

/// [`IdGenerator`] using a random number generator for both trace and span
/// ids.
#[derive(Clone, Debug, Default)]
pub struct RandomIdGenerator {
    _private: (),
}

impl IdGenerator for RandomIdGenerator {
    fn new_trace_id(&self) -> TraceparentResult<TraceId> {
        let trace_id = CURRENT_RNG.with(|rng| rng.borrow_mut().random::<u128>());
        Ok(TraceId::from(trace_id))
    }

    fn new_span_id(&self) -> SpanId {
        CURRENT_RNG.with(|rng| SpanId::from(rng.borrow_mut().random::<u64>()))
    }
}

thread_local! {
    /// Store random number generator for each thread
    static CURRENT_RNG: RefCell<rngs::SmallRng> = RefCell::new(rngs::SmallRng::from_os_rng());
}

#[cfg(any(test, feature = "testing"))]
mod increment {
    use crate::error::TraceparentResult;
    use crate::id_generator::IdGenerator;
    use crate::trace::{SpanId, TraceId};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    /// [`IdGenerator`] implementation that increments a counter for each new ID. This helps produce
    /// predictable IDs for testing.
    #[derive(Clone, Debug)]
    pub struct IncrementIdGenerator(Arc<AtomicU64>);

    impl IncrementIdGenerator {
        /// Create a new [`IncrementIdGenerator`]
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl Default for IncrementIdGenerator {
        fn default() -> Self {
            Self(Arc::new(AtomicU64::new(1)))
        }
    }

    impl IdGenerator for IncrementIdGenerator {
        fn new_trace_id(&self) -> TraceparentResult<TraceId> {
            Ok(TraceId::from(self.0.fetch_add(1, Ordering::SeqCst) as u128))
        }

        fn new_span_id(&self) -> SpanId {
            SpanId::from(self.0.fetch_add(1, Ordering::SeqCst))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn time_ordered_trace_ids_are_uuid_v7() {
        let generator = TimeOrderedIdGenerator::default();
        let trace_id = generator.new_trace_id().unwrap();
        let uuid = Uuid::from_bytes(trace_id.to_bytes());

        assert_eq!(uuid.get_version_num(), 7);
        assert_eq!(uuid.simple().to_string(), trace_id.to_string());
        assert_eq!(
            uuid.hyphenated().to_string().replace('-', ""),
            trace_id.to_string()
        );
    }

    #[test]
    fn time_ordered_trace_ids_follow_the_clock() {
        let generator = TimeOrderedIdGenerator::default();
        let first = generator.new_trace_id().unwrap().to_bytes();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = generator.new_trace_id().unwrap().to_bytes();

        // The leading 48 bits are the millisecond timestamp.
        assert!(first[..6] < second[..6]);
    }

    #[test]
    fn generated_ids_are_distinct() {
        let generators: Vec<Box<dyn IdGenerator>> = vec![
            Box::<TimeOrderedIdGenerator>::default(),
            Box::<RandomIdGenerator>::default(),
        ];

        for generator in generators {
            let mut trace_ids = HashSet::new();
            let mut span_ids = HashSet::new();
            for _ in 0..1_000 {
                assert!(trace_ids.insert(generator.new_trace_id().unwrap()));
                assert!(span_ids.insert(generator.new_span_id()));
            }
        }
    }

    #[test]
    fn increment_generator_is_predictable() {
        let generator = IncrementIdGenerator::new();
        assert_eq!(generator.new_trace_id().unwrap(), TraceId::from(1_u128));
        assert_eq!(generator.new_span_id(), SpanId::from(2_u64));
        assert_eq!(
            generator.clone().new_trace_id().unwrap(),
            TraceId::from(3_u128)
        );
    }
}
