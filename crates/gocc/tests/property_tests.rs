//! Property-based invariant tests for the bounded queue and the atomic
//! semaphore fallback, in the style of the teacher's own `property_tests.rs`.

use gocc::{AtomicSemaphore, BoundedQueue, RingBlockingQueue, Semaphore};
use proptest::prelude::*;

proptest! {
    /// `RingBlockingQueue::len()` never exceeds its configured capacity,
    /// no matter how offers and pulls interleave.
    #[test]
    fn ring_queue_len_never_exceeds_capacity(
        capacity in 1usize..8,
        offers in prop::collection::vec(prop::bool::ANY, 0..200),
    ) {
        let q: RingBlockingQueue<i32> = RingBlockingQueue::new(capacity);
        for (i, offer) in offers.into_iter().enumerate() {
            if offer {
                let _ = q.try_offer(i as i32);
            } else {
                let _ = q.try_pull();
            }
            prop_assert!(q.len() <= capacity);
        }
    }

    /// The atomic semaphore never grants more outstanding permits than its
    /// limit, tracked here by replaying a sequence of try_acquire/release
    /// calls against a plain counter.
    #[test]
    fn atomic_semaphore_outstanding_never_exceeds_limit(
        limit in 1u32..8,
        acquire in prop::collection::vec(prop::bool::ANY, 0..200),
    ) {
        let sem = AtomicSemaphore::new(limit);
        let mut outstanding: u32 = 0;
        for want_acquire in acquire {
            if want_acquire {
                if sem.try_acquire() {
                    outstanding += 1;
                }
            } else if outstanding > 0 {
                sem.release();
                outstanding -= 1;
            }
            prop_assert!(outstanding <= limit);
        }
    }
}
