//! Process-wide monotonic node-id allocation.
//!
//! A small `Clone` wrapper around immutable identity state (the machine id,
//! fixed at startup), handed out to every worker that needs an id. The
//! mutable counter lives behind an atomic rather than a lock, since callers
//! never need more than a fetch-and-increment.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

/// Bits reserved for the per-millisecond sequence counter. Leaves room for a
/// 10-bit machine id and a 41-bit timestamp, snowflake-style, while staying
/// within the 63-bit positive range.
const SEQUENCE_BITS: u32 = 12;
const MACHINE_ID_BITS: u32 = 10;
const SEQUENCE_MASK: i64 = (1 << SEQUENCE_BITS) - 1;
const MACHINE_ID_MASK: i64 = (1 << MACHINE_ID_BITS) - 1;

/// A node's machine id contributes only entropy, not correctness; any value
/// that differs across processes sharing an output directory is enough to
/// avoid id collisions in multi-process deployments.
fn default_machine_id() -> i64 {
    let pid = std::process::id() as i64;
    pid & MACHINE_ID_MASK
}

/// Process-wide monotonic 63-bit id generator, safe under concurrent callers.
/// `Clone` is cheap: every clone shares the same atomic counter.
#[derive(Clone, Debug)]
pub struct IdAllocator {
    machine_id: i64,
    sequence: Arc<AtomicI64>,
    last_millis: Arc<AtomicI64>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::with_machine_id(default_machine_id())
    }

    pub fn with_machine_id(machine_id: i64) -> Self {
        Self {
            machine_id: machine_id & MACHINE_ID_MASK,
            sequence: Arc::new(AtomicI64::new(0)),
            last_millis: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Issue a fresh, strictly-positive 63-bit id. Never blocks.
    pub fn next_id(&self) -> i64 {
        let millis = now_millis();
        let last = self.last_millis.swap(millis, Ordering::AcqRel);
        let sequence = if last == millis {
            self.sequence.fetch_add(1, Ordering::AcqRel) & SEQUENCE_MASK
        } else {
            self.sequence.store(0, Ordering::Release);
            0
        };
        ((millis << (MACHINE_ID_BITS + SEQUENCE_BITS))
            | (self.machine_id << SEQUENCE_BITS)
            | sequence)
            & i64::MAX
    }

    /// Fresh UUID v4, one per node.
    pub fn next_uuid(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::thread;

    use super::*;

    #[test]
    fn ids_are_unique_within_a_process() {
        let allocator = IdAllocator::new();
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(allocator.next_id()), "duplicate id allocated");
        }
    }

    #[test]
    fn ids_are_unique_across_threads() {
        let allocator = IdAllocator::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let allocator = allocator.clone();
                thread::spawn(move || {
                    (0..2_000).map(move |_| allocator.next_id()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            for id in handle.join().expect("worker thread panicked") {
                assert!(all.insert(id), "duplicate id across threads");
            }
        }
    }

    #[test]
    fn ids_are_always_non_negative() {
        let allocator = IdAllocator::new();
        for _ in 0..1_000 {
            assert!(allocator.next_id() >= 0);
        }
    }
}
