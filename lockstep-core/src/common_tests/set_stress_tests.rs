//! Common stress tests for ConcurrentSet implementations.
//!
//! These tests verify concurrent correctness under high contention.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use crate::data_structures::ConcurrentSet;

/// Test concurrent add of the same value - exactly one should succeed
pub fn test_concurrent_add_same_value<C>()
where
    C: ConcurrentSet<i32> + Default + Send + Sync + 'static,
{
    let set = Arc::new(C::default());
    let num_threads = 64;
    let test_value = 42;

    let success_count = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let set = Arc::clone(&set);
            let success = Arc::clone(&success_count);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                if set.add(test_value) {
                    success.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        success_count.load(Ordering::Relaxed),
        1,
        "Exactly one thread should successfully add the value"
    );
    assert!(set.contains(&test_value));
    assert_eq!(set.scan_keys().len(), 1);
}

/// Test concurrent remove of the same value - exactly one should succeed
pub fn test_concurrent_remove_same_value<C>()
where
    C: ConcurrentSet<i32> + Default + Send + Sync + 'static,
{
    let set = Arc::new(C::default());
    let num_threads = 64;
    let test_value = 42;

    set.add(test_value);

    let success_count = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let set = Arc::clone(&set);
            let success = Arc::clone(&success_count);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                if set.remove(&test_value) {
                    success.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        success_count.load(Ordering::Relaxed),
        1,
        "Exactly one thread should successfully remove the value"
    );
    assert!(!set.contains(&test_value), "Value should be gone");
}

/// Test linearizability - operations appear to take effect atomically
pub fn test_linearizability<C>()
where
    C: ConcurrentSet<i32> + Default + Send + Sync + 'static,
{
    let set = Arc::new(C::default());
    let num_threads = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    let num_ops = 2000;

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let set = Arc::clone(&set);
            thread::spawn(move || {
                for i in 0..num_ops {
                    let key = (t * num_ops + i) as i32;

                    assert!(set.add(key), "Failed to add unique key {}", key);
                    assert!(set.contains(&key), "Key {} not found after add", key);
                    assert!(set.remove(&key), "Failed to remove existing key {}", key);
                    assert!(!set.contains(&key), "Key {} found after remove", key);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(set.scan_keys().is_empty());
}

/// Test extreme contention on a single key
pub fn test_extreme_contention_single_key<C>()
where
    C: ConcurrentSet<i32> + Default + Send + Sync + 'static,
{
    let set = Arc::new(C::default());
    let num_threads = 32;
    let ops_per_thread = 1000;
    let the_key = 42;

    let successful_adds = Arc::new(AtomicUsize::new(0));
    let successful_removes = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let set = Arc::clone(&set);
            let adds = Arc::clone(&successful_adds);
            let removes = Arc::clone(&successful_removes);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();

                for _ in 0..ops_per_thread {
                    if set.add(the_key) {
                        adds.fetch_add(1, Ordering::Relaxed);

                        // Nobody else can add until this remove succeeds.
                        if set.remove(&the_key) {
                            removes.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let total_adds = successful_adds.load(Ordering::Relaxed);
    let total_removes = successful_removes.load(Ordering::Relaxed);

    assert!(total_adds > 0);
    assert_eq!(total_removes, total_adds);
    assert!(!set.contains(&the_key));
}

/// A reader that sees an element gone never sees it again once removal is
/// the only operation on it
pub fn test_remove_contains_race<C>()
where
    C: ConcurrentSet<i32> + Default + Send + Sync + 'static,
{
    let set = Arc::new(C::default());
    let num_values = 500;
    for i in 0..num_values {
        set.add(i);
    }

    let barrier = Arc::new(Barrier::new(5));
    let mut handles = vec![];

    let remover_set = Arc::clone(&set);
    let remover_barrier = Arc::clone(&barrier);
    handles.push(thread::spawn(move || {
        remover_barrier.wait();
        for i in 0..num_values {
            assert!(remover_set.remove(&i));
        }
    }));

    for _ in 0..4 {
        let set = Arc::clone(&set);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            let mut gone = vec![false; num_values as usize];
            barrier.wait();
            for _ in 0..20 {
                for i in 0..num_values {
                    let present = set.contains(&i);
                    if gone[i as usize] {
                        assert!(!present, "Key {} reappeared after removal", i);
                    }
                    gone[i as usize] = !present;
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(set.scan_keys().is_empty());
}

/// Mixed operations on an overlapping range keep the chain sorted and in
/// agreement with contains
pub fn test_mixed_operations_keep_invariants<C>()
where
    C: ConcurrentSet<i32> + Default + Send + Sync + 'static,
{
    let set = Arc::new(C::default());
    let num_threads = 16;
    let range = 256;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let set = Arc::clone(&set);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut value = t as i32;
                for i in 0..5000 {
                    // Cheap LCG keeps threads on different values.
                    value = value.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                    let key = value.rem_euclid(range);
                    match i % 3 {
                        0 => {
                            set.add(key);
                        }
                        1 => {
                            set.remove(&key);
                        }
                        _ => {
                            set.contains(&key);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let keys = set.scan_keys();
    for pair in keys.windows(2) {
        assert!(pair[0] < pair[1], "keys out of order: {:?}", pair);
    }
    let present = (0..range).filter(|i| set.contains(i)).count();
    assert_eq!(present, keys.len());
}

/// Test concurrent contains operations during modifications
pub fn test_contains_during_modifications<C>()
where
    C: ConcurrentSet<i32> + Default + Send + Sync + 'static,
{
    let set = Arc::new(C::default());
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stable_misses = Arc::new(AtomicUsize::new(0));

    // Even numbers are never touched by the modifiers.
    for i in 0..200 {
        set.add(i * 2);
    }

    let mut handles = vec![];

    for t in 0..4 {
        let set = Arc::clone(&set);
        let stop = Arc::clone(&stop_flag);
        handles.push(thread::spawn(move || {
            let mut i = 0;
            while !stop.load(Ordering::Relaxed) {
                let val = (t * 100 + i % 100) * 2 + 1;
                if i % 2 == 0 {
                    set.add(val);
                } else {
                    set.remove(&val);
                }
                i += 1;
            }
        }));
    }

    for _ in 0..4 {
        let set = Arc::clone(&set);
        let stop = Arc::clone(&stop_flag);
        let misses = Arc::clone(&stable_misses);
        handles.push(thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                for i in 0..200 {
                    if !set.contains(&(i * 2)) {
                        misses.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        }));
    }

    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(500) {
        thread::sleep(Duration::from_millis(10));
    }
    stop_flag.store(true, Ordering::Relaxed);

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        stable_misses.load(Ordering::Relaxed),
        0,
        "Untouched elements must always be found"
    );
}

/// Test memory ordering between producer and consumer
pub fn test_memory_ordering<C>()
where
    C: ConcurrentSet<i32> + Default + Send + Sync + 'static,
{
    let set = Arc::new(C::default());
    let data = Arc::new(AtomicUsize::new(0));
    let flag = Arc::new(AtomicBool::new(false));

    let producer_set = Arc::clone(&set);
    let producer_data = Arc::clone(&data);
    let producer_flag = Arc::clone(&flag);

    let producer = thread::spawn(move || {
        producer_data.store(42, Ordering::Release);
        producer_set.add(100);
        producer_flag.store(true, Ordering::Release);
    });

    let consumer = thread::spawn(move || {
        while !flag.load(Ordering::Acquire) {
            thread::yield_now();
        }
        assert!(set.contains(&100));
        assert_eq!(data.load(Ordering::Acquire), 42);
    });

    producer.join().unwrap();
    consumer.join().unwrap();
}
