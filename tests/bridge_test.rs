//! Integration test for submitting work over the bridge
//!
//! This test verifies that:
//! 1. Futures run on the loop thread and produce the same values they
//!    would produce if awaited inline
//! 2. Concurrent callers each get their own result
//! 3. Only one loop thread is ever created, even under contention
//! 4. Stream wrapping yields elements one pull at a time and stays
//!    exhausted once the stream ends

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;
use std::time::Duration;

use tether::Bridge;

#[test]
fn test_run_matches_inline_execution() {
    let bridge = Bridge::default();
    assert_eq!(bridge.run(async { 2 + 2 }), 4);

    // Timer driver is live on the loop
    let value = bridge.run(async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        "done"
    });
    assert_eq!(value, "done");
    bridge.close().unwrap();
}

#[test]
fn test_concurrent_runs_are_independent() {
    let bridge = Bridge::default();
    thread::scope(|s| {
        for i in 0..8u64 {
            let bridge = &bridge;
            s.spawn(move || {
                let value = bridge.run(async move {
                    // Stagger completions so results can't line up by accident
                    tokio::time::sleep(Duration::from_millis((8 - i) * 2)).await;
                    i * i
                });
                assert_eq!(value, i * i);
            });
        }
    });
    bridge.close().unwrap();
}

#[test]
fn test_single_loop_thread_under_contention() {
    let bridge = Bridge::default();
    let ids: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let bridge = &bridge;
                s.spawn(move || {
                    bridge.handle().unwrap();
                    bridge.run(async { thread::current().id() })
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
    bridge.close().unwrap();
}

#[test]
fn test_panic_inside_unit_resumes_on_caller() {
    let bridge = Bridge::default();
    let result = catch_unwind(AssertUnwindSafe(|| {
        let _: () = bridge.run(async { panic!("kaboom") });
    }));
    let payload = result.unwrap_err();
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"kaboom"));
    bridge.close().unwrap();
}

#[test]
fn test_wrap_iter_yields_then_stays_exhausted() {
    let bridge = Bridge::default();
    let mut iter = bridge.wrap_iter(futures::stream::iter(vec![1, 2, 3]));
    assert_eq!(iter.next(), Some(1));
    assert_eq!(iter.next(), Some(2));
    assert_eq!(iter.next(), Some(3));
    assert_eq!(iter.next(), None);
    assert_eq!(iter.next(), None);
    drop(iter);
    bridge.close().unwrap();
}

#[test]
fn test_wrap_iter_pulls_one_element_at_a_time() {
    let bridge = Bridge::default();
    // Infinite source: only the pulled elements are ever produced
    let mut iter = bridge.wrap_iter(futures::stream::repeat(7u32));
    for _ in 0..3 {
        assert_eq!(iter.next(), Some(7));
    }
    drop(iter);
    bridge.close().unwrap();
}

#[test]
fn test_wrap_iter_passes_item_errors_through() {
    let bridge = Bridge::default();
    let stream = futures::stream::iter(vec![
        Ok(1u32),
        Err(anyhow::anyhow!("advance failed")),
    ]);
    let mut iter = bridge.wrap_iter(stream);
    assert_eq!(iter.next().unwrap().unwrap(), 1);
    let err = iter.next().unwrap().unwrap_err();
    assert_eq!(err.to_string(), "advance failed");
    drop(iter);
    bridge.close().unwrap();
}

#[test]
fn test_close_is_idempotent() {
    let bridge = Bridge::default();
    bridge.run(async {});
    bridge.close().unwrap();
    bridge.close().unwrap();
}

#[test]
fn test_close_without_start_is_quiet() {
    let bridge = Bridge::default();
    bridge.close().unwrap();
}
