//! Tests for properties and signals used together across threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use parking_lot::Mutex;
use trellis_core::{Property, Signal};

#[test]
fn test_concurrent_updates_do_not_interleave() {
    let counter = Arc::new(Property::new(0usize));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let counter = counter.clone();
            thread::spawn(move || {
                for _ in 0..1000 {
                    counter.update(|n| *n += 1);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(counter.get(), 8000);
}

#[test]
fn test_notify_only_on_change() {
    let page = Property::new(0usize);
    let page_changed = Signal::<usize>::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = seen.clone();
    page_changed.connect(move |page| recorded.lock().push(*page));

    for next in [1, 1, 2, 2, 0] {
        if page.set(next) {
            page_changed.emit(page.get());
        }
    }
    assert_eq!(*seen.lock(), vec![1, 2, 0]);
}

#[test]
fn test_blocked_signal_and_disconnect() {
    let signal = Signal::<()>::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let id = signal.connect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    signal.set_blocked(true);
    signal.emit(());
    signal.set_blocked(false);
    signal.emit(());
    assert!(signal.disconnect(id));
    signal.emit(());

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(signal.connection_count(), 0);
}
