//! Pending Table Tests
//!
//! Tests for registering, completing and aborting correlated requests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::channel;
use parking_lot::Mutex;
use tagwire::client::{PendingRequest, PendingTable};
use tagwire::protocol::{PayloadReader, Token};
use tagwire::{protocol_tags, AbortReason};

protocol_tags! {
    enum Reply: u8 {
        Ok = 1,
        Other = 2,
    }
}

fn empty() -> PayloadReader {
    PayloadReader::new(Vec::new())
}

// =============================================================================
// Completion Tests
// =============================================================================

#[test]
fn test_complete_invokes_callback_once() {
    let table = PendingTable::<Reply>::new();
    let token = Token::generate();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let s = Arc::clone(&seen);
    assert!(table.register(
        token,
        PendingRequest::new(move |tag, payload: &mut PayloadReader| {
            s.lock().push((tag, payload.remaining().to_vec()));
        }),
    ));
    assert!(table.contains(token));

    let mut payload = PayloadReader::new(vec![9, 9]);
    assert!(table.complete(token, Reply::Ok, &mut payload));
    assert!(!table.complete(token, Reply::Other, &mut empty()));

    assert_eq!(*seen.lock(), vec![(Reply::Ok, vec![9, 9])]);
    assert!(table.is_empty());
}

#[test]
fn test_complete_unknown_token() {
    let table = PendingTable::<Reply>::new();
    assert!(!table.complete(Token::generate(), Reply::Ok, &mut empty()));
}

#[test]
fn test_duplicate_registration_keeps_first() {
    let table = PendingTable::<Reply>::new();
    let token = Token::generate();
    let hits = Arc::new(AtomicUsize::new(0));

    let h = Arc::clone(&hits);
    assert!(table.register(
        token,
        PendingRequest::new(move |_, _| {
            h.fetch_add(1, Ordering::SeqCst);
        }),
    ));
    assert!(!table.register(
        token,
        PendingRequest::new(|_, _| panic!("second registration must not run")),
    ));

    assert_eq!(table.len(), 1);
    table.complete(token, Reply::Ok, &mut empty());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_remove_skips_callbacks() {
    let table = PendingTable::<Reply>::new();
    let token = Token::generate();
    table.register(
        token,
        PendingRequest::new(|_, _| panic!("removed request must not complete"))
            .with_abort(|_| panic!("removed request must not abort")),
    );

    assert!(table.remove(token));
    assert!(!table.remove(token));
    assert_eq!(table.abort_all(AbortReason::Closed), 0);
}

#[test]
fn test_callback_may_reenter_table() {
    let table = Arc::new(PendingTable::<Reply>::new());
    let first = Token::generate();
    let second = Token::generate();

    let t = Arc::clone(&table);
    table.register(
        first,
        PendingRequest::new(move |_, _| {
            // Lock is not held while the callback runs
            assert!(t.contains(second));
            t.remove(second);
        }),
    );
    table.register(second, PendingRequest::new(|_, _| {}));

    assert!(table.complete(first, Reply::Ok, &mut empty()));
    assert!(table.is_empty());
}

// =============================================================================
// Abort Tests
// =============================================================================

#[test]
fn test_abort_all_releases_every_waiter() {
    let table = Arc::new(PendingTable::<Reply>::new());
    let (tx, rx) = channel::unbounded();

    for _ in 0..5 {
        let tx = tx.clone();
        table.register(
            Token::generate(),
            PendingRequest::new(|_, _| panic!("aborted request must not complete"))
                .with_abort(move |reason| tx.send(reason).unwrap()),
        );
    }
    // A request without an abort hook is still released
    table.register(Token::generate(), PendingRequest::new(|_, _| {}));

    assert_eq!(table.abort_all(AbortReason::ServerError), 6);
    assert!(table.is_empty());

    let reasons: Vec<_> = rx.try_iter().collect();
    assert_eq!(reasons, vec![AbortReason::ServerError; 5]);
}

#[test]
fn test_abort_unblocks_waiting_threads() {
    let table = Arc::new(PendingTable::<Reply>::new());
    let mut waiters = Vec::new();

    for _ in 0..4 {
        let (tx, rx) = channel::bounded(1);
        let abort_tx = tx.clone();
        table.register(
            Token::generate(),
            PendingRequest::new(move |tag, _| tx.send(Ok(tag)).unwrap())
                .with_abort(move |reason| abort_tx.send(Err(reason)).unwrap()),
        );
        waiters.push(thread::spawn(move || rx.recv().unwrap()));
    }

    table.abort_all(AbortReason::ConnectionLost);

    for waiter in waiters {
        assert_eq!(waiter.join().unwrap(), Err(AbortReason::ConnectionLost));
    }
}

#[test]
fn test_concurrent_register_and_complete() {
    let table = Arc::new(PendingTable::<Reply>::new());
    let completed = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let table = Arc::clone(&table);
            let completed = Arc::clone(&completed);
            thread::spawn(move || {
                for _ in 0..100 {
                    let token = Token::generate();
                    let c = Arc::clone(&completed);
                    table.register(
                        token,
                        PendingRequest::new(move |_, _| {
                            c.fetch_add(1, Ordering::SeqCst);
                        }),
                    );
                    assert!(table.complete(token, Reply::Ok, &mut empty()));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(completed.load(Ordering::SeqCst), 800);
    assert!(table.is_empty());
}
