use reentrant_lock::{Identity, Lock, RawLock};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

fn id(raw: u64) -> Identity {
    Identity::new(raw).unwrap()
}

/// Polls until `cond` holds; panics after a generous deadline.
fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(1));
    }
}

/// Long enough for a blocked thread to park and prove it stays parked.
fn settle() {
    thread::sleep(Duration::from_millis(100));
}

#[test]
fn last_reader_hands_off_to_pending_writer() {
    let lock = RawLock::new();
    let (a, b, c) = (id(1), id(2), id(3));

    lock.lock_shared_for(a);
    assert_eq!(lock.active_readers(), 1);
    lock.lock_shared_for(b);
    assert_eq!(lock.active_readers(), 2);

    thread::scope(|s| {
        let writer = s.spawn(|| lock.lock_for(c));
        wait_until("C to block", || lock.pending_writers() == 1);

        lock.unlock_shared_for(a);
        assert_eq!(lock.active_readers(), 1);
        settle();
        assert!(!lock.is_owned_by(c));

        lock.unlock_shared_for(b);
        assert_eq!(lock.active_readers(), 0);
        writer.join().unwrap();
    });

    let s = lock.snapshot();
    assert_eq!(s.writer, Some(c));
    assert_eq!(s.writer_depth, 1);
    assert_eq!(s.pending_writers, 0);
    lock.unlock_for(c);
}

#[test]
fn pending_writer_blocks_new_readers() {
    let lock = RawLock::new();
    let (a, b, c, d) = (id(1), id(2), id(3), id(4));
    let reader_in = AtomicBool::new(false);

    lock.lock_shared_for(a);

    thread::scope(|s| {
        let writer = s.spawn(|| lock.lock_for(c));
        wait_until("C to block", || lock.pending_writers() == 1);

        assert!(!lock.try_lock_shared_for(b));

        let reader = s.spawn(|| {
            lock.lock_shared_for(d);
            reader_in.store(true, Ordering::SeqCst);
            lock.unlock_shared_for(d);
        });
        settle();
        assert!(!reader_in.load(Ordering::SeqCst));

        // an existing reader still nests without deadlocking the writer
        lock.lock_shared_for(a);
        lock.unlock_shared_for(a);
        lock.unlock_shared_for(a);

        writer.join().unwrap();
        assert!(lock.is_owned_by(c));
        settle();
        assert!(!reader_in.load(Ordering::SeqCst));

        lock.unlock_for(c);
        reader.join().unwrap();
    });

    assert!(reader_in.load(Ordering::SeqCst));
    assert!(!lock.is_locked());
}

#[test]
fn reentrant_writer_needs_every_unlock() {
    let lock = Arc::new(Lock::new());
    let acquired = Arc::new(AtomicBool::new(false));

    lock.lock();
    lock.lock();
    lock.lock();

    let other = {
        let lock = lock.clone();
        let acquired = acquired.clone();
        thread::spawn(move || {
            lock.lock();
            acquired.store(true, Ordering::SeqCst);
            lock.unlock();
        })
    };

    wait_until("other writer to block", || lock.raw().pending_writers() == 1);
    lock.unlock();
    lock.unlock();
    settle();
    assert!(!acquired.load(Ordering::SeqCst));

    lock.unlock();
    other.join().unwrap();
    assert!(acquired.load(Ordering::SeqCst));
}

#[test]
fn upgrade_excludes_readers_then_restores() {
    let lock = Arc::new(Lock::new());
    let read_done = Arc::new(AtomicBool::new(false));

    lock.lock_shared();
    lock.lock();

    let reader = {
        let lock = lock.clone();
        let read_done = read_done.clone();
        thread::spawn(move || {
            lock.lock_shared();
            read_done.store(true, Ordering::SeqCst);
            lock.unlock_shared();
        })
    };
    settle();
    assert!(!read_done.load(Ordering::SeqCst));

    lock.unlock();
    assert_eq!(lock.shared_depth(), 1);
    reader.join().unwrap();
    assert!(read_done.load(Ordering::SeqCst));

    // the restored read still keeps writers out
    let (tx, rx) = mpsc::channel();
    let writer = {
        let lock = lock.clone();
        thread::spawn(move || {
            lock.lock();
            tx.send(()).unwrap();
            lock.unlock();
        })
    };
    wait_until("writer to block", || lock.raw().pending_writers() == 1);
    assert!(rx.try_recv().is_err());

    lock.unlock_shared();
    rx.recv_timeout(Duration::from_secs(10)).unwrap();
    writer.join().unwrap();
}

#[test]
fn upgrade_waits_for_foreign_readers() {
    let lock = RawLock::new();
    let (a, b) = (id(1), id(2));
    lock.lock_shared_for(a);
    lock.lock_shared_for(a);
    lock.lock_shared_for(b);

    thread::scope(|s| {
        let upgrader = s.spawn(|| lock.lock_for(a));
        wait_until("upgrade to block", || lock.pending_writers() == 1);

        let snap = lock.snapshot();
        assert_eq!(snap.writer, None);
        assert_eq!(snap.active_readers, 1);
        assert_eq!(snap.reader_depth(a), 0);

        lock.unlock_shared_for(b);
        upgrader.join().unwrap();
    });

    let s = lock.snapshot();
    assert_eq!(s.writer, Some(a));
    assert_eq!(s.reader_depth(a), -2);
    lock.unlock_for(a);
    assert_eq!(lock.reader_depth(a), 2);
    assert_eq!(lock.active_readers(), 2);
}

#[test]
fn concurrent_upgrades_serialize() {
    let lock = RawLock::new();
    let (a, b) = (id(1), id(2));
    lock.lock_shared_for(a);
    lock.lock_shared_for(b);

    thread::scope(|s| {
        let first = s.spawn(|| lock.lock_for(a));
        wait_until("A's upgrade to block", || lock.pending_writers() == 1);

        // B's own read was the last foreign one, so B gets in first
        lock.lock_for(b);
        assert!(lock.is_owned_by(b));
        assert_eq!(lock.pending_writers(), 1);

        lock.unlock_for(b);
        assert_eq!(lock.reader_depth(b), 1);
        settle();
        assert!(!lock.is_owned_by(a));

        lock.unlock_shared_for(b);
        first.join().unwrap();
    });

    assert!(lock.is_owned_by(a));
    assert_eq!(lock.reader_depth(a), -1);
    lock.unlock_for(a);
    lock.unlock_shared_for(a);
    assert!(!lock.is_locked());
}

#[test]
fn downgrade_wakes_waiting_readers() {
    let lock = Arc::new(Lock::new());
    let write = lock.write();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let lock = lock.clone();
            thread::spawn(move || {
                let _read = lock.read();
            })
        })
        .collect();
    settle();

    let read = write.downgrade();
    for r in readers {
        r.join().unwrap();
    }
    drop(read);
    assert!(!lock.raw().is_locked());
}

#[test]
fn writes_are_mutually_exclusive() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 200;

    let lock = Arc::new(Lock::new());
    let writers = Arc::new(AtomicUsize::new(0));
    let readers = Arc::new(AtomicUsize::new(0));
    let counter = Arc::new(AtomicU64::new(0));
    let start = Arc::new(Barrier::new(THREADS));

    let enter_write = {
        let (writers, readers, counter) = (writers.clone(), readers.clone(), counter.clone());
        move || {
            assert_eq!(writers.fetch_add(1, Ordering::SeqCst), 0);
            assert_eq!(readers.load(Ordering::SeqCst), 0);
            // load + store: a lost update means two writers overlapped
            let v = counter.load(Ordering::SeqCst);
            thread::yield_now();
            counter.store(v + 1, Ordering::SeqCst);
            writers.fetch_sub(1, Ordering::SeqCst);
        }
    };
    let enter_read = {
        let (writers, readers) = (writers.clone(), readers.clone());
        move || {
            readers.fetch_add(1, Ordering::SeqCst);
            assert_eq!(writers.load(Ordering::SeqCst), 0);
            readers.fetch_sub(1, Ordering::SeqCst);
        }
    };

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let lock = lock.clone();
            let start = start.clone();
            let enter_write = enter_write.clone();
            let enter_read = enter_read.clone();
            thread::spawn(move || {
                start.wait();
                for j in 0..ROUNDS {
                    match (i + j) % 4 {
                        0 => {
                            lock.lock();
                            lock.lock();
                            enter_write();
                            lock.unlock();
                            lock.unlock();
                        }
                        1 => {
                            lock.lock_shared();
                            lock.lock_shared();
                            enter_read();
                            lock.unlock_shared();
                            lock.unlock_shared();
                        }
                        2 => {
                            lock.lock_shared();
                            enter_read();
                            lock.lock();
                            enter_write();
                            lock.unlock();
                            enter_read();
                            lock.unlock_shared();
                        }
                        _ => {
                            let write = lock.write();
                            let _read = lock.read();
                            enter_write();
                            drop(_read);
                            drop(write);
                        }
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let expected: u64 = (0..THREADS)
        .map(|i| (0..ROUNDS).filter(|j| (i + j) % 4 != 1).count() as u64)
        .sum();
    assert_eq!(counter.load(Ordering::SeqCst), expected);
    assert!(!lock.raw().is_locked());
}

#[test]
fn many_readers_share_access() {
    let lock = Arc::new(Lock::new());
    let inside = Arc::new(AtomicUsize::new(0));
    let all_in = Arc::new(Barrier::new(5));

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let lock = lock.clone();
            let inside = inside.clone();
            let all_in = all_in.clone();
            thread::spawn(move || {
                let _read = lock.read();
                inside.fetch_add(1, Ordering::SeqCst);
                // every reader must be inside at once for this to return
                all_in.wait();
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(inside.load(Ordering::SeqCst), 5);
}

#[test]
fn try_lock_never_blocks() {
    let lock = Arc::new(Lock::new());
    lock.lock_shared();

    let other = {
        let lock = lock.clone();
        thread::spawn(move || {
            let started = Instant::now();
            assert!(!lock.try_lock());
            assert!(lock.try_lock_shared());
            lock.unlock_shared();
            started.elapsed()
        })
    };
    assert!(other.join().unwrap() < Duration::from_secs(1));
    lock.unlock_shared();
}
