use std::sync::atomic::{AtomicUsize, Ordering};

/// Hands out file indices `0..len` exactly once each across any number of threads.
///
/// The cursor only moves forward and never passes `len`, so once a caller sees
/// `None` every later call sees `None` as well.
#[derive(Debug)]
pub struct WorkDistributor {
    cursor: AtomicUsize,
    len: usize,
}

impl WorkDistributor {
    pub fn new(len: usize) -> Self {
        Self { cursor: AtomicUsize::new(0), len }
    }

    /// Claims the next unprocessed index, or `None` once all have been handed out.
    pub fn claim(&self) -> Option<usize> {
        self.cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| (cur < self.len).then_some(cur + 1))
            .ok()
    }

    /// Moves the cursor to the end so that every subsequent `claim` fails.
    pub fn exhaust(&self) {
        self.cursor.store(self.len, Ordering::Release);
    }

    /// Number of indices handed out so far.
    pub fn claimed(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }
}
