use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;

use crate::common::FileList;
use crate::compress::{Compressor, ErrorPolicy};
use crate::error::{Result, TzipError};
use crate::progress::Statistics;

use super::distributor::WorkDistributor;
use super::slots::{Slot, SlotTable};

/// State shared by the workers of one run. Dropped when the run ends.
struct RunContext<'a> {
    files: &'a FileList,
    distributor: WorkDistributor,
    slots: SlotTable,
    stats: &'a Statistics,
    cancelled: AtomicBool,
    first_error: Mutex<Option<TzipError>>,
    skipped: Mutex<Vec<usize>>,
}

impl RunContext<'_> {
    /// Records `error` if it is the first one and stops every worker.
    fn fail(&self, error: TzipError) {
        let mut first = self.first_error.lock().unwrap_or_else(PoisonError::into_inner);
        if first.is_none() {
            tracing::error!(%error, "aborting run");
            *first = Some(error);
        }
        self.cancelled.store(true, Ordering::Release);
        self.distributor.exhaust();
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Result of a pool run once every worker has been joined.
#[derive(Debug)]
pub struct PoolOutcome {
    /// One filled slot per compressed file, empty for skipped ones.
    pub slots: SlotTable,
    /// Indices of files left out under [`ErrorPolicy::Skip`], ascending.
    pub skipped: Vec<usize>,
}

/// Fixed-size pool of threads that compress the files of a [`FileList`].
pub struct WorkerPool<'a> {
    threads: usize,
    files: &'a FileList,
    compressor: &'a dyn Compressor,
    policy: ErrorPolicy,
}

impl<'a> WorkerPool<'a> {
    pub fn new(threads: usize, files: &'a FileList, compressor: &'a dyn Compressor, policy: ErrorPolicy) -> Self {
        Self {
            threads: threads.max(1),
            files,
            compressor,
            policy,
        }
    }

    /// Runs every worker to completion and returns the filled slot table.
    ///
    /// On a fatal error the remaining workers stop at their next claim; all of
    /// them are joined before the first recorded error is returned.
    pub fn run(&self, stats: &Statistics) -> Result<PoolOutcome> {
        let ctx = RunContext {
            files: self.files,
            distributor: WorkDistributor::new(self.files.len()),
            slots: SlotTable::new(self.files.len()),
            stats,
            cancelled: AtomicBool::new(false),
            first_error: Mutex::new(None),
            skipped: Mutex::new(Vec::new()),
        };

        let panicked = thread::scope(|s| {
            let handles: Vec<_> = (0..self.threads)
                .map(|id| {
                    let ctx = &ctx;
                    s.spawn(move || self.worker_loop(id, ctx))
                })
                .collect();

            // Barrier: nothing below runs until every worker has exited.
            handles.into_iter().map(|h| h.join()).filter(|r| r.is_err()).count()
        });

        tracing::debug!(claimed = ctx.distributor.claimed(), files = self.files.len(), "workers joined");
        if panicked > 0 {
            return Err(TzipError::WorkerPanicked);
        }
        if let Some(error) = ctx.first_error.into_inner().unwrap_or_else(PoisonError::into_inner) {
            return Err(error);
        }

        let mut skipped = ctx.skipped.into_inner().unwrap_or_else(PoisonError::into_inner);
        skipped.sort_unstable();
        Ok(PoolOutcome { slots: ctx.slots, skipped })
    }

    fn worker_loop(&self, id: usize, ctx: &RunContext<'_>) {
        let _span = tracing::debug_span!("worker", id).entered();
        let mut processed = 0usize;

        while !ctx.is_cancelled() {
            let Some(index) = ctx.distributor.claim() else { break };

            match self.process(ctx, index) {
                Ok(slot) => {
                    ctx.stats.record(slot.input_len, slot.size() as u64);
                    let stored = ctx.slots.store(index, slot);
                    debug_assert!(stored.is_ok(), "slot {index} written twice");
                    processed += 1;
                }
                Err(error) if self.policy == ErrorPolicy::Skip && error.is_per_file() => {
                    tracing::warn!(index, %error, "skipping file");
                    ctx.skipped.lock().unwrap_or_else(PoisonError::into_inner).push(index);
                }
                Err(error) => {
                    ctx.fail(error);
                    break;
                }
            }
        }

        tracing::debug!(processed, "worker finished");
    }

    /// Load, compress and frame-check one file.
    fn process(&self, ctx: &RunContext<'_>, index: usize) -> Result<Slot> {
        let path = ctx
            .files
            .path(index)
            .ok_or_else(|| TzipError::InvalidConfig(format!("index {index} is outside the file list")))?;

        let input = fs::read(&path).map_err(|source| TzipError::FileRead { path: path.clone(), source })?;
        let data = self
            .compressor
            .compress(&input)
            .map_err(|source| TzipError::Compress { path: path.clone(), source })?;

        if u32::try_from(data.len()).is_err() {
            return Err(TzipError::RecordTooLarge { path, size: data.len() });
        }

        tracing::debug!(index, file = %path.display(), bytes_in = input.len(), bytes_out = data.len(), "compressed");
        Ok(Slot { input_len: input.len() as u64, data })
    }
}
