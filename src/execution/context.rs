//! Run context
//!
//! Per-run state handed to the engine at construction: the silent flag,
//! an optional progress callback, and counters updated by the workers.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Progress callback: (files processed, files total, file just finished)
pub type ProgressCallback = Box<dyn Fn(usize, usize, &Path) + Send + Sync>;

pub struct RunContext {
    silent: bool,
    progress: Option<ProgressCallback>,
    total: AtomicUsize,
    processed: AtomicUsize,
    skipped: AtomicUsize,
}

impl RunContext {
    pub fn new(silent: bool, progress: Option<ProgressCallback>) -> Self {
        Self {
            silent,
            progress,
            total: AtomicUsize::new(0),
            processed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
        }
    }

    /// No console output, no callback
    pub fn silent() -> Self {
        Self::new(true, None)
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub(crate) fn begin(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.processed.store(0, Ordering::SeqCst);
        self.skipped.store(0, Ordering::SeqCst);
    }

    /// Record one finished unit of work and notify the callback
    pub(crate) fn record(&self, path: &Path, skipped: bool) {
        if skipped {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }
        let processed = self.processed.fetch_add(1, Ordering::SeqCst) + 1;
        if self.silent {
            return;
        }
        if let Some(ref callback) = self.progress {
            callback(processed, self.total.load(Ordering::SeqCst), path);
        }
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }

    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(false, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_record_counts_and_notifies() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let context = RunContext::new(
            false,
            Some(Box::new(move |done: usize, total: usize, _path: &Path| {
                sink.lock().unwrap().push((done, total));
            })),
        );

        context.begin(2);
        context.record(Path::new("a"), false);
        context.record(Path::new("b"), true);

        assert_eq!(context.processed(), 2);
        assert_eq!(context.skipped(), 1);
        assert_eq!(*seen.lock().unwrap(), vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn test_silent_context_suppresses_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let context = RunContext::new(
            true,
            Some(Box::new(move |_: usize, _: usize, _: &Path| {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        );

        context.begin(1);
        context.record(Path::new("a"), false);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(context.processed(), 1);
    }
}
