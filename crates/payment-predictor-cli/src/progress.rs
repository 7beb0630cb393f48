use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tqdm::tqdm;

use payment_predictor::batch::{BatchOutcome, BatchProgress, LogProgress, ProgressReporter};

/// Console progress bar ticking once per scored customer.
///
/// The bar lives on its own thread and only receives ticks over a channel,
/// so it never blocks scoring. `finish` closes the channel and joins it.
pub struct Progress {
    total: usize,
    count: AtomicUsize,
    sender: mpsc::Sender<usize>,
    progress_thread: Option<thread::JoinHandle<()>>,
}

impl Progress {
    pub fn new(total: usize, description: &str) -> Self {
        let (tx, rx) = mpsc::channel::<usize>();
        let description = description.to_string();

        let handle = thread::spawn(move || {
            let mut bar = tqdm(0..total).desc(Some(description));
            for step in rx {
                let _ = bar.pbar.update(step);
            }
        });

        Self {
            total,
            count: AtomicUsize::new(0),
            sender: tx,
            progress_thread: Some(handle),
        }
    }

    pub fn inc(&self) {
        let new_count = self.count.fetch_add(1, Ordering::AcqRel) + 1;
        if new_count > self.total {
            log::warn!("Progress received more updates than its total of {}", self.total);
            return;
        }
        let _ = self.sender.send(1);
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire).min(self.total)
    }

    /// Stop the bar; pending ticks are drained first.
    pub fn finish(self) {
        drop(self.sender);
        if let Some(handle) = self.progress_thread {
            let _ = handle.join();
        }
    }
}

impl ProgressReporter for Progress {
    fn on_customer(&self, _acctrefno: i64, _ok: bool) {
        self.inc();
    }

    fn on_progress(&self, progress: &BatchProgress) {
        LogProgress.on_progress(progress);
    }

    fn on_finish(&self, outcome: &BatchOutcome, elapsed: Duration) {
        LogProgress.on_finish(outcome, elapsed);
    }
}
