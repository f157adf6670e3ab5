//! Progress reporting for ingestion runs.
//!
//! Progress is an integer percentage in `0..=100`, monotonic within a run.
//! Sinks receive every emitted value; the ingestor resets the sink to 0 at
//! the start and the end of each run.

use futures::channel::mpsc;
use indicatif::{ProgressBar, ProgressStyle};

/// Receiver of progress percentages
pub trait ProgressSink: Send + Sync {
    fn update(&self, percent: u8);

    fn reset(&self) {
        self.update(0);
    }
}

impl<F> ProgressSink for F
where
    F: Fn(u8) + Send + Sync,
{
    fn update(&self, percent: u8) {
        self(percent)
    }
}

/// Sink that discards progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&self, _percent: u8) {}
}

/// Terminal progress bar over a 0-100 scale
#[derive(Debug, Clone)]
pub struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    pub fn new(message: impl Into<String>) -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.set_message(message.into());
        Self { bar }
    }

    /// Hidden bar for quiet or non-interactive runs
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn finish(&self, message: impl Into<String>) {
        self.bar.finish_with_message(message.into());
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

impl ProgressSink for ProgressBarSink {
    fn update(&self, percent: u8) {
        self.bar.set_position(u64::from(percent));
    }

    // Keeps its last position until the caller finishes the bar
    fn reset(&self) {}
}

/// Sink forwarding progress to an async receiver
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    sender: mpsc::UnboundedSender<u8>,
}

impl ProgressSink for ChannelProgress {
    fn update(&self, percent: u8) {
        // A dropped receiver only means nobody is watching
        let _ = self.sender.unbounded_send(percent);
    }
}

/// Create a channel-backed sink and the stream of its updates
pub fn progress_channel() -> (ChannelProgress, mpsc::UnboundedReceiver<u8>) {
    let (sender, receiver) = mpsc::unbounded();
    (ChannelProgress { sender }, receiver)
}

/// `round(100 * done / total)`, clamped to 100; a zero total is complete
pub fn percent_complete(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let done = done.min(total) as u128;
    let total = total as u128;
    ((200 * done + total) / (2 * total)) as u8
}
