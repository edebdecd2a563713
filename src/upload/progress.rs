//! Byte counting for streamed uploads.

use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

use super::UploadEvent;

#[derive(Debug, Default)]
struct ProgressState {
    bytes_sent: u64,
    last_percent: Option<u8>,
}

/// Turns byte counts into ordered, non-decreasing percentage events.
///
/// Percentages stop at 99 while bytes are flowing; 100 is reserved for
/// [`ProgressReporter::finish`], which is only called on terminal success.
pub struct ProgressReporter {
    bytes_total: u64,
    state: Mutex<ProgressState>,
    events: UnboundedSender<UploadEvent>,
}

impl ProgressReporter {
    pub fn new(bytes_total: u64, events: UnboundedSender<UploadEvent>) -> Self {
        Self {
            bytes_total,
            state: Mutex::new(ProgressState::default()),
            events,
        }
    }

    /// Emit the initial 0% event.
    pub fn start(&self) {
        let mut state = self.lock();
        self.emit(&mut state, 0);
    }

    pub fn advance(&self, bytes: usize) {
        let mut state = self.lock();
        state.bytes_sent = state
            .bytes_sent
            .saturating_add(bytes as u64)
            .min(self.bytes_total);
        let percent = percent_of(state.bytes_sent, self.bytes_total).min(99);
        self.emit(&mut state, percent);
    }

    pub fn finish(&self) {
        let mut state = self.lock();
        state.bytes_sent = self.bytes_total;
        self.emit(&mut state, 100);
    }

    pub fn bytes_sent(&self) -> u64 {
        self.lock().bytes_sent
    }

    fn emit(&self, state: &mut ProgressState, percent: u8) {
        if matches!(state.last_percent, Some(last) if percent <= last) {
            return;
        }
        state.last_percent = Some(percent);
        // The receiver may have gone away; progress is advisory.
        let _ = self.events.send(UploadEvent::Progress {
            percent,
            bytes_sent: state.bytes_sent,
            bytes_total: self.bytes_total,
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Rounded integer percentage of `sent` over `total`.
pub fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (sent.min(total) as f64 * 100.0 / total as f64).round();
    percent as u8
}
