//! Progress publication.

use std::sync::atomic::{AtomicU8, Ordering};

/// Receives stage transitions of a generation run
///
/// Called when a stage is entered, before it mutates the deck. Readers must
/// expect a message describing work still in flight.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, percent: u8, message: &str);
}

/// Reporter discarding every update
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _percent: u8, _message: &str) {}
}

/// Forwards updates while never letting the percentage go down
pub(crate) struct MonotonicProgress<'a> {
    inner: &'a dyn ProgressReporter,
    last: AtomicU8,
}

impl<'a> MonotonicProgress<'a> {
    pub(crate) fn new(inner: &'a dyn ProgressReporter) -> Self {
        Self {
            inner,
            last: AtomicU8::new(0),
        }
    }
}

impl ProgressReporter for MonotonicProgress<'_> {
    fn report(&self, percent: u8, message: &str) {
        let percent = percent.min(100);
        let previous = self.last.fetch_max(percent, Ordering::SeqCst);
        self.inner.report(percent.max(previous), message);
    }
}

/// Linear position of step `index` of `count` within `[start, end]`
pub(crate) fn step_percent(start: u8, end: u8, index: usize, count: usize) -> u8 {
    if count == 0 || end <= start {
        return start;
    }
    let span = usize::from(end - start);
    let offset = (span * index.min(count)) / count;
    start + offset as u8
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use super::ProgressReporter;

    /// Records every update for later inspection
    #[derive(Default)]
    pub struct RecordingProgress {
        pub updates: Mutex<Vec<(u8, String)>>,
    }

    impl RecordingProgress {
        pub fn percents(&self) -> Vec<u8> {
            self.updates.lock().unwrap().iter().map(|(p, _)| *p).collect()
        }

        pub fn messages(&self) -> Vec<String> {
            self.updates.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
        }
    }

    impl ProgressReporter for RecordingProgress {
        fn report(&self, percent: u8, message: &str) {
            self.updates.lock().unwrap().push((percent, message.to_string()));
        }
    }
}
