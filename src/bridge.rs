//! Adapter that routes the `log` crate's macros into a [`Dispatcher`].

use std::sync::Arc;

use log::{LevelFilter, Metadata, SetLoggerError};

use crate::dispatcher::Dispatcher;
use crate::severity::Severity;

/// A [`log::Log`] implementation backed by a shared [`Dispatcher`].
///
/// Each `log` record becomes a dispatcher record at the mapped severity,
/// nested at the calling thread's current depth, with the `log` target as
/// extra data. `log::Log` has no error channel, so dispatch failures (for
/// example after disposal) are dropped.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use nested_logger::{ConsoleSink, Dispatcher, LogBridge};
///
/// let dispatcher = Arc::new(Dispatcher::builder().sink(ConsoleSink::stdout()).build());
/// LogBridge::install(Arc::clone(&dispatcher)).unwrap();
///
/// log::warn!("disk usage at {}%", 91);
/// ```
#[derive(Clone)]
pub struct LogBridge {
    dispatcher: Arc<Dispatcher>,
}

impl LogBridge {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Registers a bridge as the global `log` logger. Filtering is left to the
    /// dispatcher's threshold, so the global max level is opened fully.
    pub fn install(dispatcher: Arc<Dispatcher>) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(Self::new(dispatcher)))?;
        log::set_max_level(LevelFilter::Trace);
        Ok(())
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        // Deferred records are filtered when they are flushed.
        self.dispatcher.is_deferred()
            || Severity::from(metadata.level()).passes(self.dispatcher.threshold())
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = self.dispatcher.log_with(
            Severity::from(record.level()),
            record.args().to_string(),
            record.target().to_owned(),
        );
    }

    fn flush(&self) {}
}
