use std::any::type_name;
use std::collections::VecDeque;
use std::error::Error as StdError;
use std::marker::PhantomData;

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::fault::{self, MAX_CAUSE_DEPTH};
use crate::hex_dump::{self, HexDumpOptions};
use crate::loggable::Loggable;
use crate::nesting::NestingCounters;
use crate::record::Record;
use crate::severity::Severity;
use crate::sink::Sink;
use crate::source::Source;

/// Everything guarded by the dispatch lock.
struct DispatchState {
    sinks: Vec<Box<dyn Sink>>,
    pending: VecDeque<Record>,
    deferred: bool,
    threshold: Severity,
    disposed: bool,
}

impl DispatchState {
    /// Hands `record` to every sink in order if it passes the threshold.
    /// A failing sink does not stop delivery to the sinks after it.
    fn deliver(&mut self, record: &Record, failures: &mut Vec<Error>) {
        if !record.severity().passes(self.threshold) {
            return;
        }
        for (index, sink) in self.sinks.iter_mut().enumerate() {
            if let Err(err) = sink.process(record) {
                failures.push(Error::sink(index, err));
            }
        }
    }
}

/// Central entry point of the logging system.
///
/// The dispatcher stamps each record with the calling thread's nesting depth,
/// filters it against the threshold severity and fans it out to every
/// attached sink, in list order. Fan-out happens under a single lock, so all
/// sinks observe the same total order of records, and a slow sink stalls
/// every logging thread while it works.
///
/// In deferred mode records are queued instead. Turning deferred mode off
/// delivers the queue in order, filtered against the threshold in force at
/// that moment.
///
/// A sink that fails does not keep the record from the remaining sinks; the
/// first failure is returned to the logging call site as [`Error::Sink`].
///
/// Dropping the dispatcher disposes it.
///
/// # Examples
///
/// ```
/// use nested_logger::{ConsoleSink, Dispatcher, Severity};
///
/// let dispatcher = Dispatcher::builder()
///     .sink(ConsoleSink::new(std::io::sink()))
///     .threshold(Severity::Info)
///     .build();
///
/// dispatcher.info("starting up")?;
/// {
///     let _block = dispatcher.block();
///     dispatcher.log(Severity::Notice, "loading plugins")?;
///     dispatcher.log(Severity::Debug, "filtered out")?;
/// }
/// dispatcher.dispose()?;
/// # Ok::<(), nested_logger::Error>(())
/// ```
pub struct Dispatcher {
    state: Mutex<DispatchState>,
    nesting: NestingCounters,
}

impl Dispatcher {
    /// Creates a dispatcher without sinks, live, with threshold `Debug`.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Logs `text` at [`Severity::Info`].
    pub fn info(&self, text: impl Into<String>) -> Result<()> {
        self.log(Severity::Info, text)
    }

    /// Logs `text` at [`Severity::Info`] with extra data.
    pub fn info_with(&self, text: impl Into<String>, extra_data: impl Loggable) -> Result<()> {
        self.log_with(Severity::Info, text, extra_data)
    }

    pub fn log(&self, severity: Severity, text: impl Into<String>) -> Result<()> {
        self.dispatch(Record::new(severity, text, self.nesting.current()))
    }

    pub fn log_with(
        &self,
        severity: Severity,
        text: impl Into<String>,
        extra_data: impl Loggable,
    ) -> Result<()> {
        self.dispatch(
            Record::new(severity, text, self.nesting.current()).with_extra_data(extra_data),
        )
    }

    /// Logs an error at [`Severity::Error`] as `"<type>: <message>"`, with its
    /// `Debug` output as extra data.
    ///
    /// Causes are logged one nesting level deeper: every member of an
    /// [`AggregateError`](crate::AggregateError), or else the error's
    /// `source()`, recursively. Chains deeper than [`MAX_CAUSE_DEPTH`] are
    /// cut, and a cause that is one of its own ancestors is skipped; both
    /// leave a `Warning` record in place of the missing part.
    pub fn log_error<E: StdError + 'static>(&self, error: &E) -> Result<()> {
        self.log_fault(error, type_name::<E>().to_owned(), &mut Vec::new())
    }

    /// Like [`log_error`](Self::log_error) for type-erased errors. The error
    /// kind is derived from the value since the static type is unknown.
    pub fn log_error_dyn(&self, error: &(dyn StdError + 'static)) -> Result<()> {
        self.log_fault(error, fault::kind_of(error), &mut Vec::new())
    }

    /// Re-logs an existing record, e.g. one replayed from a [`Source`] or
    /// taken from another logging system. The nesting depth is replaced by
    /// the calling thread's current depth; all other fields are kept.
    pub fn log_record(&self, record: &Record) -> Result<()> {
        self.dispatch(record.restamped(self.nesting.current()))
    }

    /// Logs `text` with a framed hex dump of a byte range as extra data.
    ///
    /// ```
    /// use nested_logger::{Dispatcher, HexDumpOptions, Severity};
    ///
    /// let dispatcher = Dispatcher::new();
    /// let frame = [0x02, 0x10, 0x41, 0x42, 0x03];
    /// dispatcher.hex_dump(Severity::Debug, "received frame", &frame, &HexDumpOptions::new())?;
    /// let wide = HexDumpOptions::new().wide_glyphs(true);
    /// dispatcher.hex_dump(Severity::Debug, "empty", &[], &wide)?;
    /// # Ok::<(), nested_logger::Error>(())
    /// ```
    pub fn hex_dump(
        &self,
        severity: Severity,
        text: impl Into<String>,
        bytes: &[u8],
        options: &HexDumpOptions,
    ) -> Result<()> {
        let dump = hex_dump::render(bytes, options)?;
        self.log_with(severity, text, dump)
    }

    /// Feeds every record of `source` through [`log_record`](Self::log_record)
    /// and returns how many were logged. Stops at the first error.
    pub fn replay(&self, source: &mut dyn Source) -> Result<usize> {
        let mut count = 0;
        for record in source.records() {
            self.log_record(&record?)?;
            count += 1;
        }
        Ok(count)
    }

    /// Increases the calling thread's nesting depth by one.
    pub fn begin_block(&self) {
        self.nesting.increment();
    }

    /// Decreases the calling thread's nesting depth by one, stopping at zero.
    pub fn end_block(&self) {
        self.nesting.decrement();
    }

    /// Opens a block that is closed when the returned guard is dropped.
    pub fn block(&self) -> BlockGuard<'_> {
        self.begin_block();
        BlockGuard {
            dispatcher: self,
            _not_send: PhantomData,
        }
    }

    /// The calling thread's current nesting depth.
    pub fn nesting_depth(&self) -> u32 {
        self.nesting.current()
    }

    /// Locks and returns the live list of sinks, for attaching, detaching or
    /// reordering. Fails once the dispatcher is disposed, like
    /// [`attach`](Self::attach).
    ///
    /// Logging from the same thread while the guard is alive deadlocks.
    pub fn sinks(&self) -> Result<MappedMutexGuard<'_, Vec<Box<dyn Sink>>>> {
        let state = self.state.lock();
        if state.disposed {
            return Err(Error::DispatcherDisposed);
        }
        Ok(MutexGuard::map(state, |state| &mut state.sinks))
    }

    /// Appends a sink to the end of the sink list.
    pub fn attach(&self, sink: impl Sink + 'static) -> Result<()> {
        let mut state = self.state.lock();
        if state.disposed {
            return Err(Error::DispatcherDisposed);
        }
        state.sinks.push(Box::new(sink));
        Ok(())
    }

    pub fn is_deferred(&self) -> bool {
        self.state.lock().deferred
    }

    /// Switches deferred mode. Switching it off delivers every queued record,
    /// in order, before any record logged afterwards. Setting the current
    /// value again does nothing.
    pub fn set_deferred(&self, deferred: bool) -> Result<()> {
        let mut failures = Vec::new();
        let flushed = {
            let mut state = self.state.lock();
            if state.disposed {
                return Err(Error::DispatcherDisposed);
            }
            if state.deferred == deferred {
                return Ok(());
            }
            state.deferred = deferred;
            if deferred {
                return Ok(());
            }
            let pending = std::mem::take(&mut state.pending);
            let flushed = pending.len();
            for record in &pending {
                state.deliver(record, &mut failures);
            }
            flushed
        };
        tracing::debug!(records = flushed, "flushed deferred records");
        settle(failures)
    }

    pub fn threshold(&self) -> Severity {
        self.state.lock().threshold
    }

    /// Sets the least severe severity that is still delivered.
    pub fn set_threshold(&self, threshold: Severity) {
        self.state.lock().threshold = threshold;
    }

    /// Disposes every attached sink and shuts the dispatcher down.
    ///
    /// Every sink is disposed even if an earlier one fails; the first failure
    /// is returned. Records still queued in deferred mode are discarded.
    /// Calling this again does nothing.
    pub fn dispose(&self) -> Result<()> {
        let mut failures = Vec::new();
        let discarded = {
            let mut state = self.state.lock();
            if state.disposed {
                return Ok(());
            }
            state.disposed = true;
            let discarded = state.pending.len();
            state.pending.clear();
            for (index, sink) in state.sinks.iter_mut().enumerate() {
                if let Err(err) = sink.dispose() {
                    failures.push(Error::sink(index, err));
                }
            }
            discarded
        };
        if discarded > 0 {
            tracing::debug!(records = discarded, "discarded deferred records on dispose");
        }
        settle(failures)
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    fn dispatch(&self, record: Record) -> Result<()> {
        let mut failures = Vec::new();
        {
            let mut state = self.state.lock();
            if state.disposed {
                return Err(Error::DispatcherDisposed);
            }
            if state.deferred {
                state.pending.push_back(record);
                return Ok(());
            }
            state.deliver(&record, &mut failures);
        }
        settle(failures)
    }

    /// `trail` holds the errors above `error` in the chain being logged.
    ///
    /// A failed record does not stop the rest of the cause tree from being
    /// logged; the first failure is returned at the end.
    fn log_fault<'e>(
        &self,
        error: &'e (dyn StdError + 'static),
        kind: String,
        trail: &mut Vec<&'e (dyn StdError + 'static)>,
    ) -> Result<()> {
        let mut result = self.log_with(
            Severity::Error,
            format!("{kind}: {error}"),
            format!("{error:?}"),
        );

        let causes = fault::causes(error);
        if causes.is_empty() {
            return result;
        }

        let _block = self.block();
        if trail.len() >= MAX_CAUSE_DEPTH {
            tracing::warn!(levels = MAX_CAUSE_DEPTH, "error cause chain truncated");
            return result.and(self.log(
                Severity::Warning,
                format!("cause chain truncated after {MAX_CAUSE_DEPTH} levels"),
            ));
        }

        trail.push(error);
        for cause in causes {
            let logged = if trail.iter().any(|&seen| fault::same_error(seen, cause)) {
                tracing::warn!("error cause chain is cyclic");
                self.log(
                    Severity::Warning,
                    format!("cyclic cause skipped: {}: {cause}", fault::kind_of(cause)),
                )
            } else {
                self.log_fault(cause, fault::kind_of(cause), trail)
            };
            result = result.and(logged);
        }
        trail.pop();
        result
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if let Err(err) = self.dispose() {
            tracing::warn!(error = %err, "failed to dispose dispatcher");
        }
    }
}

/// Reports sink failures and returns the first one.
fn settle(failures: Vec<Error>) -> Result<()> {
    for failure in &failures {
        tracing::warn!(error = %failure, "log sink failed");
    }
    failures.into_iter().next().map_or(Ok(()), Err)
}

/// Closes a block opened by [`Dispatcher::block`] when dropped.
///
/// Nesting depth is per thread, so the guard cannot be sent to another one.
#[must_use = "the block is closed as soon as the guard is dropped"]
pub struct BlockGuard<'a> {
    dispatcher: &'a Dispatcher,
    _not_send: PhantomData<*const ()>,
}

impl Drop for BlockGuard<'_> {
    fn drop(&mut self) {
        self.dispatcher.end_block();
    }
}

/// Programmatic configuration for a [`Dispatcher`].
pub struct DispatcherBuilder {
    sinks: Vec<Box<dyn Sink>>,
    threshold: Severity,
    deferred: bool,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            sinks: Vec::new(),
            threshold: Severity::Debug,
            deferred: false,
        }
    }

    pub fn sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn threshold(mut self, threshold: Severity) -> Self {
        self.threshold = threshold;
        self
    }

    /// Starts the dispatcher in deferred mode.
    pub fn deferred(mut self, deferred: bool) -> Self {
        self.deferred = deferred;
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            state: Mutex::new(DispatchState {
                sinks: self.sinks,
                pending: VecDeque::new(),
                deferred: self.deferred,
                threshold: self.threshold,
                disposed: false,
            }),
            nesting: NestingCounters::new(),
        }
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
