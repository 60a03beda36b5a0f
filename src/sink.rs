//! Sinks: consumers of dispatched records.
//!
//! A [`Sink`] sees records one at a time, always from inside the dispatcher's
//! critical section, so implementations need no locking of their own.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::codec;
use crate::error::{Error, Result};
use crate::formatter::{LongFormatter, ShortFormatter, TextFormatter};
use crate::record::Record;
use crate::severity::Severity;

/// Default number of blanks per nesting level for text sinks.
pub const DEFAULT_INDENT_WIDTH: usize = 4;

/// A consumer of records.
///
/// `process` may block; while it runs, every other logging thread waits.
pub trait Sink: Send {
    fn process(&mut self, record: &Record) -> Result<()>;

    /// Releases the sink's resources. Called once by the dispatcher that owns
    /// the sink when it is disposed.
    fn dispose(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn process(&mut self, record: &Record) -> Result<()> {
        (**self).process(record)
    }

    fn dispose(&mut self) -> Result<()> {
        (**self).dispose()
    }
}

/// Formatter plus indent width, shared by the text sinks.
struct TextLayout {
    formatter: Box<dyn TextFormatter>,
    indent_width: usize,
}

impl TextLayout {
    fn new(formatter: impl TextFormatter + 'static) -> Self {
        Self {
            formatter: Box::new(formatter),
            indent_width: DEFAULT_INDENT_WIDTH,
        }
    }

    fn format(&self, record: &Record) -> String {
        self.formatter.format(record, self.indent_width)
    }
}

/// Writes formatted records to the console, or to any other writer.
///
/// Uses [`ShortFormatter`] unless told otherwise. With colors enabled each
/// record is wrapped in ANSI color codes chosen by severity.
pub struct ConsoleSink {
    writer: Box<dyn Write + Send>,
    layout: TextLayout,
    colors: bool,
}

impl ConsoleSink {
    /// Console sink on standard output, with colors.
    pub fn stdout() -> Self {
        Self::new(io::stdout()).colors(true)
    }

    /// Console sink on an arbitrary writer, without colors.
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Box::new(writer),
            layout: TextLayout::new(ShortFormatter),
            colors: false,
        }
    }

    pub fn colors(mut self, enabled: bool) -> Self {
        self.colors = enabled;
        self
    }

    pub fn indent_width(mut self, indent_width: usize) -> Self {
        self.layout.indent_width = indent_width;
        self
    }

    pub fn formatter(mut self, formatter: impl TextFormatter + 'static) -> Self {
        self.layout.formatter = Box::new(formatter);
        self
    }
}

impl Sink for ConsoleSink {
    fn process(&mut self, record: &Record) -> Result<()> {
        let text = self.layout.format(record);
        if self.colors {
            write!(self.writer, "{}{}{}", ansi_color(record.severity()), text, ANSI_RESET)?;
        } else {
            self.writer.write_all(text.as_bytes())?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn dispose(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

const ANSI_RESET: &str = "\x1b[0m";

fn ansi_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Emergency => "\x1b[97;101m",
        Severity::Alert => "\x1b[93;41m",
        Severity::Critical => "\x1b[91m",
        Severity::Error => "\x1b[31m",
        Severity::Warning => "\x1b[93m",
        Severity::Notice => "\x1b[96m",
        Severity::Info => "\x1b[37m",
        Severity::Debug => "\x1b[90m",
    }
}

/// Appends formatted records to a text file.
///
/// The file is opened in append mode for every record, so several processes
/// can share it and the file can be rotated away between records. Two writers
/// appending at the same instant may still interleave. Uses
/// [`LongFormatter`] unless told otherwise.
pub struct TextFileSink {
    path: PathBuf,
    layout: TextLayout,
}

impl TextFileSink {
    /// Fails if the directory that should hold the file does not exist.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            if !dir.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("log directory {} does not exist", dir.display()),
                )
                .into());
            }
        }
        Ok(Self {
            path,
            layout: TextLayout::new(LongFormatter),
        })
    }

    pub fn indent_width(mut self, indent_width: usize) -> Self {
        self.layout.indent_width = indent_width;
        self
    }

    pub fn formatter(mut self, formatter: impl TextFormatter + 'static) -> Self {
        self.layout.formatter = Box::new(formatter);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for TextFileSink {
    fn process(&mut self, record: &Record) -> Result<()> {
        let text = self.layout.format(record);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(text.as_bytes())?;
        Ok(())
    }
}

/// Forwards records to `tracing` as events.
///
/// Emergency to Error map to `ERROR`, Warning to `WARN`, Notice and Info to
/// `INFO`, Debug to `DEBUG`. The event carries `severity` and `depth` fields
/// and the formatted record (by default [`LongFormatter`]) as its message.
pub struct TraceSink {
    layout: TextLayout,
}

impl TraceSink {
    pub fn new() -> Self {
        Self {
            layout: TextLayout::new(LongFormatter),
        }
    }

    pub fn indent_width(mut self, indent_width: usize) -> Self {
        self.layout.indent_width = indent_width;
        self
    }

    pub fn formatter(mut self, formatter: impl TextFormatter + 'static) -> Self {
        self.layout.formatter = Box::new(formatter);
        self
    }
}

impl Default for TraceSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for TraceSink {
    fn process(&mut self, record: &Record) -> Result<()> {
        let text = self.layout.format(record);
        let message = text.trim_end_matches('\n');
        let severity = record.severity().name();
        let depth = record.nesting_depth();
        match record.severity() {
            Severity::Emergency | Severity::Alert | Severity::Critical | Severity::Error => {
                tracing::error!(severity, depth, "{message}")
            }
            Severity::Warning => tracing::warn!(severity, depth, "{message}"),
            Severity::Notice | Severity::Info => tracing::info!(severity, depth, "{message}"),
            Severity::Debug => tracing::debug!(severity, depth, "{message}"),
        }
        Ok(())
    }
}

/// Appends records in the binary format of [`codec`] to a file.
///
/// Extra data is stored as its rendered text, so reading the file back with
/// [`BinaryFileSource`](crate::source::BinaryFileSource) does not reproduce
/// the original extra-data values. Output is buffered; it reaches the file on
/// [`flush`](BinaryFileSink::flush), on dispose, or when the sink is dropped.
pub struct BinaryFileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl BinaryFileSink {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Sink for BinaryFileSink {
    fn process(&mut self, record: &Record) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(Error::SinkDisposed)?;
        codec::write_record(writer, record)
    }

    fn dispose(&mut self) -> Result<()> {
        match self.writer.take() {
            Some(mut writer) => Ok(writer.flush()?),
            None => Ok(()),
        }
    }
}
