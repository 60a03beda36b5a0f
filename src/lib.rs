//! # Nested Logger
//!
//! A structured logging core built around a central [`Dispatcher`]:
//!
//! * **Nesting**: every record carries the nesting depth of the thread that
//!   logged it, opened and closed with `begin_block`/`end_block` (or a
//!   scoped [`BlockGuard`]). Depths are tracked per thread and never leak
//!   between threads.
//! * **Filtering**: a threshold [`Severity`] (RFC 5424 ordinals) decides what
//!   reaches the sinks.
//! * **Fan-out**: records go to every attached [`Sink`] in order, under one
//!   lock, so all sinks see the same total order.
//! * **Deferred mode**: records can be queued, e.g. during start-up, and
//!   flushed in order later.
//!
//! ## Main Components
//!
//! * `dispatcher`: the [`Dispatcher`] and its builder
//! * `record`: the immutable [`Record`] handed to sinks
//! * `hex_dump`: framed hex/character dumps of binary payloads
//! * `codec`: versioned binary record format for durable storage
//! * `sink` / `source`: console, text file, `tracing` and binary file sinks,
//!   and a binary file source for replay
//! * `formatter`: short and long text layouts
//! * `bridge`: a `log` crate adapter
//!
//! ## Quick Start
//!
//! ```
//! use nested_logger::{ConsoleSink, Dispatcher, Severity};
//!
//! let dispatcher = Dispatcher::builder()
//!     .sink(ConsoleSink::stdout())
//!     .build();
//!
//! dispatcher.info("Hello, world!")?;
//! dispatcher.begin_block();
//! dispatcher.log_with(Severity::Warning, "Temperature high", 25.5)?;
//! dispatcher.end_block();
//! # Ok::<(), nested_logger::Error>(())
//! ```

pub mod bridge;
pub mod clock;
pub mod codec;
pub mod dispatcher;
pub mod error;
pub mod fault;
pub mod formatter;
pub mod hex_dump;
pub mod loggable;
mod nesting;
pub mod record;
pub mod severity;
pub mod sink;
pub mod source;

pub use bridge::LogBridge;
pub use codec::RecordReader;
pub use dispatcher::{BlockGuard, Dispatcher, DispatcherBuilder};
pub use error::{Error, Result};
pub use fault::AggregateError;
pub use formatter::{LongFormatter, ShortFormatter, TextFormatter};
pub use hex_dump::{FrameGlyphs, HexDumpOptions};
pub use loggable::Loggable;
pub use record::Record;
pub use severity::Severity;
pub use sink::{BinaryFileSink, ConsoleSink, Sink, TextFileSink, TraceSink};
pub use source::{BinaryFileSource, Source};
