use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock;
use crate::loggable::Loggable;
use crate::severity::Severity;

/// A single logged event.
///
/// A record has a timestamp, a severity, text, a nesting depth and optional
/// extra data. Records are immutable once built: the `with_*` methods consume
/// the record and are meant for construction only. Cloning is cheap since the
/// extra data is shared.
#[derive(Clone)]
pub struct Record {
    timestamp: DateTime<Utc>,
    severity: Severity,
    text: String,
    nesting_depth: u32,
    extra_data: Option<Arc<dyn Loggable>>,
}

impl Record {
    /// Creates a record stamped with the current UTC time.
    pub fn new(severity: Severity, text: impl Into<String>, nesting_depth: u32) -> Self {
        Self {
            timestamp: clock::now(),
            severity,
            text: text.into(),
            nesting_depth,
            extra_data: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_extra_data(self, extra_data: impl Loggable) -> Self {
        self.with_shared_extra_data(Some(Arc::new(extra_data)))
    }

    pub fn with_shared_extra_data(mut self, extra_data: Option<Arc<dyn Loggable>>) -> Self {
        self.extra_data = extra_data;
        self
    }

    /// Copy of this record at another nesting depth. Everything else,
    /// timestamp included, is carried over.
    pub(crate) fn restamped(&self, nesting_depth: u32) -> Self {
        Self {
            nesting_depth,
            ..self.clone()
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn nesting_depth(&self) -> u32 {
        self.nesting_depth
    }

    pub fn extra_data(&self) -> Option<&dyn Loggable> {
        self.extra_data.as_deref()
    }

    pub fn shared_extra_data(&self) -> Option<Arc<dyn Loggable>> {
        self.extra_data.clone()
    }

    /// Renders the extra data, if any, as text.
    pub fn extra_data_as_string(&self) -> Option<String> {
        self.extra_data.as_ref().map(|data| data.render())
    }

    /// Returns the extra data as `T` if that is its concrete type.
    pub fn extra_data_as<T: 'static>(&self) -> Option<&T> {
        self.extra_data
            .as_deref()
            .and_then(|data| data.as_any().downcast_ref::<T>())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.severity,
            self.text
        )
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("timestamp", &self.timestamp)
            .field("severity", &self.severity)
            .field("text", &self.text)
            .field("nesting_depth", &self.nesting_depth)
            .field("extra_data", &self.extra_data_as_string())
            .finish()
    }
}
