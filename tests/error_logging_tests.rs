use nested_logger::fault::MAX_CAUSE_DEPTH;
use nested_logger::{AggregateError, Dispatcher, Error, Record, Severity, Sink};
use std::any::type_name;
use std::error::Error as StdError;
use std::fmt;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct CollectingSink {
    records: Arc<Mutex<Vec<Record>>>,
}

impl CollectingSink {
    fn summary(&self) -> Vec<(Severity, u32, String)> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|r| (r.severity(), r.nesting_depth(), r.text().to_owned()))
            .collect()
    }
}

impl Sink for CollectingSink {
    fn process(&mut self, record: &Record) -> nested_logger::Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

#[derive(Debug)]
struct Timeout(&'static str);

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} timed out", self.0)
    }
}

impl StdError for Timeout {}

#[derive(Debug)]
struct Wrapped {
    context: String,
    inner: Box<dyn StdError + Send + Sync>,
}

impl Wrapped {
    fn new(context: impl Into<String>, inner: impl StdError + Send + Sync + 'static) -> Self {
        Self {
            context: context.into(),
            inner: Box::new(inner),
        }
    }
}

impl fmt::Display for Wrapped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.context)
    }
}

impl StdError for Wrapped {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.inner.as_ref())
    }
}

/// Holds its cause inline as the first field, so both share an address.
#[derive(Debug)]
struct Startup {
    inner: Timeout,
}

impl fmt::Display for Startup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("startup aborted")
    }
}

impl StdError for Startup {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.inner)
    }
}

#[derive(Debug)]
enum AppError {
    Io(std::io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(_) => f.write_str("i/o failure"),
        }
    }
}

impl StdError for AppError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
        }
    }
}

/// An error that names itself as its own cause.
#[derive(Debug)]
struct Ouroboros;

impl fmt::Display for Ouroboros {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("eats its own tail")
    }
}

impl StdError for Ouroboros {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self)
    }
}

struct FailingSink;

impl Sink for FailingSink {
    fn process(&mut self, _record: &Record) -> nested_logger::Result<()> {
        Err(std::io::Error::other("disk full").into())
    }
}

fn setup() -> (Dispatcher, CollectingSink) {
    let sink = CollectingSink::default();
    (Dispatcher::builder().sink(sink.clone()).build(), sink)
}

#[test]
fn test_plain_error() {
    let (dispatcher, sink) = setup();
    dispatcher.log_error(&Timeout("dns lookup")).unwrap();

    let records = sink.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].severity(), Severity::Error);
    assert_eq!(
        records[0].text(),
        format!("{}: dns lookup timed out", type_name::<Timeout>())
    );
    assert_eq!(
        records[0].extra_data_as_string().as_deref(),
        Some("Timeout(\"dns lookup\")")
    );
}

#[test]
fn test_aggregate_members_are_nested_in_order() {
    let (dispatcher, sink) = setup();
    let aggregate = AggregateError::new(
        "2 of 3 uploads failed",
        [Timeout("upload a"), Timeout("upload c")],
    );

    dispatcher.begin_block();
    dispatcher.log_error(&aggregate).unwrap();

    assert_eq!(
        sink.summary(),
        [
            (
                Severity::Error,
                1,
                format!("{}: 2 of 3 uploads failed", type_name::<AggregateError>())
            ),
            (Severity::Error, 2, "Timeout: upload a timed out".to_owned()),
            (Severity::Error, 2, "Timeout: upload c timed out".to_owned()),
        ]
    );
    assert_eq!(dispatcher.nesting_depth(), 1);
}

#[test]
fn test_source_chain_is_nested() {
    let (dispatcher, sink) = setup();
    let error = Wrapped::new(
        "could not start service",
        Wrapped::new("could not read configuration", Timeout("mount")),
    );

    dispatcher.log_error(&error).unwrap();

    assert_eq!(
        sink.summary(),
        [
            (
                Severity::Error,
                0,
                format!("{}: could not start service", type_name::<Wrapped>())
            ),
            (
                Severity::Error,
                1,
                "Wrapped: could not read configuration".to_owned()
            ),
            (Severity::Error, 2, "Timeout: mount timed out".to_owned()),
        ]
    );
    assert_eq!(dispatcher.nesting_depth(), 0);
}

#[test]
fn test_log_error_dyn_names_kind_from_value() {
    let (dispatcher, sink) = setup();
    let boxed: Box<dyn StdError + Send + Sync> = Box::new(Timeout("handshake"));

    dispatcher.log_error_dyn(boxed.as_ref()).unwrap();
    assert_eq!(sink.summary()[0].2, "Timeout: handshake timed out");
}

#[test]
fn test_io_error_kind() {
    let (dispatcher, sink) = setup();
    let error = Wrapped::new("save failed", std::io::Error::other("disk full"));

    dispatcher.log_error(&error).unwrap();
    assert_eq!(
        sink.summary()[1].2,
        format!("{}: disk full", type_name::<std::io::Error>())
    );
}

#[test]
fn test_deep_chain_is_truncated() {
    let (dispatcher, sink) = setup();
    let mut error = Wrapped::new("level 99", Timeout("bottom"));
    for level in (0..99).rev() {
        error = Wrapped::new(format!("level {level}"), error);
    }

    dispatcher.log_error(&error).unwrap();

    let summary = sink.summary();
    assert_eq!(summary.len(), MAX_CAUSE_DEPTH + 2);
    for (level, (severity, depth, text)) in summary[..=MAX_CAUSE_DEPTH].iter().enumerate() {
        assert_eq!(*severity, Severity::Error);
        assert_eq!(*depth as usize, level);
        assert!(text.ends_with(&format!("level {level}")), "{text}");
    }
    let (severity, depth, text) = &summary[MAX_CAUSE_DEPTH + 1];
    assert_eq!(*severity, Severity::Warning);
    assert_eq!(*depth as usize, MAX_CAUSE_DEPTH + 1);
    assert_eq!(text, "cause chain truncated after 32 levels");
    assert_eq!(dispatcher.nesting_depth(), 0);
}

#[test]
fn test_cyclic_chain_terminates() {
    let (dispatcher, sink) = setup();
    dispatcher.log_error(&Ouroboros).unwrap();

    assert_eq!(
        sink.summary(),
        [
            (
                Severity::Error,
                0,
                format!("{}: eats its own tail", type_name::<Ouroboros>())
            ),
            (
                Severity::Warning,
                1,
                "cyclic cause skipped: Ouroboros: eats its own tail".to_owned()
            ),
        ]
    );
}

#[test]
fn test_inline_cause_is_logged() {
    let (dispatcher, sink) = setup();
    let error = Startup {
        inner: Timeout("mount"),
    };

    dispatcher.log_error(&error).unwrap();

    assert_eq!(
        sink.summary(),
        [
            (
                Severity::Error,
                0,
                format!("{}: startup aborted", type_name::<Startup>())
            ),
            (Severity::Error, 1, "Timeout: mount timed out".to_owned()),
        ]
    );
}

#[test]
fn test_enum_variant_cause_is_logged() {
    let (dispatcher, sink) = setup();
    let error = AppError::Io(std::io::Error::other("disk full"));

    dispatcher.log_error(&error).unwrap();

    let summary = sink.summary();
    assert_eq!(summary.len(), 2);
    assert_eq!(
        summary[1],
        (
            Severity::Error,
            1,
            format!("{}: disk full", type_name::<std::io::Error>())
        )
    );
}

#[test]
fn test_failing_sink_does_not_cut_cause_chain() {
    let sink = CollectingSink::default();
    let dispatcher = Dispatcher::builder()
        .sink(FailingSink)
        .sink(sink.clone())
        .build();
    let error = Wrapped::new(
        "could not start service",
        Wrapped::new("could not read configuration", Timeout("mount")),
    );

    let result = dispatcher.log_error(&error);

    assert!(matches!(result, Err(Error::Sink { index: 0, .. })));
    let depths: Vec<u32> = sink.summary().into_iter().map(|(_, depth, _)| depth).collect();
    assert_eq!(depths, [0, 1, 2]);
    assert_eq!(dispatcher.nesting_depth(), 0);
}

#[test]
fn test_error_records_respect_threshold() {
    let (dispatcher, sink) = setup();
    dispatcher.set_threshold(Severity::Critical);
    dispatcher.log_error(&Ouroboros).unwrap();
    assert!(sink.summary().is_empty());
    assert_eq!(dispatcher.nesting_depth(), 0);
}
