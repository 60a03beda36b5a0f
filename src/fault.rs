//! Helpers for logging errors together with their causes.

use std::any::type_name;
use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Cause levels followed below a logged error before the chain is cut.
pub const MAX_CAUSE_DEPTH: usize = 32;

type BoxedError = Box<dyn StdError + Send + Sync + 'static>;

/// An error made of several independent causes.
///
/// When logged, each cause is logged one nesting level deeper, in order.
/// [`source`](StdError::source) reports the first cause so generic chain
/// walkers still see something.
#[derive(Debug)]
pub struct AggregateError {
    message: String,
    errors: Vec<BoxedError>,
}

impl AggregateError {
    pub fn new<I, E>(message: impl Into<String>, errors: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<BoxedError>,
    {
        Self {
            message: message.into(),
            errors: errors.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        self.errors
            .iter()
            .map(|error| error.as_ref() as &(dyn StdError + 'static))
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for AggregateError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.errors
            .first()
            .map(|error| error.as_ref() as &(dyn StdError + 'static))
    }
}

/// Causes logged one level below `error`: every member of an aggregate, or
/// the single `source()` otherwise.
pub(crate) fn causes<'a>(
    error: &'a (dyn StdError + 'static),
) -> Vec<&'a (dyn StdError + 'static)> {
    match error.downcast_ref::<AggregateError>() {
        Some(aggregate) => aggregate.errors().collect(),
        None => error.source().into_iter().collect(),
    }
}

/// Names the kind of a type-erased error.
///
/// Known types get their type path. Anything else is named after the leading
/// identifier of its `Debug` output, which for derived impls is the struct or
/// variant name.
pub(crate) fn kind_of(error: &(dyn StdError + 'static)) -> String {
    if error.is::<AggregateError>() {
        return type_name::<AggregateError>().to_owned();
    }
    if error.is::<io::Error>() {
        return type_name::<io::Error>().to_owned();
    }
    let debug = format!("{error:?}");
    let ident: String = debug
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == ':')
        .collect();
    if ident.is_empty() {
        "error".to_owned()
    } else {
        ident
    }
}

/// Whether `a` and `b` are the same error value, used to spot cycles in a
/// cause chain.
///
/// An equal address is not enough: a cause stored inline as the first field
/// of its parent shares the parent's address. The two must also have the same
/// vtable, or, since a type can end up with more than one vtable, the same
/// kind and message.
pub(crate) fn same_error(a: &(dyn StdError + 'static), b: &(dyn StdError + 'static)) -> bool {
    std::ptr::addr_eq(a, b)
        && (std::ptr::eq(a, b) || (kind_of(a) == kind_of(b) && a.to_string() == b.to_string()))
}
