use std::any::Any;
use std::fmt;

/// A value that can travel with a [`Record`](crate::Record) as extra data.
///
/// Extra data stays opaque inside the dispatcher; sinks that need text call
/// [`render`](Loggable::render), and sinks that know the concrete type can
/// get it back through [`as_any`](Loggable::as_any). This is automatically
/// implemented for every `Display` type that is safe to share across threads.
pub trait Loggable: Send + Sync + 'static {
    /// Renders the value as text. Durable sinks store only this rendering.
    fn render(&self) -> String;

    fn as_any(&self) -> &dyn Any;
}

// Generic implementation for Display types
impl<T> Loggable for T
where
    T: fmt::Display + Send + Sync + 'static,
{
    fn render(&self) -> String {
        self.to_string()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
