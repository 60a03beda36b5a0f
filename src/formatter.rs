use crate::record::Record;

/// Width of the `[timestamp] [severity] ` prefix written by [`LongFormatter`].
pub const LONG_PREFIX_WIDTH: usize = 36;

/// Turns a record into text for line-oriented sinks.
///
/// `indent_width` is the number of blanks per nesting level. The returned
/// text ends with a newline.
pub trait TextFormatter: Send + Sync {
    fn format(&self, record: &Record, indent_width: usize) -> String;
}

/// Indented text followed by the extra data, without timestamp or severity.
///
/// ```text
///         Connecting to 10.0.0.7
///         retry 2 of 5
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct ShortFormatter;

impl TextFormatter for ShortFormatter {
    fn format(&self, record: &Record, indent_width: usize) -> String {
        let indent = nesting_indent(record, indent_width);
        let first = format!("{}{}", " ".repeat(indent), record.text());
        layout(&first, record, indent)
    }
}

/// All fields of a record: a fixed-width timestamp and severity column, then
/// the indented text. Continuation lines line up past the prefix column.
///
/// ```text
/// [2024-03-01 12:00:00.000] [Warning] Connecting to 10.0.0.7
///                                     retry 2 of 5
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct LongFormatter;

impl TextFormatter for LongFormatter {
    fn format(&self, record: &Record, indent_width: usize) -> String {
        let indent = nesting_indent(record, indent_width);
        let first = format!(
            "[{}] [{:<7}] {}{}",
            record.timestamp().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.severity(),
            " ".repeat(indent),
            record.text()
        );
        layout(&first, record, LONG_PREFIX_WIDTH + indent)
    }
}

fn nesting_indent(record: &Record, indent_width: usize) -> usize {
    record.nesting_depth() as usize * indent_width
}

/// Joins the first line and the extra data, normalizes line endings and
/// indents every line after the first by `continuation` blanks.
fn layout(first: &str, record: &Record, continuation: usize) -> String {
    let mut body = String::from(first);
    body.push('\n');
    if let Some(extra) = record.extra_data_as_string() {
        body.push_str(&extra);
        body.push('\n');
    }
    let body = body.replace("\r\n", "\n");

    let padding = " ".repeat(continuation);
    let mut out = String::with_capacity(body.len());
    // The body always ends with '\n', so the final split piece is empty.
    let lines: Vec<&str> = body.split('\n').collect();
    for (i, line) in lines[..lines.len() - 1].iter().enumerate() {
        if i > 0 {
            out.push_str(&padding);
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}
