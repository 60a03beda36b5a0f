//! Framed hex/character dumps of byte ranges.
//!
//! ```text
//! +----+-----------------------------------------------+----------------+
//! |Offs|00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f|Characters      |
//! +----+-----------------------------------------------+----------------+
//! |0000|48 65 6c 6c 6f 2c 20 77 6f 72 6c 64 21 ·· ·· ··|Hello, world!   |
//! +----+-----------------------------------------------+----------------+
//! ```

use std::fmt::Write as _;

use crate::error::{Error, Result};

/// Filler shown in the byte column for positions outside the dumped range.
const FILLER: &str = "··";

/// The 11 glyphs that draw the frame of a dump, by position:
///
/// | index | position |
/// |---|---|
/// | 0 | top-left corner |
/// | 1 | horizontal line |
/// | 2 | top tee |
/// | 3 | top-right corner |
/// | 4 | vertical line |
/// | 5 | left tee |
/// | 6 | cross |
/// | 7 | right tee |
/// | 8 | bottom-left corner |
/// | 9 | bottom tee |
/// | 10 | bottom-right corner |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGlyphs([char; 11]);

impl FrameGlyphs {
    pub const ASCII: FrameGlyphs =
        FrameGlyphs(['+', '-', '+', '+', '|', '+', '+', '+', '+', '+', '+']);
    pub const UNICODE: FrameGlyphs =
        FrameGlyphs(['┌', '─', '┬', '┐', '│', '├', '┼', '┤', '└', '┴', '┘']);

    pub const fn new(glyphs: [char; 11]) -> Self {
        FrameGlyphs(glyphs)
    }

    /// Builds a glyph set from a string of exactly 11 characters.
    pub fn parse(glyphs: &str) -> Result<Self> {
        let chars: Vec<char> = glyphs.chars().collect();
        let glyphs: [char; 11] = chars
            .as_slice()
            .try_into()
            .map_err(|_| Error::InvalidGlyphSet(chars.len()))?;
        Ok(FrameGlyphs(glyphs))
    }

    fn top_left(&self) -> char {
        self.0[0]
    }
    fn horizontal(&self) -> char {
        self.0[1]
    }
    fn top_tee(&self) -> char {
        self.0[2]
    }
    fn top_right(&self) -> char {
        self.0[3]
    }
    fn vertical(&self) -> char {
        self.0[4]
    }
    fn left_tee(&self) -> char {
        self.0[5]
    }
    fn cross(&self) -> char {
        self.0[6]
    }
    fn right_tee(&self) -> char {
        self.0[7]
    }
    fn bottom_left(&self) -> char {
        self.0[8]
    }
    fn bottom_tee(&self) -> char {
        self.0[9]
    }
    fn bottom_right(&self) -> char {
        self.0[10]
    }
}

impl Default for FrameGlyphs {
    fn default() -> Self {
        FrameGlyphs::ASCII
    }
}

/// Which part of a byte buffer to dump, and how to draw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexDumpOptions {
    offset: usize,
    length: Option<usize>,
    glyphs: FrameGlyphs,
    bytes_per_line: usize,
}

impl Default for HexDumpOptions {
    fn default() -> Self {
        Self {
            offset: 0,
            length: None,
            glyphs: FrameGlyphs::ASCII,
            bytes_per_line: 16,
        }
    }
}

impl HexDumpOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// First byte to dump. Addresses in the dump are absolute, so the first
    /// row starts at this offset.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Number of bytes to dump. Defaults to everything after `offset`.
    pub fn length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// Draws the frame with Unicode box-drawing glyphs instead of ASCII.
    pub fn wide_glyphs(mut self, wide: bool) -> Self {
        self.glyphs = if wide {
            FrameGlyphs::UNICODE
        } else {
            FrameGlyphs::ASCII
        };
        self
    }

    pub fn glyphs(mut self, glyphs: FrameGlyphs) -> Self {
        self.glyphs = glyphs;
        self
    }

    pub fn bytes_per_line(mut self, bytes_per_line: usize) -> Self {
        self.bytes_per_line = bytes_per_line;
        self
    }
}

/// Renders `bytes[offset..offset + length]` as a framed table with an
/// address column, a byte column and a character column. Every line,
/// including the last, ends with `\n`.
pub fn render(bytes: &[u8], options: &HexDumpOptions) -> Result<String> {
    let bytes_per_line = options.bytes_per_line;
    let byte_column = bytes_per_line
        .checked_mul(3)
        .and_then(|width| width.checked_sub(1))
        .ok_or(Error::InvalidBytesPerLine)?;

    let offset = options.offset;
    let length = options
        .length
        .unwrap_or_else(|| bytes.len().saturating_sub(offset));
    let end = offset
        .checked_add(length)
        .filter(|&end| end <= bytes.len())
        .ok_or(Error::HexDumpRange {
            offset,
            length,
            available: bytes.len(),
        })?;
    let data = &bytes[offset..end];

    let glyphs = &options.glyphs;
    let widths = ColumnWidths {
        address: address_width(end),
        bytes: byte_column,
        characters: bytes_per_line,
    };

    let mut out = String::new();
    widths.border(
        &mut out,
        glyphs,
        glyphs.top_left(),
        glyphs.top_tee(),
        glyphs.top_right(),
    );
    header(&mut out, glyphs, &widths, bytes_per_line);
    widths.border(
        &mut out,
        glyphs,
        glyphs.left_tee(),
        glyphs.cross(),
        glyphs.right_tee(),
    );

    if !data.is_empty() {
        let first_row = offset / bytes_per_line;
        let last_row = (end - 1) / bytes_per_line;
        for row in first_row..=last_row {
            let row_start = row * bytes_per_line;
            // A partial first row is labelled with its first dumped byte.
            let label = row_start.max(offset);
            body_row(
                &mut out,
                glyphs,
                &widths,
                label,
                (0..bytes_per_line).map(|column| {
                    let address = row_start + column;
                    (offset..end)
                        .contains(&address)
                        .then(|| data[address - offset])
                }),
            );
        }
    }

    widths.border(
        &mut out,
        glyphs,
        glyphs.bottom_left(),
        glyphs.bottom_tee(),
        glyphs.bottom_right(),
    );
    Ok(out)
}

/// Hex digits needed for addresses up to `end`, never fewer than four.
fn address_width(end: usize) -> usize {
    let mut width = 0;
    let mut capacity: u128 = 1;
    while capacity < end as u128 {
        capacity *= 16;
        width += 1;
    }
    width.max(4)
}

struct ColumnWidths {
    address: usize,
    bytes: usize,
    characters: usize,
}

impl ColumnWidths {
    fn border(&self, out: &mut String, glyphs: &FrameGlyphs, left: char, tee: char, right: char) {
        let line = glyphs.horizontal();
        out.push(left);
        out.extend(std::iter::repeat_n(line, self.address));
        out.push(tee);
        out.extend(std::iter::repeat_n(line, self.bytes));
        out.push(tee);
        out.extend(std::iter::repeat_n(line, self.characters));
        out.push(right);
        out.push('\n');
    }
}

fn header(out: &mut String, glyphs: &FrameGlyphs, widths: &ColumnWidths, bytes_per_line: usize) {
    let bar = glyphs.vertical();
    out.push(bar);
    push_fitted(out, "Offset", widths.address);
    out.push(bar);
    for column in 0..bytes_per_line {
        if column > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:02x}", column % 0x100);
    }
    out.push(bar);
    push_fitted(out, "Characters", widths.characters);
    out.push(bar);
    out.push('\n');
}

fn body_row(
    out: &mut String,
    glyphs: &FrameGlyphs,
    widths: &ColumnWidths,
    label: usize,
    cells: impl Iterator<Item = Option<u8>>,
) {
    let bar = glyphs.vertical();
    let mut characters = String::with_capacity(widths.characters);

    out.push(bar);
    let _ = write!(out, "{:0width$x}", label, width = widths.address);
    out.push(bar);
    for (column, cell) in cells.enumerate() {
        if column > 0 {
            out.push(' ');
        }
        match cell {
            Some(byte) => {
                let _ = write!(out, "{byte:02x}");
                characters.push(printable(byte));
            }
            None => {
                out.push_str(FILLER);
                characters.push(' ');
            }
        }
    }
    out.push(bar);
    out.push_str(&characters);
    out.push(bar);
    out.push('\n');
}

/// Control characters are shown as a blank; every other byte as the
/// character with the same code point.
fn printable(byte: u8) -> char {
    let c = char::from(byte);
    if c.is_control() {
        ' '
    } else {
        c
    }
}

/// Pads `label` with blanks or cuts it to exactly `width` characters.
fn push_fitted(out: &mut String, label: &str, width: usize) {
    let len = label.chars().count();
    out.extend(label.chars().take(width));
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(len)));
}
