//! Sources: producers of stored record streams.
//!
//! A source replays records logged earlier, for analysis or for feeding them
//! to other sinks through [`Dispatcher::replay`](crate::Dispatcher::replay),
//! e.g. to turn a binary log into a text log.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::codec::RecordReader;
use crate::error::Result;
use crate::record::Record;

pub trait Source {
    /// Remaining records, in stored order. Iteration ends after the first
    /// error.
    fn records(&mut self) -> Box<dyn Iterator<Item = Result<Record>> + '_>;
}

/// Reads a file written by [`BinaryFileSink`](crate::sink::BinaryFileSink).
pub struct BinaryFileSource {
    path: PathBuf,
    reader: RecordReader<BufReader<File>>,
}

impl BinaryFileSource {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::open(&path)?;
        Ok(Self {
            path,
            reader: RecordReader::new(BufReader::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Source for BinaryFileSource {
    fn records(&mut self) -> Box<dyn Iterator<Item = Result<Record>> + '_> {
        Box::new(&mut self.reader)
    }
}
