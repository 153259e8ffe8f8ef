//! Click event dispatch
//!
//! i3bar sends one JSON object per line on stdin for every click. Each
//! is matched to a block by its `name` and `instance`, merged into the
//! block's attributes, and the block's click callback runs.

use std::collections::VecDeque;
use std::io::{self, BufRead};

use crate::attrs::AttributeMap;
use crate::bar::Bar;
use crate::error::BarResult;

/// Result of asking a [`LineReader`] for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// One complete line, without its terminator.
    Line(String),
    /// The input is closed.
    EndOfStream,
    /// No complete line is available yet.
    WouldBlock,
}

pub trait LineReader {
    fn read_line(&mut self) -> io::Result<ReadOutcome>;
}

/// In-memory line queue. Reports [`ReadOutcome::WouldBlock`] when drained.
#[derive(Debug, Default, Clone)]
pub struct QueueReader {
    lines: VecDeque<String>,
}

impl QueueReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
    }
}

impl LineReader for QueueReader {
    fn read_line(&mut self) -> io::Result<ReadOutcome> {
        Ok(self
            .lines
            .pop_front()
            .map_or(ReadOutcome::WouldBlock, ReadOutcome::Line))
    }
}

/// Blocking reader over any [`BufRead`].
#[derive(Debug)]
pub struct BufLineReader<R> {
    inner: R,
}

impl<R: BufRead> BufLineReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: BufRead> LineReader for BufLineReader<R> {
    fn read_line(&mut self) -> io::Result<ReadOutcome> {
        loop {
            let mut raw = Vec::new();
            match self.inner.read_until(b'\n', &mut raw) {
                Ok(0) => return Ok(ReadOutcome::EndOfStream),
                Ok(_) => match decode_line(raw) {
                    Some(line) => return Ok(ReadOutcome::Line(line)),
                    None => continue,
                },
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                    ) =>
                {
                    return Ok(ReadOutcome::WouldBlock)
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Decodes one raw input line without its terminator.
///
/// Lines that are not UTF-8 are malformed clicks: traced and dropped.
pub(crate) fn decode_line(raw: Vec<u8>) -> Option<String> {
    match String::from_utf8(raw) {
        Ok(mut line) => {
            let trimmed = line.trim_end_matches(['\n', '\r']).len();
            line.truncate(trimmed);
            Some(line)
        }
        Err(err) => {
            tracing::debug!("ignoring click line that is not UTF-8: {err}");
            None
        }
    }
}

/// Strips the i3bar array framing around a click object.
///
/// The click stream is itself an endless JSON array: a lone `[` first,
/// then objects prefixed with `,`.
fn click_object(line: &str) -> Option<&str> {
    let line = line.trim();
    let line = line.strip_prefix(',').unwrap_or(line).trim_start();
    if line.is_empty() || line == "[" {
        None
    } else {
        Some(line)
    }
}

impl Bar {
    /// Processes click lines until the reader has nothing more.
    ///
    /// A showing diagnostic is dismissed first, since any input means the
    /// user interacted with the bar. Running out of input, for now or for
    /// good, ends the loop successfully. Unparsable lines and clicks on
    /// unknown blocks are skipped; reader and callback errors stop the loop.
    pub fn click(&mut self, reader: &mut dyn LineReader) -> BarResult<()> {
        if self.unfreeze() {
            self.dump()?;
        }

        loop {
            let line = match reader.read_line()? {
                ReadOutcome::Line(line) => line,
                ReadOutcome::EndOfStream | ReadOutcome::WouldBlock => return Ok(()),
            };

            let Some(object) = click_object(&line) else {
                continue;
            };

            let click = match AttributeMap::from_json_object(object) {
                Ok(click) => click,
                Err(err) => {
                    tracing::debug!("ignoring malformed click {line:?}: {err}");
                    continue;
                }
            };

            let name = click.get("name").unwrap_or_default();
            let instance = click.get("instance").unwrap_or_default();
            let Some(id) = self.blocks().find(name, instance) else {
                tracing::debug!("no block for click on {name:?}/{instance:?}");
                continue;
            };

            if let Some(block) = self.blocks_mut().get_mut(id) {
                block.set_all_from(&click);
                block.click()?;
            }
        }
    }
}
