//! Render backends
//!
//! A backend knows how to open, redraw and close one output format.
//! Two are provided: [`TerminalBackend`](crate::term::TerminalBackend)
//! for a plain terminal and [`StreamBackend`](crate::stream::StreamBackend)
//! for the i3bar JSON protocol.

use std::io::{self, Write};

use crate::diagnostic::DiagnosticSink;
use crate::error::BarResult;
use crate::registry::BlockRegistry;
use crate::stream::StreamBackend;
use crate::surface::SharedSurface;
use crate::term::TerminalBackend;

/// Output format selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Cursor-addressed plain text for interactive terminals.
    Terminal,
    /// Line-delimited i3bar JSON protocol.
    #[default]
    Stream,
}

impl Mode {
    /// Builds the backend for this mode.
    ///
    /// Only the stream backend uses `sink`; the terminal ignores diagnostics.
    pub fn backend(self, sink: &DiagnosticSink) -> Box<dyn RenderBackend> {
        match self {
            Mode::Terminal => Box::new(TerminalBackend),
            Mode::Stream => Box::new(StreamBackend::new(sink.clone())),
        }
    }
}

pub trait RenderBackend: Send {
    /// Writes whatever opens the output and hooks up diagnostics.
    fn start(&mut self, surface: &SharedSurface) -> BarResult<()>;

    /// Closes the output and releases diagnostics.
    fn stop(&mut self, surface: &SharedSurface) -> BarResult<()>;

    /// Writes one complete redraw of `blocks` and flushes.
    fn dump(&self, out: &mut dyn Write, blocks: &BlockRegistry) -> io::Result<()>;
}
