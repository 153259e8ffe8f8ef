//! i3bar JSON stream backend
//!
//! The bar reads a header object, then an endless JSON array whose
//! elements are arrays of block objects, one element per line:
//!
//! ```text
//! {"version":1,"click_events":true}
//! [[]
//! ,[{"full_text":""},{"":"","full_text":"12:00"}]
//! ]
//! ```
//!
//! Every element starts with an empty placeholder object and every block
//! object with an empty `"":""` pair, so each following field and object
//! can be written with a leading comma.

use std::io::{self, Write};
use std::sync::Arc;

use crate::backend::RenderBackend;
use crate::block::Block;
use crate::diagnostic::{Diagnostic, DiagnosticSink, DiagnosticTarget, Registration};
use crate::error::BarResult;
use crate::json;
use crate::keys::{self, KeyKind};
use crate::registry::BlockRegistry;
use crate::surface::SharedSurface;

/// Protocol header followed by the opening of the endless array.
pub const PREAMBLE: &str = "{\"version\":1,\"click_events\":true}\n[[]\n";

/// Closes the endless array.
pub const EPILOGUE: &str = "]\n";

const ELEMENT_OPEN: &str = ",[{\"full_text\":\"\"}";
const ELEMENT_CLOSE: &str = "]\n";

const DIAGNOSTIC_HINT: &str = ". Increase log level and/or check stderr for details.";

#[derive(Debug)]
pub struct StreamBackend {
    sink: DiagnosticSink,
    registration: Option<Registration>,
}

impl StreamBackend {
    pub fn new(sink: DiagnosticSink) -> Self {
        Self {
            sink,
            registration: None,
        }
    }
}

impl RenderBackend for StreamBackend {
    fn start(&mut self, surface: &SharedSurface) -> BarResult<()> {
        {
            let mut surface = surface.lock();
            let out = surface.writer();
            out.write_all(PREAMBLE.as_bytes())?;
            out.flush()?;
        }

        // from now on severe messages preempt the status line
        let overlay = StreamOverlay {
            surface: Arc::clone(surface),
        };
        self.registration = Some(self.sink.register(Arc::new(overlay)));
        Ok(())
    }

    fn stop(&mut self, surface: &SharedSurface) -> BarResult<()> {
        self.registration = None;

        let mut surface = surface.lock();
        let out = surface.writer();
        out.write_all(EPILOGUE.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    fn dump(&self, out: &mut dyn Write, blocks: &BlockRegistry) -> io::Result<()> {
        out.write_all(ELEMENT_OPEN.as_bytes())?;

        for block in blocks.iter() {
            if block.full_text().is_some() {
                write_block(out, block)?;
            } else {
                tracing::trace!("[{}] no text to display, skipping", block.label());
            }
        }

        out.write_all(ELEMENT_CLOSE.as_bytes())?;
        out.flush()
    }
}

fn write_block(out: &mut dyn Write, block: &Block) -> io::Result<()> {
    out.write_all(b",{\"\":\"\"")?;

    for (key, value) in block.attributes().iter() {
        let kind = keys::key_kind(key);
        if kind == KeyKind::Unknown {
            continue;
        }

        match value {
            Some(value) => write!(out, ",\"{key}\":{}", encode_value(kind, value))?,
            None => write!(out, ",\"{key}\":null")?,
        }
    }

    out.write_all(b"}")
}

/// Renders one attribute value the way its key is typed on the wire.
///
/// String-typed values are quoted unless already quoted. Other values
/// pass through when they are valid JSON and fall back to a string.
fn encode_value(kind: KeyKind, value: &str) -> String {
    let verbatim = match kind {
        KeyKind::StringTyped => json::is_string(value),
        KeyKind::RawTyped | KeyKind::Unknown => json::is_valid(value),
    };

    if verbatim {
        value.to_string()
    } else {
        json::escape(value)
    }
}

/// Writes the single urgent line standing in for a severe message.
pub fn write_diagnostic(out: &mut dyn Write, diagnostic: &Diagnostic) -> io::Result<()> {
    let prefix = diagnostic.severity.prefix();
    let message = &diagnostic.message;
    let full_text = json::escape(&format!("{prefix}{message}{DIAGNOSTIC_HINT}"));
    let short_text = json::escape(&format!("{prefix}{message}"));

    out.write_all(ELEMENT_OPEN.as_bytes())?;
    write!(
        out,
        ",{{\"\":\"\" ,\"full_text\":{full_text},\"short_text\":{short_text},\"urgent\":\"true\",\"color\":\"{}\"}}",
        diagnostic.severity.color()
    )?;
    out.write_all(ELEMENT_CLOSE.as_bytes())?;
    out.flush()
}

/// Diagnostic target writing straight to the surface, bypassing the
/// frozen check, then freezing it.
struct StreamOverlay {
    surface: SharedSurface,
}

impl DiagnosticTarget for StreamOverlay {
    fn display(&self, diagnostic: &Diagnostic) {
        // a diagnostic raised mid-redraw cannot take over the line
        let Some(mut surface) = self.surface.try_lock() else {
            tracing::debug!("surface busy, not displaying: {}", diagnostic.message);
            return;
        };

        if let Err(err) = write_diagnostic(surface.writer(), diagnostic) {
            tracing::debug!("failed to display diagnostic: {err}");
        }
        surface.freeze(diagnostic.clone());
    }
}
