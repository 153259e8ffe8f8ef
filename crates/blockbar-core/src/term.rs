//! Plain terminal backend.

use std::io::{self, Write};

use crossterm::cursor::{Hide, RestorePosition, SavePosition, Show};
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;

use crate::backend::RenderBackend;
use crate::error::BarResult;
use crate::registry::BlockRegistry;
use crate::surface::SharedSurface;

/// Redraws every block's `full_text` on one terminal line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBackend;

fn restore_and_clear(out: &mut dyn Write) -> io::Result<()> {
    out.queue(RestorePosition)?
        .queue(Clear(ClearType::UntilNewLine))?;
    Ok(())
}

impl RenderBackend for TerminalBackend {
    fn start(&mut self, surface: &SharedSurface) -> BarResult<()> {
        let mut surface = surface.lock();
        let out = surface.writer();
        out.queue(SavePosition)?.queue(Hide)?;
        restore_and_clear(out)?;
        out.flush()?;
        Ok(())
    }

    fn stop(&mut self, surface: &SharedSurface) -> BarResult<()> {
        let mut surface = surface.lock();
        let out = surface.writer();
        out.queue(Show)?;
        out.flush()?;
        Ok(())
    }

    fn dump(&self, out: &mut dyn Write, blocks: &BlockRegistry) -> io::Result<()> {
        restore_and_clear(out)?;
        for text in blocks.iter().filter_map(|block| block.full_text()) {
            write!(out, "{text} ")?;
        }
        out.flush()
    }
}
