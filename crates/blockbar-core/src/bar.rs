//! The status line aggregate
//!
//! A [`Bar`] owns the block registry, the active render backend and the
//! shared output surface. Dropping it stops the backend first and only
//! then releases the blocks.

use std::io::Write;

use crate::attrs::AttributeMap;
use crate::backend::{Mode, RenderBackend};
use crate::diagnostic::DiagnosticSink;
use crate::error::BarResult;
use crate::registry::BlockRegistry;
use crate::surface::{SharedSurface, Surface};

pub struct Bar {
    backend: Box<dyn RenderBackend>,
    surface: SharedSurface,
    blocks: BlockRegistry,
}

impl std::fmt::Debug for Bar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bar")
            .field("blocks", &self.blocks.len())
            .field("surface", &self.surface)
            .finish()
    }
}

impl Bar {
    /// Creates a bar holding only the head block and starts `mode`.
    ///
    /// In [`Mode::Stream`] the bar becomes the holder of `sink` until it
    /// is dropped.
    pub fn new(
        mode: Mode,
        out: impl Write + Send + 'static,
        sink: &DiagnosticSink,
    ) -> BarResult<Self> {
        Self::with_backend(mode.backend(sink), out)
    }

    pub fn with_backend(
        mut backend: Box<dyn RenderBackend>,
        out: impl Write + Send + 'static,
    ) -> BarResult<Self> {
        let surface = Surface::shared(out);
        backend.start(&surface)?;

        Ok(Self {
            backend,
            surface,
            blocks: BlockRegistry::new(),
        })
    }

    /// Appends one block per configuration section, in order.
    pub fn load(&mut self, sections: impl IntoIterator<Item = AttributeMap>) {
        for section in sections {
            let id = self.blocks.append(section);
            tracing::debug!(
                "added block {} ({})",
                id.index(),
                self.blocks.get(id).map(|b| b.label()).unwrap_or_default()
            );
        }
    }

    pub fn blocks(&self) -> &BlockRegistry {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut BlockRegistry {
        &mut self.blocks
    }

    pub fn is_frozen(&self) -> bool {
        self.surface.lock().is_frozen()
    }

    #[cfg(test)]
    pub(crate) fn render_state(&self) -> crate::surface::RenderState {
        self.surface.lock().state().clone()
    }

    /// Redraws every block, unless a diagnostic is showing.
    pub fn dump(&self) -> BarResult<()> {
        let mut surface = self.surface.lock();
        if surface.is_frozen() {
            tracing::debug!("bar frozen, skipping");
            return Ok(());
        }

        self.backend.dump(surface.writer(), &self.blocks)?;
        Ok(())
    }

    /// Dismisses a showing diagnostic. Returns true if one was showing.
    pub(crate) fn unfreeze(&self) -> bool {
        self.surface.lock().unfreeze()
    }
}

impl Drop for Bar {
    fn drop(&mut self) {
        if let Err(err) = self.backend.stop(&self.surface) {
            tracing::debug!("failed to stop backend: {err}");
        }
    }
}
