//! Output stream and what it currently shows
//!
//! Periodic redraws, the click loop and the diagnostic overlay all write
//! through one [`Surface`]. Each writer locks it for exactly one full
//! protocol line.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::diagnostic::Diagnostic;

/// What the status line is currently displaying.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RenderState {
    /// Regular block output, redraws go through.
    #[default]
    Normal,
    /// A severe message is shown; redraws are suppressed until a click.
    Overlay(Diagnostic),
}

pub struct Surface {
    out: Box<dyn Write + Send>,
    state: RenderState,
}

/// Surface shared between the bar and its diagnostic overlay.
pub type SharedSurface = Arc<Mutex<Surface>>;

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface").field("state", &self.state).finish()
    }
}

impl Surface {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Box::new(out),
            state: RenderState::Normal,
        }
    }

    pub fn shared(out: impl Write + Send + 'static) -> SharedSurface {
        Arc::new(Mutex::new(Self::new(out)))
    }

    pub fn writer(&mut self) -> &mut dyn Write {
        &mut *self.out
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self.state, RenderState::Overlay(_))
    }

    /// Shows `diagnostic` until the next unfreeze. Idempotent: a newer
    /// diagnostic simply replaces the previous one.
    pub fn freeze(&mut self, diagnostic: Diagnostic) {
        self.state = RenderState::Overlay(diagnostic);
    }

    /// Returns true if the surface was frozen.
    pub fn unfreeze(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            RenderState::Overlay(diagnostic) => {
                tracing::debug!("dismissing diagnostic: {}", diagnostic.message);
                true
            }
            RenderState::Normal => false,
        }
    }
}
