//! # blockbar-core
//!
//! Status line engine for i3bar-compatible bars.
//!
//! ## Overview
//!
//! A [`Bar`] owns an ordered [`BlockRegistry`] and renders it through one
//! of two backends: a plain terminal line, or the i3bar JSON stream
//! protocol. Click events read back from the bar are matched to blocks by
//! `name` and `instance` and forwarded into them. While the stream backend
//! is active, severe log messages preempt the status line with a single
//! urgent entry until the next click.
//!
//! ## Core Abstractions
//!
//! - [`Bar`] - aggregate root: registry, backend and output surface
//! - [`Block`] - one displayed unit and its command runner
//! - [`RenderBackend`] - start/stop/dump contract of an output format
//! - [`LineReader`] - source of click lines
//! - [`DiagnosticSink`] - injectable route for severe messages
//! - [`BarError`] - error type for all fallible operations
//!
//! ## Example
//!
//! ```
//! use blockbar_core::{AttributeMap, Bar, DiagnosticSink, Mode, QueueReader};
//!
//! let sink = DiagnosticSink::new();
//! let mut bar = Bar::new(Mode::Stream, std::io::sink(), &sink)?;
//!
//! let clock: AttributeMap = [("name", "clock"), ("full_text", "12:00")].into_iter().collect();
//! bar.load([clock]);
//! bar.dump()?;
//!
//! let mut clicks = QueueReader::new();
//! clicks.push(r#"{"name":"clock","button":1}"#);
//! bar.click(&mut clicks)?;
//! # Ok::<(), blockbar_core::BarError>(())
//! ```

pub mod attrs;
pub mod backend;
pub mod bar;
pub mod block;
pub mod click;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod json;
pub mod keys;
pub mod registry;
pub mod sched;
pub mod stream;
pub mod surface;
pub mod term;

#[cfg(test)]
pub(crate) mod test_support;

pub use attrs::AttributeMap;
pub use backend::{Mode, RenderBackend};
pub use bar::Bar;
pub use block::{Block, Interval};
pub use click::{BufLineReader, LineReader, QueueReader, ReadOutcome};
pub use config::Config;
pub use diagnostic::{Diagnostic, DiagnosticLayer, DiagnosticSink, Registration, Severity};
pub use error::{BarError, BarResult};
pub use registry::{BlockId, BlockRegistry};
pub use surface::RenderState;
