//! Severe message routing
//!
//! A [`DiagnosticSink`] is handed to whatever emits severe messages (the
//! logging layer, in practice). At most one [`DiagnosticTarget`] is
//! registered at a time; the active render backend registers itself on
//! start and drops its [`Registration`] on stop.
//!
//! ## Example
//!
//! ```
//! use blockbar_core::diagnostic::{Diagnostic, DiagnosticSink, DiagnosticTarget, Severity};
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//!
//! #[derive(Default)]
//! struct Collect(Mutex<Vec<String>>);
//!
//! impl DiagnosticTarget for Collect {
//!     fn display(&self, diagnostic: &Diagnostic) {
//!         self.0.lock().push(diagnostic.message.clone());
//!     }
//! }
//!
//! let sink = DiagnosticSink::new();
//! let target = Arc::new(Collect::default());
//! let registration = sink.register(target.clone());
//! sink.report(Severity::Error, "oops");
//! drop(registration);
//! sink.report(Severity::Error, "unseen");
//! assert_eq!(*target.0.lock(), ["oops"]);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Severities forwarded to the sink. Anything lower is never forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Error,
}

impl Severity {
    pub fn prefix(self) -> &'static str {
        match self {
            Severity::Fatal => "Fatal! ",
            Severity::Error => "Error: ",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Severity::Fatal => "#FF0000",
            Severity::Error => "#FF8000",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// Something able to show a severe message immediately.
pub trait DiagnosticTarget: Send + Sync {
    fn display(&self, diagnostic: &Diagnostic);
}

type Slot = Option<(u64, Arc<dyn DiagnosticTarget>)>;

/// Cloneable handle to the single diagnostic target slot.
#[derive(Clone, Default)]
pub struct DiagnosticSink {
    slot: Arc<Mutex<Slot>>,
    next_id: Arc<AtomicU64>,
}

impl fmt::Debug for DiagnosticSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticSink")
            .field("registered", &self.is_registered())
            .finish()
    }
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `target` the current holder, replacing any previous one.
    pub fn register(&self, target: Arc<dyn DiagnosticTarget>) -> Registration {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        *self.slot.lock() = Some((id, target));
        Registration {
            slot: Arc::clone(&self.slot),
            id,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Forwards a message to the current holder, if any.
    ///
    /// Returns whether a target received it.
    pub fn report(&self, severity: Severity, message: impl Into<String>) -> bool {
        // release the slot before calling out, the target may log
        let target = self.slot.lock().as_ref().map(|(_, t)| Arc::clone(t));
        match target {
            Some(target) => {
                target.display(&Diagnostic {
                    severity,
                    message: message.into(),
                });
                true
            }
            None => false,
        }
    }
}

/// Proof of holding the sink. Dropping it deregisters the target.
#[must_use = "dropping the registration deregisters the target"]
pub struct Registration {
    slot: Arc<Mutex<Slot>>,
    id: u64,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration").field("id", &self.id).finish()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        // a later registration may have replaced us
        if slot.as_ref().is_some_and(|(id, _)| *id == self.id) {
            *slot = None;
        }
    }
}

/// Tracing layer forwarding ERROR events to a [`DiagnosticSink`].
///
/// An event carrying `fatal = true` is reported as [`Severity::Fatal`].
///
/// ```ignore
/// tracing_subscriber::registry()
///     .with(DiagnosticLayer::new(sink.clone()).with_filter(LevelFilter::ERROR))
///     .init();
/// tracing::error!(fatal = true, "disk full");
/// ```
#[derive(Debug, Clone)]
pub struct DiagnosticLayer {
    sink: DiagnosticSink,
}

impl DiagnosticLayer {
    pub fn new(sink: DiagnosticSink) -> Self {
        Self { sink }
    }
}

impl<S: Subscriber> Layer<S> for DiagnosticLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::ERROR {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let severity = if visitor.fatal {
            Severity::Fatal
        } else {
            Severity::Error
        };
        self.sink.report(severity, visitor.message);
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fatal: bool,
}

impl Visit for MessageVisitor {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "fatal" {
            self.fatal = value;
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Diagnostic>>);

    impl DiagnosticTarget for Recorder {
        fn display(&self, diagnostic: &Diagnostic) {
            self.0.lock().push(diagnostic.clone());
        }
    }

    #[test]
    fn test_report_without_target() {
        let sink = DiagnosticSink::new();
        assert!(!sink.is_registered());
        assert!(!sink.report(Severity::Fatal, "nobody listens"));
    }

    #[test]
    fn test_registration_drop_deregisters() {
        let sink = DiagnosticSink::new();
        let recorder = Arc::new(Recorder::default());

        let registration = sink.register(recorder.clone());
        assert!(sink.report(Severity::Error, "one"));
        drop(registration);
        assert!(!sink.report(Severity::Error, "two"));

        assert_eq!(recorder.0.lock().len(), 1);
    }

    #[test]
    fn test_stale_registration_keeps_newer_target() {
        let sink = DiagnosticSink::new();
        let first = sink.register(Arc::new(Recorder::default()));
        let newer = Arc::new(Recorder::default());
        let _second = sink.register(newer.clone());

        drop(first);
        assert!(sink.report(Severity::Error, "still routed"));
        assert_eq!(newer.0.lock().len(), 1);
    }

    #[test]
    fn test_severity_prefix_and_color() {
        assert_eq!(Severity::Fatal.prefix(), "Fatal! ");
        assert_eq!(Severity::Fatal.color(), "#FF0000");
        assert_eq!(Severity::Error.prefix(), "Error: ");
        assert_eq!(Severity::Error.color(), "#FF8000");
    }

    #[test]
    fn test_layer_forwards_only_errors() {
        let sink = DiagnosticSink::new();
        let recorder = Arc::new(Recorder::default());
        let _registration = sink.register(recorder.clone());

        let subscriber = tracing_subscriber::registry().with(DiagnosticLayer::new(sink));
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("quiet");
            tracing::warn!("still quiet");
            tracing::error!("cannot read {}", "battery");
            tracing::error!(fatal = true, "disk full");
        });

        let seen = recorder.0.lock();
        assert_eq!(
            *seen,
            [
                Diagnostic {
                    severity: Severity::Error,
                    message: "cannot read battery".to_string(),
                },
                Diagnostic {
                    severity: Severity::Fatal,
                    message: "disk full".to_string(),
                },
            ]
        );
    }
}
