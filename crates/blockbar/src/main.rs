use anyhow::{Context, Result};
use blockbar_core::{config, sched, Bar, DiagnosticLayer, DiagnosticSink, Mode};
use clap::{Parser, ValueEnum};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::io::AsyncBufRead;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(
    name = "blockbar",
    about = "Status line generator for i3bar-compatible bars",
    version,
    author
)]
struct Args {
    /// Configuration file (defaults to the usual search path)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Output::I3bar)]
    output: Output,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Output {
    /// JSON stream for i3bar and swaybar
    I3bar,
    /// Plain line for a terminal
    Term,
}

impl From<Output> for Mode {
    fn from(output: Output) -> Self {
        match output {
            Output::I3bar => Mode::Stream,
            Output::Term => Mode::Terminal,
        }
    }
}

fn init_logging(verbose: u8, sink: &DiagnosticSink) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("blockbar={level}").parse()?)
        .add_directive(format!("blockbar_core={level}").parse()?);

    // stdout carries the bar protocol, logs go to stderr
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(fmt)
        .with(DiagnosticLayer::new(sink.clone()).with_filter(LevelFilter::ERROR))
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(err) => {
            tracing::debug!("cannot listen for SIGTERM: {err}");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn main() -> ExitCode {
    let args = Args::parse();
    let sink = DiagnosticSink::new();

    if let Err(err) = init_logging(args.verbose, &sink) {
        eprintln!("blockbar: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(args, &sink) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!("exiting: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args, sink: &DiagnosticSink) -> Result<()> {
    let bar = open_bar(
        args.output.into(),
        std::io::stdout(),
        sink,
        args.config.as_deref(),
    )?;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    serve(bar, stdin, shutdown_signal())
}

/// Starts the bar and loads its blocks.
///
/// A configuration failure is reported on the bar itself before the bar
/// is dropped, which closes the stream.
fn open_bar(
    mode: Mode,
    out: impl Write + Send + 'static,
    sink: &DiagnosticSink,
    config_path: Option<&Path>,
) -> Result<Bar> {
    let mut bar = Bar::new(mode, out, sink).context("Failed to start the bar")?;

    let config = match config::load(config_path) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(fatal = true, "Failed to load bar configuration file: {err}");
            return Err(err).context("Failed to load bar configuration file");
        }
    };

    if let Some(origin) = &config.origin {
        std::env::set_current_dir(origin)
            .with_context(|| format!("Failed to change directory to {}", origin.display()))?;
        tracing::debug!("changed directory to {}", origin.display());
    }
    bar.load(config.sections);

    Ok(bar)
}

/// Drives `bar` from `input` until the scheduler ends or `shutdown` fires.
fn serve<R, F>(mut bar: Bar, input: R, shutdown: F) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = ()>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to initialize scheduler")?;

    let result = runtime.block_on(async {
        tokio::select! {
            result = sched::run(&mut bar, input) => result.context("Scheduler stopped"),
            () = shutdown => {
                tracing::info!("shutting down");
                Ok(())
            }
        }
    });

    // close the stream first; a pending stdin read holds a blocking thread
    // that the runtime would otherwise wait on
    drop(bar);
    runtime.shutdown_background();

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockbar_core::stream::{EPILOGUE, PREAMBLE};
    use clap::CommandFactory;
    use parking_lot::Mutex;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::task::{self, Poll};
    use std::time::{Duration, Instant};
    use tokio::io::{AsyncRead, ReadBuf};

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults_to_i3bar_output() {
        let args = Args::try_parse_from(["blockbar"]).expect("parse");
        assert_eq!(args.output, Output::I3bar);
        assert_eq!(Mode::from(args.output), Mode::Stream);
        assert_eq!(args.verbose, 0);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_term_output_and_verbosity() {
        let args = Args::try_parse_from(["blockbar", "-o", "term", "-vv", "-c", "/tmp/bar.conf"])
            .expect("parse");
        assert_eq!(Mode::from(args.output), Mode::Terminal);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/bar.conf")));
    }

    #[test]
    fn test_rejects_unknown_output() {
        assert!(Args::try_parse_from(["blockbar", "--output", "html"]).is_err());
    }

    /// Writer whose bytes stay readable after the bar takes it.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Input whose read never completes and occupies a blocking thread,
    /// like stdin with no clicks.
    #[derive(Default)]
    struct StalledInput {
        started: bool,
    }

    impl AsyncRead for StalledInput {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut task::Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            if !self.started {
                self.started = true;
                tokio::task::spawn_blocking(|| std::thread::sleep(Duration::from_secs(30)));
            }
            Poll::Pending
        }
    }

    #[test]
    fn test_shutdown_closes_stream_despite_pending_input() {
        let buf = Capture::default();
        let sink = DiagnosticSink::new();
        let bar = Bar::new(Mode::Stream, buf.clone(), &sink).expect("bar");

        let started = Instant::now();
        serve(bar, tokio::io::BufReader::new(StalledInput::default()), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
        })
        .expect("serve");

        assert!(started.elapsed() < Duration::from_secs(10));
        let redraw = ",[{\"full_text\":\"\"}]\n";
        assert_eq!(
            buf.contents(),
            format!("{PREAMBLE}{redraw}{redraw}{EPILOGUE}")
        );
        assert!(!sink.is_registered());
    }

    #[test]
    fn test_config_failure_is_shown_then_stream_closes() {
        let buf = Capture::default();
        let sink = DiagnosticSink::new();
        let subscriber =
            tracing_subscriber::registry().with(DiagnosticLayer::new(sink.clone()));

        let result = tracing::subscriber::with_default(subscriber, || {
            open_bar(
                Mode::Stream,
                buf.clone(),
                &sink,
                Some(Path::new("/nonexistent/blockbar/config")),
            )
        });
        assert!(result.is_err());

        let contents = buf.contents();
        assert!(contents.starts_with(PREAMBLE));
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with(
            ",[{\"full_text\":\"\"},{\"\":\"\" ,\"full_text\":\"Fatal! Failed to load bar configuration file: "
        ));
        assert!(lines[2].ends_with("\"urgent\":\"true\",\"color\":\"#FF0000\"}]"));
        assert!(contents.ends_with(&format!("]\n{EPILOGUE}")));
        assert!(!sink.is_registered());
    }
}
