use anyhow::{Context, Result, anyhow};
use chrono::Local;
use std::{
    fmt::{self, Display},
    fs::File,
    io::{self, IsTerminal, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{
        FmtContext, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

use crate::config::LoggingConfig;

const DEFAULT_FILTER: &str = "info";

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";
const CYAN: &str = "\x1b[36m";

fn level_style(level: Level) -> &'static str {
    match level {
        Level::ERROR => "\x1b[1;31m",
        Level::WARN => "\x1b[1;33m",
        Level::INFO => "\x1b[1;32m",
        Level::DEBUG => "\x1b[1;34m",
        Level::TRACE => "\x1b[1;35m",
    }
}

fn paint(
    writer: &mut Writer<'_>,
    style: &str,
    text: impl Display,
) -> fmt::Result {
    if writer.has_ansi_escapes() {
        write!(writer, "{style}{text}{RESET} ")
    } else {
        write!(writer, "{text} ")
    }
}

/// `<local time> <level> <target> <fields>`, one record per line.
struct CliFormat;

impl<S, N> FormatEvent<S, N> for CliFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();

        paint(
            &mut writer,
            DIM,
            Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"),
        )?;
        paint(
            &mut writer,
            level_style(*meta.level()),
            format_args!("{:>5}", meta.level()),
        )?;
        paint(&mut writer, CYAN, meta.target())?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

// --- Log file ---

type SharedFile = Arc<Mutex<Option<File>>>;

fn lock(file: &SharedFile) -> MutexGuard<'_, Option<File>> {
    file.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writer for the file layer. Records are dropped while no file is open.
#[derive(Clone)]
struct LogFile(SharedFile);

struct LogFileWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for LogFileWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        self.0.as_mut().map_or(Ok(buf.len()), |f| f.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.as_mut().map_or(Ok(()), |f| f.flush())
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileWriter(lock(&self.0))
    }
}

// --- Runtime controls ---

type Reload = Box<dyn Fn(EnvFilter) -> Result<()> + Send + Sync>;

/// Handles kept after the subscriber is installed.
struct Controls {
    /// Global filter, the ceiling for every layer.
    level: Reload,
    /// Per-layer gate on stderr output.
    stderr: Reload,
    file: SharedFile,
}

static CONTROLS: OnceLock<Controls> = OnceLock::new();

fn reloader<S>(
    handle: reload::Handle<EnvFilter, S>,
    what: &'static str,
) -> Reload
where
    S: Subscriber + Send + Sync + 'static,
{
    Box::new(move |filter| {
        handle
            .reload(filter)
            .map_err(|e| anyhow!("{what} filter reload failed: {e}"))
    })
}

fn controls() -> Result<&'static Controls> {
    CONTROLS
        .get()
        .ok_or_else(|| anyhow!("logging not yet initialized"))
}

/// Filter directive to install: the command line beats the config file,
/// and neither replaces a `RUST_LOG` filter.
fn effective_level<'a>(
    level_override: Option<&'a str>,
    configured: Option<&'a str>,
    rust_log_set: bool,
) -> Option<&'a str> {
    if rust_log_set {
        return None;
    }
    level_override.or(configured)
}

// --- Public API ---

/// Replaces the active filter. Takes a bare level such as `debug` or a full
/// `EnvFilter` directive.
pub fn set_log_level(level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_new(level).map_err(|e| anyhow!("invalid log level '{level}': {e}"))?;
    (controls()?.level)(filter)
}

/// Turns log output on stderr on or off. File logging is unaffected.
pub fn set_stderr_enabled(enabled: bool) -> Result<()> {
    let gate = if enabled { "trace" } else { "off" };
    (controls()?.stderr)(EnvFilter::new(gate))
}

/// Appends records to `path`, replacing any open log file. The parent
/// directory must exist.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file '{}'", path.display()))?;

    *lock(&controls()?.file) = Some(file);
    Ok(())
}

pub fn disable_file_logging() {
    if let Ok(controls) = controls() {
        *lock(&controls.file) = None;
    }
}

/// Installs the global subscriber. Call once at startup.
///
/// Records go to stderr, colored on a terminal, so command output on stdout
/// stays clean. The filter is `RUST_LOG` when set, `info` otherwise.
pub fn init_default_logging() {
    let file: SharedFile = Arc::new(Mutex::new(None));

    let initial =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let (level_layer, level_handle) = reload::Layer::new(initial);
    let (stderr_gate, stderr_handle) = reload::Layer::new(EnvFilter::new("trace"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(CliFormat)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_filter(stderr_gate);

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(CliFormat)
        .with_ansi(false)
        .with_writer(LogFile(file.clone()));

    let installed = tracing_subscriber::registry()
        .with(level_layer)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    if installed.is_ok() {
        let _ = CONTROLS.set(Controls {
            level: reloader(level_handle, "level"),
            stderr: reloader(stderr_handle, "stderr"),
            file,
        });
    }
}

/// Applies the `[logging]` section of the config file, with `level_override`
/// taken from the command line.
pub fn apply_config(
    config: &LoggingConfig,
    level_override: Option<&str>,
) -> Result<()> {
    let rust_log_set = std::env::var_os(EnvFilter::DEFAULT_ENV).is_some();
    if let Some(level) = effective_level(level_override, config.level.as_deref(), rust_log_set) {
        set_log_level(level)?;
    }

    set_stderr_enabled(config.stderr)?;

    match &config.file {
        Some(path) => enable_file_logging(path),
        None => {
            disable_file_logging();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn command_line_level_beats_config() {
        assert_eq!(effective_level(Some("debug"), Some("warn"), false), Some("debug"));
        assert_eq!(effective_level(None, Some("warn"), false), Some("warn"));
        assert_eq!(effective_level(None, None, false), None);
    }

    #[test]
    fn rust_log_keeps_its_filter() {
        assert_eq!(effective_level(Some("debug"), Some("warn"), true), None);
    }

    #[test]
    fn every_level_has_its_own_color() {
        let styles = [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE]
            .map(level_style);

        for (i, style) in styles.iter().enumerate() {
            assert!(!styles[i + 1..].contains(style), "{style:?} reused");
        }
    }

    #[test]
    fn log_file_writer_discards_without_file() {
        let log = LogFile(Arc::new(Mutex::new(None)));

        assert_eq!(log.make_writer().write(b"dropped").unwrap(), 7);
    }
}
