//! Process-wide rolling file log.
//!
//! Lines are `key=value` metadata: event, module, status, tenant and record
//! ids, counts. Contact names, phone numbers and todo text stay out of logs.
//!
//! The logger can be started once per process. Asking again with the same
//! level and directory is a no-op; anything else is an error.

use flexi_logger::{
    Age, Cleanup, Criterion, FileSpec, FlexiLoggerError, LogSpecification, Logger,
    LoggerHandle, Naming, WriteMode,
};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Once;

const FILE_BASENAME: &str = "recondesk";
const ROTATE_AT_BYTES: u64 = 5 * 1024 * 1024;
const KEEP_FILES: usize = 7;
const PANIC_SNIPPET_CHARS: usize = 200;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: Once = Once::new();

struct ActiveLogger {
    level: LevelFilter,
    dir: PathBuf,
    _handle: LoggerHandle,
}

#[derive(Debug)]
pub enum LoggingError {
    UnknownLevel(String),
    RelativeDir(PathBuf),
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    /// Logging already runs with a different level or directory.
    AlreadyActive { level: LevelFilter, dir: PathBuf },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLevel(value) => write!(
                f,
                "unknown log level `{value}` (use off, error, warn, info, debug or trace)"
            ),
            Self::RelativeDir(dir) => {
                write!(f, "log directory must be absolute: {}", dir.display())
            }
            Self::CreateDir { dir, source } => {
                write!(f, "cannot create log directory {}: {source}", dir.display())
            }
            Self::Backend(err) => write!(f, "logger failed to start: {err}"),
            Self::AlreadyActive { level, dir } => write!(
                f,
                "logging already active at level {level} in {}",
                dir.display()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

/// Parses a level name, case-insensitively. `warning` is accepted for `warn`.
pub fn parse_level(value: &str) -> Result<LevelFilter, LoggingError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("warning") {
        return Ok(LevelFilter::Warn);
    }
    LevelFilter::from_str(trimmed).map_err(|_| LoggingError::UnknownLevel(trimmed.to_string()))
}

pub fn default_log_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Starts writing `recondesk*.log` files into `dir`, rotating daily or at
/// 5 MiB and keeping the newest seven.
pub fn init_logging(level: LevelFilter, dir: impl AsRef<Path>) -> Result<(), LoggingError> {
    let dir = dir.as_ref();
    if !dir.is_absolute() {
        return Err(LoggingError::RelativeDir(dir.to_path_buf()));
    }
    let active = ACTIVE.get_or_try_init(|| start(level, dir))?;
    if active.level != level || active.dir != dir {
        return Err(LoggingError::AlreadyActive {
            level: active.level,
            dir: active.dir.clone(),
        });
    }
    Ok(())
}

/// Level and directory of the running logger, if any.
pub fn logging_status() -> Option<(LevelFilter, PathBuf)> {
    ACTIVE.get().map(|active| (active.level, active.dir.clone()))
}

fn start(level: LevelFilter, dir: &Path) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        dir: dir.to_path_buf(),
        source,
    })?;

    let filter = LogSpecification::builder().default(level).build();
    let handle = Logger::with(filter)
        .log_to_file(FileSpec::default().directory(dir).basename(FILE_BASENAME))
        .rotate(
            Criterion::AgeOrSize(Age::Day, ROTATE_AT_BYTES),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(KEEP_FILES),
        )
        .append()
        .write_mode(WriteMode::BufferAndFlush)
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(LoggingError::Backend)?;

    PANIC_HOOK.call_once(install_panic_hook);
    info!(
        "event=logging_init module=logging status=ok level={level} dir={} os={} version={}",
        dir.display(),
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        level,
        dir: dir.to_path_buf(),
        _handle: handle,
    })
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|text| text.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_default();
        let at = info
            .location()
            .map(|location| format!("{}:{}", location.file(), location.line()))
            .unwrap_or_default();
        error!(
            "event=panic module=logging status=error at={at} payload={}",
            one_line(&payload, PANIC_SNIPPET_CHARS)
        );
        previous(info);
    }));
}

fn one_line(text: &str, max_chars: usize) -> String {
    let mut flat: String = text
        .chars()
        .map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch })
        .take(max_chars)
        .collect();
    if text.chars().nth(max_chars).is_some() {
        flat.push_str("...");
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, one_line, parse_level, LoggingError};
    use log::LevelFilter;

    #[test]
    fn parse_level_is_case_insensitive_and_knows_warning() {
        assert_eq!(parse_level(" DEBUG ").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level("warning").unwrap(), LevelFilter::Warn);
        assert!(matches!(
            parse_level("chatty"),
            Err(LoggingError::UnknownLevel(_))
        ));
    }

    #[test]
    fn one_line_flattens_and_caps() {
        assert_eq!(one_line("call\nback\rlater", 6), "call b...");
        assert_eq!(one_line("short", 10), "short");
        assert_eq!(one_line("exact", 5), "exact");
    }

    #[test]
    fn logger_starts_once_and_rejects_a_different_setup() {
        assert!(matches!(
            init_logging(LevelFilter::Info, "relative/logs"),
            Err(LoggingError::RelativeDir(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        init_logging(LevelFilter::Info, dir.path()).unwrap();
        init_logging(LevelFilter::Info, dir.path()).unwrap();

        assert!(matches!(
            init_logging(LevelFilter::Debug, dir.path()),
            Err(LoggingError::AlreadyActive { .. })
        ));
        assert!(matches!(
            init_logging(LevelFilter::Info, other.path()),
            Err(LoggingError::AlreadyActive { .. })
        ));
        assert_eq!(
            logging_status(),
            Some((LevelFilter::Info, dir.path().to_path_buf()))
        );
    }
}
