//! Rolling Logger
//!
//! Process-wide logging for the shared to-do client.
//! - Formatted lines go to `<log_dir>/<app_name>.log`, rotated by size
//! - The most recent lines stay in an in-memory circular buffer
//! - `log` records are bridged into `tracing`

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;

const DEFAULT_BUFFER_LINES: usize = 500;
const DEFAULT_MAX_BYTES: u64 = 1024 * 1024;
const DEFAULT_MAX_FILES: usize = 3;

static GLOBAL: OnceLock<RollingLogger> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("failed to open log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("a global logger is already installed: {0}")]
    AlreadyInitialized(String),
    #[error("logger has not been initialized")]
    NotInitialized,
}

/// Logger settings
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Base name of the log file
    pub app_name: String,
    /// Directory for log files (None = memory buffer only)
    pub log_dir: Option<PathBuf>,
    /// Capacity of the recent-lines buffer
    pub buffer_lines: usize,
    /// Size at which the active file is rotated (0 = never)
    pub max_bytes: u64,
    /// Number of rotated backups kept next to the active file
    pub max_files: usize,
    pub level: Level,
}

impl LoggerConfig {
    pub fn new(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            log_dir: None,
            buffer_lines: DEFAULT_BUFFER_LINES,
            max_bytes: DEFAULT_MAX_BYTES,
            max_files: DEFAULT_MAX_FILES,
            level: Level::INFO,
        }
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }
}

struct LogSink {
    config: LoggerConfig,
    file: Option<File>,
    written: u64,
    recent: VecDeque<String>,
}

impl LogSink {
    fn log_path(&self) -> Option<PathBuf> {
        self.config
            .log_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.log", self.config.app_name)))
    }

    fn push(&mut self, line: &str) {
        if self.config.buffer_lines > 0 {
            while self.recent.len() >= self.config.buffer_lines {
                self.recent.pop_front();
            }
            self.recent.push_back(line.to_string());
        }

        let bytes = line.len() as u64 + 1;
        if self.config.max_bytes > 0 && self.written > 0 && self.written + bytes > self.config.max_bytes {
            self.rotate();
        }

        if let Some(file) = self.file.as_mut() {
            // A failing log file cannot be reported anywhere but the buffer.
            if writeln!(file, "{}", line).is_ok() {
                self.written += bytes;
            }
        }
    }

    fn rotate(&mut self) {
        let Some(path) = self.log_path() else {
            return;
        };
        self.file = None;

        let backup = |n: usize| path.with_extension(format!("log.{}", n));
        if self.config.max_files == 0 {
            let _ = fs::remove_file(&path);
        } else {
            let _ = fs::remove_file(backup(self.config.max_files));
            for n in (1..self.config.max_files).rev() {
                let _ = fs::rename(backup(n), backup(n + 1));
            }
            let _ = fs::rename(&path, backup(1));
        }

        self.file = open_append(&path).ok();
        self.written = 0;
    }
}

fn open_append(path: &Path) -> Result<File, LoggerError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggerError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Shared handle to the log sink
#[derive(Clone)]
pub struct RollingLogger {
    sink: Arc<Mutex<LogSink>>,
}

impl RollingLogger {
    /// Create a logger, opening (or creating) the active log file
    pub fn new(config: LoggerConfig) -> Result<Self, LoggerError> {
        let mut sink = LogSink {
            config,
            file: None,
            written: 0,
            recent: VecDeque::new(),
        };

        if let (Some(dir), Some(path)) = (sink.config.log_dir.clone(), sink.log_path()) {
            fs::create_dir_all(&dir).map_err(|source| LoggerError::Io {
                path: dir.clone(),
                source,
            })?;
            let file = open_append(&path)?;
            sink.written = file.metadata().map(|m| m.len()).unwrap_or(0);
            sink.file = Some(file);
        }

        Ok(Self {
            sink: Arc::new(Mutex::new(sink)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, LogSink> {
        self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append one line to the buffer and the active file
    pub fn record(&self, line: &str) {
        self.lock().push(line);
    }

    /// Most recent lines, oldest first
    pub fn recent_entries(&self) -> Vec<String> {
        self.lock().recent.iter().cloned().collect()
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.lock().log_path()
    }
}

impl<'a> MakeWriter<'a> for RollingLogger {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter {
            logger: self.clone(),
            buf: Vec::new(),
        }
    }
}

/// Collects one formatted event and commits it on drop
pub struct LineWriter {
    logger: RollingLogger,
    buf: Vec<u8>,
}

impl Write for LineWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(&self.buf);
        let mut sink = self.logger.lock();
        for line in text.lines().filter(|l| !l.is_empty()) {
            sink.push(line);
        }
    }
}

/// Local wall-clock timestamps, `HH:MM:SS.mmm`
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Initialize the global logger writing into `log_dir`
pub fn init_logger(log_dir: impl Into<PathBuf>, app_name: &str) -> Result<RollingLogger, LoggerError> {
    init_with(LoggerConfig::new(app_name).with_log_dir(log_dir))
}

/// Initialize the global logger from a full config
pub fn init_with(config: LoggerConfig) -> Result<RollingLogger, LoggerError> {
    let level = config.level;
    let logger = RollingLogger::new(config)?;

    tracing_subscriber::fmt()
        .with_writer(logger.clone())
        .with_ansi(false)
        .with_timer(LocalTime)
        .with_max_level(level)
        .try_init()
        .map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))?;

    GLOBAL
        .set(logger.clone())
        .map_err(|_| LoggerError::AlreadyInitialized("rolling logger".to_string()))?;
    Ok(logger)
}

fn global() -> Result<&'static RollingLogger, LoggerError> {
    GLOBAL.get().ok_or(LoggerError::NotInitialized)
}

pub fn info(msg: &str) -> Result<(), LoggerError> {
    global()?;
    tracing::info!("{}", msg);
    Ok(())
}

pub fn warn(msg: &str) -> Result<(), LoggerError> {
    global()?;
    tracing::warn!("{}", msg);
    Ok(())
}

pub fn error(msg: &str) -> Result<(), LoggerError> {
    global()?;
    tracing::error!("{}", msg);
    Ok(())
}

/// Recent lines of the global logger (empty before init)
pub fn recent_entries() -> Vec<String> {
    global().map(|l| l.recent_entries()).unwrap_or_default()
}
