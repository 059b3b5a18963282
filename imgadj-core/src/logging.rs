use crate::Result;
use chrono::Utc;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only, timestamped record of one adjustment run.
pub struct RunJournal {
    image_name: String,
    log_file: PathBuf,
}

impl RunJournal {
    pub fn new(image_path: &Path) -> Result<Self> {
        let logs_dir = crate::Config::state_dir()?.join("logs");
        Ok(Self::in_dir(image_path, &logs_dir))
    }

    pub fn in_dir(image_path: &Path, logs_dir: &Path) -> Self {
        let image_name = image_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let log_file = logs_dir.join(format!("{image_name}.log"));

        Self {
            image_name,
            log_file,
        }
    }

    pub fn init(&self) -> Result<()> {
        if let Some(parent) = self.log_file.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.log_file
    }

    pub fn log(&self, level: LogLevel, message: &str) -> Result<()> {
        let timestamp = Utc::now();
        let log_entry = format!(
            "{} [{}] [{}] {}\n",
            timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            level.as_str(),
            self.image_name,
            message
        );

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;

        file.write_all(log_entry.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    pub fn info(&self, message: &str) -> Result<()> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> Result<()> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> Result<()> {
        self.log(LogLevel::Error, message)
    }
}

/// Receives a run's steps and change lines while the run is in progress,
/// so a run that fails halfway leaves a record of what it already did.
pub trait RunLog {
    fn record(&self, level: LogLevel, message: &str) -> Result<()>;
}

impl RunLog for RunJournal {
    fn record(&self, level: LogLevel, message: &str) -> Result<()> {
        self.log(level, message)
    }
}

/// Keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl RunLog for NullLog {
    fn record(&self, _level: LogLevel, _message: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}
