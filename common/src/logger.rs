// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

//! Best-effort widget log written to several files at once.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A sink for human readable widget events.
///
/// Logging must never fail from the caller's point of view.
pub trait Logger: Send + Sync {
    fn log(&self, message: &str);
}

impl<L: Logger + ?Sized> Logger for std::sync::Arc<L> {
    fn log(&self, message: &str) {
        (**self).log(message)
    }
}

/// Discards every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _message: &str) {}
}

/// Appends timestamped lines to every configured destination.
///
/// A destination that grew beyond `max_size` bytes is emptied before the next
/// line is appended. Write errors are ignored per destination.
#[derive(Clone, Debug)]
pub struct FileLogger {
    destinations: Vec<PathBuf>,
    max_size: u64,
}

impl FileLogger {
    pub const MAX_SIZE: u64 = 1_000_000;

    pub fn new(destinations: Vec<PathBuf>) -> Self {
        Self {
            destinations,
            max_size: Self::MAX_SIZE,
        }
    }

    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// App-private data dir, app cache dir and the user's download dir.
    pub fn default_destinations() -> Vec<PathBuf> {
        let mut destinations = Vec::new();

        if let Some(dirs) = crate::config::project_dirs() {
            destinations.push(dirs.data_local_dir().join("widget.log"));
            destinations.push(dirs.cache_dir().join("widget.log"));
        }

        if let Some(download_dir) = directories::UserDirs::new()
            .as_ref()
            .and_then(|dirs| dirs.download_dir())
        {
            destinations.push(download_dir.join("climate_widget.log"));
        }

        destinations
    }

    fn write_line(&self, path: &Path, line: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        if file.metadata()?.len() > self.max_size {
            file.set_len(0)?;
        }

        file.write_all(line.as_bytes())
    }
}

impl Default for FileLogger {
    fn default() -> Self {
        Self::new(Self::default_destinations())
    }
}

impl Logger for FileLogger {
    fn log(&self, message: &str) {
        let timestamp = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f");
        let line = format!("{timestamp} {message}\n");

        for path in &self.destinations {
            if let Err(e) = self.write_line(path, &line) {
                log::trace!("Could not write widget log {}: {e}", path.display());
            }
        }
    }
}
