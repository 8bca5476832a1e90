//! File appender implementation

use crate::core::{
    Appender, FilterSet, Filterable, Layout, LifeCycle, LogEvent, LoggerError, PatternLayout,
    Result, StatusLogger,
};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Appends formatted events to a file.
///
/// The file and any missing parent directories are created on
/// construction. The layout header is written on `start()` when the file is
/// empty, the footer on `stop()`.
pub struct FileAppender {
    name: String,
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
    layout: Arc<dyn Layout>,
    immediate_flush: bool,
    locking: bool,
    filters: FilterSet,
    life_cycle: LifeCycle,
}

impl FileAppender {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    format!("creating directory {}", parent.display()),
                    e.to_string(),
                    e,
                )
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LoggerError::io_operation(format!("opening {}", path.display()), e.to_string(), e)
            })?;

        Ok(Self {
            name: name.into(),
            path,
            writer: Mutex::new(Some(BufWriter::new(file))),
            layout: Arc::new(PatternLayout::default()),
            immediate_flush: true,
            locking: false,
            filters: FilterSet::new(),
            life_cycle: LifeCycle::new(),
        })
    }

    /// Set the layout for this appender
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rust_log_router::appenders::FileAppender;
    /// use rust_log_router::core::PatternLayout;
    /// use std::sync::Arc;
    ///
    /// let appender = FileAppender::new("audit", "/var/log/audit.log")
    ///     .unwrap()
    ///     .with_layout(Arc::new(PatternLayout::new("%d %-5p %m%n").unwrap()));
    /// ```
    #[must_use]
    pub fn with_layout(mut self, layout: Arc<dyn Layout>) -> Self {
        self.layout = layout;
        self
    }

    /// Flush after every event instead of when the buffer fills.
    #[must_use]
    pub fn with_immediate_flush(mut self, immediate_flush: bool) -> Self {
        self.immediate_flush = immediate_flush;
        self
    }

    /// Hold an exclusive OS lock on the file while writing.
    ///
    /// Only effective with the `file` feature.
    #[must_use]
    pub fn with_locking(mut self, locking: bool) -> Self {
        self.locking = locking;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        let mut guard = self.writer.lock();
        let writer = guard
            .as_mut()
            .ok_or_else(|| LoggerError::Stopped(self.name.clone()))?;

        #[cfg(feature = "file")]
        {
            if self.locking {
                use fs2::FileExt;
                writer.flush()?;
                writer.get_ref().lock_exclusive()?;
                let written = writer.write_all(bytes).and_then(|()| writer.flush());
                let unlocked = writer.get_ref().unlock();
                written?;
                unlocked?;
                return Ok(());
            }
        }

        writer.write_all(bytes)?;
        if self.immediate_flush {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Appender for FileAppender {
    fn append(&self, event: &dyn LogEvent) -> Result<()> {
        if self.filters.is_filtered(event) {
            return Ok(());
        }
        self.write_bytes(&self.layout.to_byte_array(event))
    }

    fn flush(&self) -> Result<()> {
        if let Some(writer) = self.writer.lock().as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) {
        if !self.life_cycle.start() {
            return;
        }
        let empty = std::fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(false);
        if let Some(header) = self.layout.header().filter(|_| empty) {
            if let Err(e) = self.write_bytes(&header) {
                StatusLogger::global()
                    .error_with_cause(format!("Unable to write header to {}", self.path.display()), &e);
            }
        }
    }

    fn stop(&self) {
        if !self.life_cycle.stop() {
            return;
        }
        if let Some(footer) = self.layout.footer() {
            if let Err(e) = self.write_bytes(&footer) {
                StatusLogger::global()
                    .error_with_cause(format!("Unable to write footer to {}", self.path.display()), &e);
            }
        }
        if let Some(mut writer) = self.writer.lock().take() {
            if let Err(e) = writer.flush() {
                StatusLogger::global()
                    .error_with_cause(format!("Unable to flush {}", self.path.display()), &e);
            }
        }
    }

    fn is_started(&self) -> bool {
        self.life_cycle.is_started()
    }

    fn filterable(&self) -> Option<&dyn Filterable> {
        Some(&self.filters)
    }

    fn layout(&self) -> Option<Arc<dyn Layout>> {
        Some(Arc::clone(&self.layout))
    }
}

impl Drop for FileAppender {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.flush();
    }
}
