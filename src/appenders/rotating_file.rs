//! Rotating per-severity log file
//!
//! Each severity writes to its own file named
//! `<program>.<host>.<user>.log.<SEVERITY>.<YYYYMMDD-HHMMSS>.<pid>`. Before
//! every write the [`RotationConfig`] is consulted; when it fires the current
//! file is flushed and closed and a new one is opened with a fresh timestamp.

use crate::core::file_name::FileNaming;
use crate::core::{LoggerError, Result, RotationConfig, Severity, Sink};
use chrono::{DateTime, Local};
use parking_lot::RwLock;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Write buffer per file; a crash loses at most this much.
pub const BUFFER_SIZE: usize = 256 * 1024;

/// Settings shared by the files of every severity.
#[derive(Debug)]
pub struct FileSettings {
    pub naming: FileNaming,
    /// Candidate directories, first usable one wins.
    pub log_dirs: Vec<PathBuf>,
    pub rotation: RwLock<RotationConfig>,
    /// Gzip files once they are rotated out.
    pub compress: bool,
    /// Keep a `<program>.<SEVERITY>` symlink pointing at the newest file.
    pub symlinks: bool,
    pub file_header: bool,
}

impl FileSettings {
    pub fn new(naming: FileNaming) -> Self {
        Self {
            naming,
            log_dirs: Vec::new(),
            rotation: RwLock::new(RotationConfig::default()),
            compress: false,
            symlinks: true,
            file_header: true,
        }
    }

    fn candidate_dirs(&self) -> Vec<PathBuf> {
        if self.log_dirs.is_empty() {
            vec![std::env::temp_dir()]
        } else {
            self.log_dirs.clone()
        }
    }

    fn header(&self, now: &DateTime<Local>) -> String {
        format!(
            "Log file created at: {}\n\
             Running on machine: {}\n\
             Binary: {} (pid {})\n\
             Log line format: [IWEF]mmdd hh:mm:ss.uuuuuu pid file:line] msg\n",
            now.format("%Y/%m/%d %H:%M:%S"),
            self.naming.host,
            self.naming.program,
            self.naming.pid
        )
    }
}

pub struct RotatingFileSink {
    severity: Severity,
    settings: std::sync::Arc<FileSettings>,
    writer: Option<BufWriter<File>>,
    path: PathBuf,
    /// Bytes written since the current file was opened.
    nbytes: u64,
    created_at: DateTime<Local>,
    deferred_error: Option<LoggerError>,
}

impl RotatingFileSink {
    /// Open the first file for `severity`.
    ///
    /// # Errors
    ///
    /// Returns error if no candidate directory accepts the file
    pub fn create(
        severity: Severity,
        settings: std::sync::Arc<FileSettings>,
        now: DateTime<Local>,
    ) -> Result<Self> {
        let (writer, path, nbytes) = Self::open(severity, &settings, &now)?;
        Ok(Self {
            severity,
            settings,
            writer: Some(writer),
            path,
            nbytes,
            created_at: now,
            deferred_error: None,
        })
    }

    fn open(
        severity: Severity,
        settings: &FileSettings,
        now: &DateTime<Local>,
    ) -> Result<(BufWriter<File>, PathBuf, u64)> {
        let name = settings.naming.file_name(severity, now);
        let mut last_error = None;

        for dir in settings.candidate_dirs() {
            let path = dir.join(&name);
            let opened = fs::create_dir_all(&dir)
                .and_then(|_| OpenOptions::new().create(true).append(true).open(&path));
            match opened {
                Ok(file) => {
                    let mut writer = BufWriter::with_capacity(BUFFER_SIZE, file);
                    let mut nbytes = 0;
                    if settings.file_header {
                        let header = settings.header(now);
                        writer.write_all(header.as_bytes()).map_err(|e| {
                            LoggerError::io_operation(
                                "writing log file header",
                                path.display().to_string(),
                                e,
                            )
                        })?;
                        nbytes = header.len() as u64;
                    }
                    if settings.symlinks {
                        Self::update_symlink(&dir, &settings.naming.link_name(severity), &name);
                    }
                    return Ok((writer, path, nbytes));
                }
                Err(e) => last_error = Some((path, e)),
            }
        }

        Err(match last_error {
            Some((path, e)) => LoggerError::file_appender(
                path.display().to_string(),
                format!("Cannot create log file: {}", e),
            ),
            None => LoggerError::file_appender(name, "No log directory configured"),
        })
    }

    #[cfg(unix)]
    fn update_symlink(dir: &Path, link: &str, target: &str) {
        let link = dir.join(link);
        // Best effort; a stale or missing link does not affect logging.
        let _ = fs::remove_file(&link);
        let _ = std::os::unix::fs::symlink(target, &link);
    }

    #[cfg(not(unix))]
    fn update_symlink(_dir: &Path, _link: &str, _target: &str) {}

    /// Close the current file and open a new one.
    ///
    /// The new file is opened first; on failure the current one stays active.
    /// A rotation within the second the current file was named is skipped, as
    /// it would reopen the same file. Failing to flush or compress the old
    /// file does not undo the rotation and is left for [`Sink::take_error`].
    fn rotate(&mut self, now: DateTime<Local>) -> Result<()> {
        let name = self.settings.naming.file_name(self.severity, &now);
        if self.path.file_name().is_some_and(|current| current == name.as_str()) {
            return Ok(());
        }

        let (writer, path, nbytes) = Self::open(self.severity, &self.settings, &now)?;
        let old_writer = self.writer.replace(writer);
        let old_path = std::mem::replace(&mut self.path, path);
        self.nbytes = nbytes;
        self.created_at = now;

        if let Some(mut old) = old_writer {
            if let Err(e) = old.flush() {
                self.deferred_error = Some(LoggerError::file_rotation(
                    old_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                ));
                return Ok(());
            }
        }

        if self.settings.compress {
            if let Err(e) = compress_file(&old_path) {
                self.deferred_error = Some(e);
            }
        }
        Ok(())
    }

    /// Path of the active file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written to the active file
    #[must_use]
    pub fn nbytes(&self) -> u64 {
        self.nbytes
    }

    /// Creation time of the active file
    #[must_use]
    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }
}

impl Sink for RotatingFileSink {
    fn write(&mut self, bytes: &[u8], now: DateTime<Local>) -> Result<()> {
        let rotation = *self.settings.rotation.read();
        if rotation.should_rotate(self.nbytes, bytes.len(), self.created_at, now) {
            if let Err(e) = self.rotate(now) {
                // The new file could not be opened. Keep writing to the current
                // one; restart the size count so the next write does not retry
                // immediately.
                self.nbytes = 0;
                self.deferred_error = Some(e);
            }
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::file_appender(self.path.display().to_string(), "Writer not initialized"))?;
        writer.write_all(bytes).map_err(|e| {
            LoggerError::file_appender(
                self.path.display().to_string(),
                format!("Failed to write log entry: {}", e),
            )
        })?;
        self.nbytes += bytes.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        self.flush()?;
        if let Some(ref writer) = self.writer {
            writer.get_ref().sync_all().map_err(|e| {
                LoggerError::io_operation("syncing log file", self.path.display().to_string(), e)
            })?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        self.severity.to_str()
    }

    fn take_error(&mut self) -> Option<LoggerError> {
        self.deferred_error.take()
    }
}

impl Drop for RotatingFileSink {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            // Best effort flush - ignore errors during drop
            let _ = writer.flush();
        }
    }
}

/// Gzip `path` into `<path>.gz`, removing the original only once the
/// compressed copy is complete.
fn compress_file(path: &Path) -> Result<()> {
    let mut gz_name = path.as_os_str().to_owned();
    gz_name.push(".gz");
    let gz_path = PathBuf::from(gz_name);
    let mut tmp_name = gz_path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let temp_gz_path = PathBuf::from(tmp_name);

    let result = (|| -> std::io::Result<()> {
        let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
        let output = BufWriter::with_capacity(64 * 1024, File::create(&temp_gz_path)?);
        let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());

        let mut buffer = vec![0u8; 64 * 1024];
        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            encoder.write_all(&buffer[..read])?;
        }
        encoder.finish()?.flush()?;
        fs::rename(&temp_gz_path, &gz_path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&temp_gz_path);
        return Err(LoggerError::io_operation(
            "compressing rotated log file",
            path.display().to_string(),
            e,
        ));
    }

    fs::remove_file(path).map_err(|e| {
        LoggerError::io_operation(
            "removing compressed log file",
            path.display().to_string(),
            e,
        )
    })
}
