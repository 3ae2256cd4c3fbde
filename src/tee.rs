//! Duplicates report output to several sinks, e.g. the console and a
//! numbered log file next to the transcripts.
//!
//! The log file is shared: the tee writes report text into it and the
//! logging layer writes tracing events into it, so one file holds the
//! whole run in order. Dropping the tee flushes every sink.

use std::fs::{self, File};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use tracing_subscriber::fmt::MakeWriter;

use crate::error::Result;

/// Numbered log file that can be written from several places
#[derive(Clone)]
pub struct LogFile {
    path: PathBuf,
    file: Arc<Mutex<LineWriter<File>>>,
}

impl LogFile {
    /// Create the next free `<base>NNN.txt` in `dir`
    pub fn create(dir: &Path, base: &str) -> Result<Self> {
        let path = next_log_path(dir, base)?;
        let file = File::create(&path)?;
        debug!("Log file: {}", path.display());
        Ok(Self {
            path,
            file: Arc::new(Mutex::new(LineWriter::new(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_file<T>(&self, f: impl FnOnce(&mut LineWriter<File>) -> io::Result<T>) -> io::Result<T> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        f(&mut *file)
    }
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(|file| file.flush())
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Writer that forwards every write and flush to all of its sinks
#[derive(Default)]
pub struct Tee {
    sinks: Vec<Box<dyn Write>>,
    log_file: Option<LogFile>,
}

impl Tee {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tee whose only sink is standard output
    pub fn stdout() -> Self {
        Self::new().with_sink(io::stdout())
    }

    pub fn with_sink(mut self, sink: impl Write + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Add a fresh `<base>NNN.txt` file in `dir` as a sink
    pub fn with_log_file(mut self, dir: &Path, base: &str) -> Result<Self> {
        let log_file = LogFile::create(dir, base)?;
        self.sinks.push(Box::new(log_file.clone()));
        self.log_file = Some(log_file);
        Ok(self)
    }

    /// Shared handle to the log file sink, if one was added
    pub fn log_file(&self) -> Option<&LogFile> {
        self.log_file.as_ref()
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_file.as_ref().map(LogFile::path)
    }
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for sink in &mut self.sinks {
            sink.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }
}

impl Drop for Tee {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!("Failed to flush output: {}", e);
        }
    }
}

/// First `<base>NNN.txt` in `dir` that does not exist yet, counting from 001.
///
/// Creates `dir` if needed.
pub fn next_log_path(dir: &Path, base: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let mut n = 1u32;
    loop {
        let path = dir.join(format!("{}{:03}.txt", base, n));
        if !path.exists() {
            return Ok(path);
        }
        n += 1;
    }
}
