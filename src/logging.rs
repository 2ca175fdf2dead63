//! Size-rotated log file
//!
//! [`RotatingFile`] is a [`MakeWriter`] for the JSON file layer. Once the live
//! file would grow past `max_bytes`, it is renamed to `<name>.1`, older
//! backups shift up by one and the oldest beyond `backups` is deleted.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing_subscriber::fmt::MakeWriter;

/// Append-only log file that rolls over by size
#[derive(Debug)]
pub struct RotatingFile {
    state: Mutex<RotatingState>,
}

#[derive(Debug)]
struct RotatingState {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    file: File,
    written: u64,
}

impl RotatingFile {
    /// Opens (or creates) the live file, creating its directory if needed
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let file = open_append(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            state: Mutex::new(RotatingState {
                path,
                max_bytes,
                backups,
                file,
                written,
            }),
        })
    }

    pub fn path(&self) -> PathBuf {
        self.lock().path.clone()
    }

    fn lock(&self) -> MutexGuard<'_, RotatingState> {
        // A panic mid-write leaves the state usable
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_record(&self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.lock();
        let len = buf.len() as u64;

        if state.written > 0 && state.written + len > state.max_bytes {
            state.rotate()?;
        }

        state.file.write_all(buf)?;
        state.written += len;
        Ok(buf.len())
    }
}

impl RotatingState {
    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backups > 0 {
            let oldest = backup_path(&self.path, self.backups);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for n in (1..self.backups).rev() {
                let from = backup_path(&self.path, n);
                if from.exists() {
                    fs::rename(&from, backup_path(&self.path, n + 1))?;
                }
            }
            fs::rename(&self.path, backup_path(&self.path, 1))?;
            self.file = open_append(&self.path)?;
        } else {
            self.file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.path)?;
        }

        self.written = 0;
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// `app.log` -> `app.log.<n>`
fn backup_path(path: &Path, n: usize) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{}", n));
    PathBuf::from(name)
}

/// Handle given to the formatter for one event
pub struct RotatingWriter<'a> {
    target: &'a RotatingFile,
}

impl Write for RotatingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.target.write_record(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.target.lock().file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFile {
    type Writer = RotatingWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingWriter { target: self }
    }
}
