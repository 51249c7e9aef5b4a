//! Save-file storage — where record logs live.
//!
//! The event manager only ever asks for a named stream to read or
//! write. `DirSaveFileManager` maps names to files in one directory;
//! hosts with their own save systems implement `SaveFileManager`.
//!
//! Rules:
//!   - Writers are sequential, buffered, and truncate on open
//!   - `finalize` flushes and fsyncs; dropping a writer without it
//!     still flushes but does not sync
//!   - Readers see whatever was finalized before they were opened

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

/// Readable saved stream.
pub type InSaveFile = Box<dyn Read + Send>;

/// Writable saved stream.
pub trait OutSaveFile: Write + Send {
    /// Flush everything written so far to durable storage.
    fn finalize(&mut self) -> io::Result<()>;
}

pub trait SaveFileManager: Send + Sync {
    /// `None` when the stream does not exist or cannot be opened.
    fn open_for_loading(&self, name: &str) -> Option<InSaveFile>;

    /// `None` when the stream cannot be created.
    fn open_for_saving(&self, name: &str) -> Option<Box<dyn OutSaveFile>>;

    /// Delete a stream. Removing a missing stream is not an error.
    fn remove(&self, name: &str) -> io::Result<()>;
}

// ---------------------------------------------------------------------------
// Directory-backed implementation
// ---------------------------------------------------------------------------

/// Stores each named stream as a file under one directory.
#[derive(Debug, Clone)]
pub struct DirSaveFileManager {
    dir: PathBuf,
}

impl DirSaveFileManager {
    /// Use `dir`, creating it if needed.
    pub fn open(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

struct FileOut {
    writer: BufWriter<File>,
}

impl Write for FileOut {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl OutSaveFile for FileOut {
    fn finalize(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()
    }
}

impl SaveFileManager for DirSaveFileManager {
    fn open_for_loading(&self, name: &str) -> Option<InSaveFile> {
        let path = self.path_of(name);
        match File::open(&path) {
            Ok(file) => Some(Box::new(BufReader::new(file))),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "open for loading failed");
                None
            }
        }
    }

    fn open_for_saving(&self, name: &str) -> Option<Box<dyn OutSaveFile>> {
        let path = self.path_of(name);
        let opened = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path);
        match opened {
            Ok(file) => Some(Box::new(FileOut {
                writer: BufWriter::new(file),
            })),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "open for saving failed");
                None
            }
        }
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        match fs::remove_file(self.path_of(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
