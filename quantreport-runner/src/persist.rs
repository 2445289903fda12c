//! Result persistence — plain-text logs and indented JSON result files.
//!
//! Writes are blocking, overwrite any existing file, and are never retried.
//! Every failure is returned to the caller.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize results for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("results for {path} would not load back: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse results file {path}: {source}")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ResultPersister {
    dir: PathBuf,
}

impl ResultPersister {
    /// Persist into `dir`. Relative paths are resolved against the current
    /// working directory now, so returned paths are always absolute.
    pub fn new(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref();
        let dir = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            std::env::current_dir()?.join(dir)
        };
        Ok(Self { dir })
    }

    pub fn in_current_dir() -> io::Result<Self> {
        Ok(Self {
            dir: std::env::current_dir()?,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `lines` to `<id>-log.txt`, one newline-terminated line each.
    pub fn save_logs<S: AsRef<str>>(&self, id: &str, lines: &[S]) -> Result<PathBuf, PersistError> {
        let path = self.dir.join(format!("{id}-log.txt"));
        let io_err = |source| PersistError::Io {
            path: path.clone(),
            source,
        };

        let file = File::create(&path).map_err(io_err)?;
        let mut out = BufWriter::new(file);
        for line in lines {
            writeln!(out, "{}", line.as_ref()).map_err(io_err)?;
        }
        out.flush().map_err(io_err)?;

        info!(path = %path.display(), lines = lines.len(), "saved logs");
        Ok(path)
    }

    /// Serialize `result` as indented JSON into a file named exactly `name`.
    ///
    /// The JSON is parsed back as `T` before anything is written. A NaN or
    /// infinite float serializes as `null`, which an `f64` field refuses on
    /// load, so such results fail with [`PersistError::Unreadable`] and the
    /// file is left as it was.
    pub fn save_results<T: Serialize + DeserializeOwned>(
        &self,
        name: &str,
        result: &T,
    ) -> Result<PathBuf, PersistError> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(result).map_err(|source| {
            PersistError::Serialize {
                path: path.clone(),
                source,
            }
        })?;
        if let Err(source) = serde_json::from_str::<T>(&json) {
            error!(path = %path.display(), %source, "refusing to write results that cannot be loaded");
            return Err(PersistError::Unreadable { path, source });
        }
        std::fs::write(&path, json).map_err(|source| PersistError::Io {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), "saved results");
        Ok(path)
    }

    /// Read a results file written by [`save_results`](Self::save_results).
    pub fn load_results<T: DeserializeOwned>(&self, name: &str) -> Result<T, PersistError> {
        let path = self.dir.join(name);
        let json = std::fs::read_to_string(&path).map_err(|source| PersistError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| PersistError::Deserialize { path, source })
    }
}
