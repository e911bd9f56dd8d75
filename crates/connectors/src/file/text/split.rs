use crate::file::error::FileError;
use std::{
    io::SeekFrom,
    path::{Path, PathBuf},
};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncSeekExt, BufReader},
};

/// A byte range `[start, start + len)` of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSplit {
    pub path: PathBuf,
    pub start: u64,
    pub len: u64,
}

impl FileSplit {
    pub fn end(&self) -> u64 {
        self.start + self.len
    }
}

/// Cut a file of `size` bytes into splits of at most `split_size` bytes.
/// An empty file, or no split size, yields a single split.
pub fn plan_splits(path: &Path, size: u64, split_size: Option<u64>) -> Vec<FileSplit> {
    match split_size {
        Some(step) if step > 0 && size > step => (0..size)
            .step_by(step as usize)
            .map(|start| FileSplit {
                path: path.to_path_buf(),
                start,
                len: step.min(size - start),
            })
            .collect(),
        _ => vec![FileSplit {
            path: path.to_path_buf(),
            start: 0,
            len: size,
        }],
    }
}

/// Reads the lines owned by one split.
///
/// A split that does not start at offset 0 skips its first (possibly
/// partial) line; every split reads the line that starts at or before its
/// end, even if it runs past it. Together the splits of a file yield each
/// line exactly once.
pub struct SplitReader {
    path: PathBuf,
    reader: BufReader<File>,
    pos: u64,
    end: u64,
    buf: Vec<u8>,
}

impl SplitReader {
    pub async fn open(split: &FileSplit) -> Result<Self, FileError> {
        let mut file = File::open(&split.path)
            .await
            .map_err(|e| FileError::io(&split.path, e))?;
        file.seek(SeekFrom::Start(split.start))
            .await
            .map_err(|e| FileError::io(&split.path, e))?;

        let mut reader = SplitReader {
            path: split.path.clone(),
            reader: BufReader::new(file),
            pos: split.start,
            end: split.end(),
            buf: Vec::new(),
        };

        if split.start != 0 {
            let skipped = reader.read_raw().await?;
            reader.pos += skipped as u64;
        }

        Ok(reader)
    }

    /// Next line without its terminator, or `None` once the split is done.
    ///
    /// Invalid UTF-8 is replaced with U+FFFD, so keys that differ only in
    /// invalid bytes end up in the same group.
    pub async fn next_line(&mut self) -> Result<Option<String>, FileError> {
        if self.pos > self.end {
            return Ok(None);
        }

        let read = self.read_raw().await?;
        if read == 0 {
            return Ok(None);
        }
        self.pos += read as u64;

        let mut line = self.buf.as_slice();
        if let Some(stripped) = line.strip_suffix(b"\n") {
            line = stripped;
        }
        if let Some(stripped) = line.strip_suffix(b"\r") {
            line = stripped;
        }

        Ok(Some(String::from_utf8_lossy(line).into_owned()))
    }

    async fn read_raw(&mut self) -> Result<usize, FileError> {
        self.buf.clear();
        self.reader
            .read_until(b'\n', &mut self.buf)
            .await
            .map_err(|e| FileError::io(&self.path, e))
    }
}
