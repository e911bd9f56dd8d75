use crate::{
    error::SinkError,
    sink::{OutputSink, PartWriter},
};
use async_trait::async_trait;
use model::core::utils::part_file_name;
use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::{
    fs::{self, File, OpenOptions},
    io::{AsyncWriteExt, BufWriter},
};
use tracing::{debug, info};

pub const TEMPORARY_DIR: &str = "_temporary";
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// A directory of `part-NNNNN` text files.
///
/// Parts are written under `<root>/_temporary` and moved into `<root>` on
/// commit, followed by an empty `_SUCCESS` marker.
#[derive(Debug, Clone)]
pub struct TextDirSink {
    root: PathBuf,
    prepared: Arc<AtomicBool>,
}

impl TextDirSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        TextDirSink {
            root: root.into(),
            prepared: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn temporary(&self) -> PathBuf {
        self.root.join(TEMPORARY_DIR)
    }

    async fn ensure_prepared(&self) -> Result<PathBuf, SinkError> {
        let temporary = self.temporary();
        match fs::metadata(&temporary).await {
            Ok(meta) if meta.is_dir() => Ok(temporary),
            Ok(_) => Err(SinkError::NotPrepared(self.root.clone())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SinkError::NotPrepared(self.root.clone()))
            }
            Err(e) => Err(SinkError::io(&temporary, e)),
        }
    }

    /// Remove parts a failed commit already moved into the root, together
    /// with the marker. Only a root this sink prepared is touched; it was
    /// empty then, so every such file belongs to this job.
    async fn remove_published_parts(&self) -> Result<usize, SinkError> {
        if !self.prepared.load(Ordering::SeqCst) {
            return Ok(0);
        }
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(SinkError::io(&self.root, e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SinkError::io(&self.root, e))?
        {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("part-") || name == SUCCESS_MARKER {
                remove_path(&entry.path()).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

async fn remove_path(path: &Path) -> Result<bool, SinkError> {
    let meta = match fs::symlink_metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(SinkError::io(path, e)),
    };

    let removed = if meta.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };
    removed.map_err(|e| SinkError::io(path, e))?;
    Ok(true)
}

#[async_trait]
impl OutputSink for TextDirSink {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    async fn cleanup(&self) -> Result<(), SinkError> {
        if remove_path(&self.root).await? {
            info!(output = %self.root.display(), "Removed previous output");
        }
        Ok(())
    }

    async fn prepare(&self) -> Result<(), SinkError> {
        match fs::metadata(&self.root).await {
            Ok(meta) if meta.is_file() => return Err(SinkError::OutputExists(self.root.clone())),
            Ok(_) => {
                let mut entries = fs::read_dir(&self.root)
                    .await
                    .map_err(|e| SinkError::io(&self.root, e))?;
                if entries
                    .next_entry()
                    .await
                    .map_err(|e| SinkError::io(&self.root, e))?
                    .is_some()
                {
                    return Err(SinkError::OutputExists(self.root.clone()));
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(SinkError::io(&self.root, e)),
        }

        let temporary = self.temporary();
        fs::create_dir_all(&temporary)
            .await
            .map_err(|e| SinkError::io(&temporary, e))?;
        self.prepared.store(true, Ordering::SeqCst);
        debug!(output = %self.root.display(), "Output prepared");
        Ok(())
    }

    async fn open_part(&self, index: usize) -> Result<Box<dyn PartWriter>, SinkError> {
        let path = self.ensure_prepared().await?.join(part_file_name(index));
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| SinkError::io(&path, e))?;

        Ok(Box::new(TextPartWriter {
            path,
            writer: BufWriter::new(file),
            lines: 0,
        }))
    }

    async fn commit(&self) -> Result<(), SinkError> {
        let temporary = self.ensure_prepared().await?;

        let mut parts = Vec::new();
        let mut entries = fs::read_dir(&temporary)
            .await
            .map_err(|e| SinkError::io(&temporary, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SinkError::io(&temporary, e))?
        {
            parts.push(entry.file_name());
        }
        parts.sort();

        for name in &parts {
            let from = temporary.join(name);
            let to = self.root.join(name);
            fs::rename(&from, &to)
                .await
                .map_err(|e| SinkError::io(&to, e))?;
        }

        fs::remove_dir_all(&temporary)
            .await
            .map_err(|e| SinkError::io(&temporary, e))?;

        let marker = self.root.join(SUCCESS_MARKER);
        File::create(&marker)
            .await
            .map_err(|e| SinkError::io(&marker, e))?;

        self.prepared.store(false, Ordering::SeqCst);
        info!(output = %self.root.display(), parts = parts.len(), "Output committed");
        Ok(())
    }

    async fn abort(&self) -> Result<(), SinkError> {
        let discarded = remove_path(&self.temporary()).await?;
        let withdrawn = self.remove_published_parts().await?;
        if discarded || withdrawn > 0 {
            info!(output = %self.root.display(), withdrawn, "Discarded uncommitted output");
        }
        Ok(())
    }
}

struct TextPartWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    lines: u64,
}

#[async_trait]
impl PartWriter for TextPartWriter {
    async fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| SinkError::io(&self.path, e))?;
        self.writer
            .write_all(b"\n")
            .await
            .map_err(|e| SinkError::io(&self.path, e))?;
        self.lines += 1;
        Ok(())
    }

    async fn close(mut self: Box<Self>) -> Result<u64, SinkError> {
        self.writer
            .flush()
            .await
            .map_err(|e| SinkError::io(&self.path, e))?;
        self.writer
            .get_mut()
            .sync_all()
            .await
            .map_err(|e| SinkError::io(&self.path, e))?;
        Ok(self.lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write_part(sink: &TextDirSink, index: usize, lines: &[&str]) -> u64 {
        let mut part = sink.open_part(index).await.unwrap();
        for line in lines {
            part.write_line(line).await.unwrap();
        }
        part.close().await.unwrap()
    }

    #[tokio::test]
    async fn commit_publishes_parts_and_marker() {
        let dir = tempfile::tempdir().unwrap();
        let sink = TextDirSink::new(dir.path().join("out"));

        sink.prepare().await.unwrap();
        assert_eq!(write_part(&sink, 0, &["A\t13.0", "B\t5.0"]).await, 2);
        assert_eq!(write_part(&sink, 1, &[]).await, 0);
        assert!(!sink.root().join("part-00000").exists());

        sink.commit().await.unwrap();

        let root = sink.root();
        assert_eq!(
            std::fs::read_to_string(root.join("part-00000")).unwrap(),
            "A\t13.0\nB\t5.0\n"
        );
        assert_eq!(std::fs::read_to_string(root.join("part-00001")).unwrap(), "");
        assert!(root.join(SUCCESS_MARKER).exists());
        assert!(!root.join(TEMPORARY_DIR).exists());
    }

    #[tokio::test]
    async fn prepare_refuses_non_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stale"), "x").unwrap();

        let sink = TextDirSink::new(dir.path());
        assert!(matches!(
            sink.prepare().await,
            Err(SinkError::OutputExists(_))
        ));
    }

    #[tokio::test]
    async fn cleanup_then_prepare_replaces_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("out");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("part-00000"), "old\t1.0\n").unwrap();

        let sink = TextDirSink::new(&root);
        sink.cleanup().await.unwrap();
        sink.prepare().await.unwrap();
        write_part(&sink, 0, &["new\t2.0"]).await;
        sink.commit().await.unwrap();

        assert_eq!(
            std::fs::read_to_string(root.join("part-00000")).unwrap(),
            "new\t2.0\n"
        );
    }

    #[tokio::test]
    async fn cleanup_of_missing_output_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        TextDirSink::new(dir.path().join("never"))
            .cleanup()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn abort_leaves_no_parts() {
        let dir = tempfile::tempdir().unwrap();
        let sink = TextDirSink::new(dir.path().join("out"));

        sink.prepare().await.unwrap();
        write_part(&sink, 0, &["A\t1.0"]).await;
        sink.abort().await.unwrap();

        assert!(!sink.root().join(TEMPORARY_DIR).exists());
        assert!(!sink.root().join("part-00000").exists());
        assert!(!sink.root().join(SUCCESS_MARKER).exists());
    }

    #[tokio::test]
    async fn abort_withdraws_parts_of_a_partial_commit() {
        let dir = tempfile::tempdir().unwrap();
        let sink = TextDirSink::new(dir.path().join("out"));

        sink.prepare().await.unwrap();
        write_part(&sink, 0, &["A\t1.0"]).await;
        write_part(&sink, 1, &["B\t2.0"]).await;
        // Commit stopped after moving the first part.
        let root = sink.root();
        std::fs::rename(
            root.join(TEMPORARY_DIR).join("part-00000"),
            root.join("part-00000"),
        )
        .unwrap();

        sink.abort().await.unwrap();

        assert!(root.exists());
        assert_eq!(std::fs::read_dir(root).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn abort_after_commit_keeps_the_output() {
        let dir = tempfile::tempdir().unwrap();
        let sink = TextDirSink::new(dir.path().join("out"));

        sink.prepare().await.unwrap();
        write_part(&sink, 0, &["A\t1.0"]).await;
        sink.commit().await.unwrap();
        sink.abort().await.unwrap();

        assert!(sink.root().join("part-00000").exists());
        assert!(sink.root().join(SUCCESS_MARKER).exists());
    }

    #[tokio::test]
    async fn abort_without_prepare_keeps_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("part-00000"), "theirs\t1.0\n").unwrap();

        let sink = TextDirSink::new(dir.path());
        assert!(sink.prepare().await.is_err());
        sink.abort().await.unwrap();

        assert!(dir.path().join("part-00000").exists());
    }

    #[tokio::test]
    async fn parts_need_prepare() {
        let dir = tempfile::tempdir().unwrap();
        let sink = TextDirSink::new(dir.path().join("out"));
        assert!(matches!(
            sink.open_part(0).await,
            Err(SinkError::NotPrepared(_))
        ));
    }
}
