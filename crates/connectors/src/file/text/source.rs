use crate::{
    error::SourceError,
    file::{
        error::FileError,
        text::split::{FileSplit, SplitReader, plan_splits},
    },
    source::{Partition, PartitionSource, PartitionSpec, UnitStream, foreign},
};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use model::records::raw::RawUnit;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Delimited text files under an input path, one partition per split.
#[derive(Debug, Clone)]
pub struct TextSource {
    name: String,
    input: PathBuf,
    split_size: Option<u64>,
}

impl TextSource {
    pub fn new(input: impl Into<PathBuf>, split_size: Option<u64>) -> Self {
        let input = input.into();
        TextSource {
            name: input.display().to_string(),
            input,
            split_size,
        }
    }

    /// Regular files making up the input, sorted by path. Names starting
    /// with `_` or `.` are bookkeeping files and are skipped.
    pub async fn input_files(&self) -> Result<Vec<(PathBuf, u64)>, FileError> {
        let meta = tokio::fs::metadata(&self.input)
            .await
            .map_err(|e| FileError::io(&self.input, e))?;

        if meta.is_file() {
            return Ok(vec![(self.input.clone(), meta.len())]);
        }

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.input)
            .await
            .map_err(|e| FileError::io(&self.input, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FileError::io(&self.input, e))?
        {
            let path = entry.path();
            if is_hidden(&path) {
                continue;
            }
            let meta = entry
                .metadata()
                .await
                .map_err(|e| FileError::io(&path, e))?;
            if meta.is_file() {
                files.push((path, meta.len()));
            } else {
                warn!(path = %path.display(), "Skipping non-file input entry");
            }
        }

        files.sort();
        Ok(files)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_') || n.starts_with('.'))
}

#[async_trait]
impl PartitionSource for TextSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn partitions(&self) -> Result<Vec<Partition>, SourceError> {
        let files = self.input_files().await?;

        let partitions: Vec<Partition> = files
            .iter()
            .flat_map(|(path, size)| plan_splits(path, *size, self.split_size))
            .enumerate()
            .map(|(id, split)| {
                Partition::new(
                    id,
                    PartitionSpec::FileSplit {
                        path: split.path,
                        start: split.start,
                        len: split.len,
                    },
                )
            })
            .collect();

        debug!(
            input = %self.input.display(),
            files = files.len(),
            splits = partitions.len(),
            "Planned input splits"
        );
        Ok(partitions)
    }

    async fn open(&self, partition: &Partition) -> Result<UnitStream, SourceError> {
        let PartitionSpec::FileSplit { path, start, len } = &partition.spec else {
            return Err(foreign(&self.name, partition));
        };

        let reader = SplitReader::open(&FileSplit {
            path: path.clone(),
            start: *start,
            len: *len,
        })
        .await?;

        let lines = stream::try_unfold(reader, |mut reader| async move {
            Ok(reader
                .next_line()
                .await?
                .map(|line| (RawUnit::Line(line), reader)))
        });

        Ok(lines.map_err(|e: FileError| SourceError::File(e)).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn read_source(source: &TextSource) -> Vec<RawUnit> {
        let mut units = Vec::new();
        for partition in source.partitions().await.unwrap() {
            let mut stream = source.open(&partition).await.unwrap();
            while let Some(unit) = stream.next().await {
                units.push(unit.unwrap());
            }
        }
        units
    }

    #[tokio::test]
    async fn reads_every_file_in_order_and_skips_bookkeeping() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "B|u2|d2|5.0\n").unwrap();
        std::fs::write(dir.path().join("a.txt"), "A|u1|d1|10.5\nA|u3|d3|2.5\n").unwrap();
        std::fs::write(dir.path().join("_SUCCESS"), "").unwrap();
        std::fs::write(dir.path().join(".a.txt.crc"), "junk").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let source = TextSource::new(dir.path(), None);
        assert_eq!(source.partitions().await.unwrap().len(), 2);
        assert_eq!(
            read_source(&source).await,
            vec![
                RawUnit::from("A|u1|d1|10.5"),
                RawUnit::from("A|u3|d3|2.5"),
                RawUnit::from("B|u2|d2|5.0"),
            ]
        );
    }

    #[tokio::test]
    async fn single_file_input_with_small_splits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visits.txt");
        let lines: Vec<String> = (0..50).map(|i| format!("k{}|u|d|{}.5", i % 7, i)).collect();
        std::fs::write(&path, lines.join("\n")).unwrap();

        let source = TextSource::new(&path, Some(64));
        assert!(source.partitions().await.unwrap().len() > 1);

        let expected: Vec<RawUnit> = lines.iter().map(|l| RawUnit::from(l.as_str())).collect();
        assert_eq!(read_source(&source).await, expected);
    }

    #[tokio::test]
    async fn missing_input_is_a_source_error() {
        let source = TextSource::new("/no/such/input/dir", None);
        assert!(matches!(
            source.partitions().await,
            Err(SourceError::File(FileError::NotFound(_)))
        ));
    }
}
