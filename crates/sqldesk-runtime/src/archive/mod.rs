//! Per-query artifact archive
//!
//! Each query gets a directory `<root>/<name>/` holding `<name>.in` (the
//! query text) and `<name>.out` (CSV result set, empty for statements
//! without rows, or the error text). `<name>` comes from the query's
//! [`QueryStamp`].

pub mod csv;

use crate::error::ArchiveError;
use crate::metadata::QueryStamp;
use sqldesk_core::QueryResult;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Outcome written to the `.out` file
#[derive(Debug, Clone, Copy)]
pub enum ArchiveOutput<'a> {
    Result(&'a QueryResult),
    Error(&'a str),
}

/// File-backed archive rooted at one directory
#[derive(Debug, Clone)]
pub struct ArtifactArchiver {
    root: PathBuf,
}

impl ArtifactArchiver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the files of `stamp`
    pub fn query_dir(&self, stamp: &QueryStamp) -> PathBuf {
        self.root.join(stamp.archive_name())
    }

    pub fn input_path(&self, stamp: &QueryStamp) -> PathBuf {
        let name = stamp.archive_name();
        self.root.join(&name).join(format!("{}.in", name))
    }

    pub fn output_path(&self, stamp: &QueryStamp) -> PathBuf {
        let name = stamp.archive_name();
        self.root.join(&name).join(format!("{}.out", name))
    }

    /// Write the query text to the `.in` file
    pub async fn write_input(&self, stamp: &QueryStamp, query: &str) -> Result<PathBuf, ArchiveError> {
        let path = self.input_path(stamp);
        self.write_file(stamp, &path, query.as_bytes()).await?;
        Ok(path)
    }

    /// Write the query outcome to the `.out` file
    pub async fn write_output(
        &self,
        stamp: &QueryStamp,
        output: ArchiveOutput<'_>,
    ) -> Result<PathBuf, ArchiveError> {
        let content = match output {
            ArchiveOutput::Result(result) => csv::to_csv(result),
            ArchiveOutput::Error(message) => message.to_string(),
        };
        let path = self.output_path(stamp);
        self.write_file(stamp, &path, content.as_bytes()).await?;
        Ok(path)
    }

    async fn write_file(&self, stamp: &QueryStamp, path: &Path, content: &[u8]) -> Result<(), ArchiveError> {
        let dir = self.query_dir(stamp);
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| ArchiveError::Io { path: dir, source })?;
        fs::write(path, content).await.map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Newest stamp among the archive directories already on disk
    ///
    /// A missing root holds no archives.
    pub async fn latest_stamp(&self) -> Result<Option<QueryStamp>, ArchiveError> {
        let io_error = |source: std::io::Error| ArchiveError::Io {
            path: self.root.clone(),
            source,
        };
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(io_error(source)),
        };

        let mut latest = None;
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let stamp = entry
                .file_name()
                .to_str()
                .and_then(QueryStamp::from_archive_name);
            latest = latest.max(stamp);
        }
        Ok(latest)
    }

    /// Resolve a requested file name (`query_<ts>/query_<ts>.out`) inside the root
    ///
    /// Absolute paths and parent components are rejected.
    pub fn resolve(&self, file_name: &str) -> Result<PathBuf, ArchiveError> {
        let relative = Path::new(file_name);
        if file_name.is_empty() || relative.is_absolute() {
            return Err(ArchiveError::InvalidFileName(file_name.to_string()));
        }

        let mut path = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(ArchiveError::InvalidFileName(file_name.to_string()));
                }
            }
        }

        if path == self.root {
            return Err(ArchiveError::InvalidFileName(file_name.to_string()));
        }
        Ok(path)
    }

    /// Open an archived file for streaming
    ///
    /// Returns the open file and its base name.
    pub async fn open(&self, file_name: &str) -> Result<(fs::File, String), ArchiveError> {
        let path = self.resolve(file_name)?;

        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ArchiveError::NotFound(file_name.to_string()));
            }
            Err(source) => return Err(ArchiveError::Io { path, source }),
        };
        if !metadata.is_file() {
            return Err(ArchiveError::NotFound(file_name.to_string()));
        }

        let file = fs::File::open(&path)
            .await
            .map_err(|source| ArchiveError::Io { path: path.clone(), source })?;
        let base_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok((file, base_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqldesk_core::SqlValue;
    use tempfile::TempDir;

    fn stamp() -> QueryStamp {
        QueryStamp { ts: 1700000000, seq: 0 }
    }

    #[tokio::test]
    async fn test_write_input_and_rows_output() {
        let dir = TempDir::new().unwrap();
        let archiver = ArtifactArchiver::new(dir.path());

        let input = archiver.write_input(&stamp(), "SELECT 1").await.unwrap();
        assert_eq!(input, dir.path().join("query_1700000000/query_1700000000.in"));
        assert_eq!(std::fs::read_to_string(&input).unwrap(), "SELECT 1");

        let result = QueryResult::rows(vec!["1".to_string()], vec![vec![SqlValue::Integer(1)]]);
        let output = archiver
            .write_output(&stamp(), ArchiveOutput::Result(&result))
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "1\n1\n");
    }

    #[tokio::test]
    async fn test_write_error_and_no_rows_output() {
        let dir = TempDir::new().unwrap();
        let archiver = ArtifactArchiver::new(dir.path());

        let path = archiver
            .write_output(&stamp(), ArchiveOutput::Error("no such table: nonexistent"))
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "no such table: nonexistent");

        let tied = QueryStamp { ts: 1700000000, seq: 1 };
        let path = archiver
            .write_output(&tied, ArchiveOutput::Result(&QueryResult::NoRows))
            .await
            .unwrap();
        assert!(path.ends_with("query_1700000000_1/query_1700000000_1.out"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let archiver = ArtifactArchiver::new("/srv/queries");

        assert_eq!(
            archiver.resolve("query_1/query_1.out").unwrap(),
            PathBuf::from("/srv/queries/query_1/query_1.out")
        );
        for bad in ["", "/etc/passwd", "../secret", "query_1/../../x", "."] {
            assert!(
                matches!(archiver.resolve(bad), Err(ArchiveError::InvalidFileName(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_latest_stamp() {
        let dir = TempDir::new().unwrap();
        let archiver = ArtifactArchiver::new(dir.path().join("queries"));
        assert_eq!(archiver.latest_stamp().await.unwrap(), None);

        archiver.write_input(&stamp(), "SELECT 1").await.unwrap();
        let tied = QueryStamp { ts: 1700000000, seq: 4 };
        archiver.write_input(&tied, "SELECT 2").await.unwrap();
        std::fs::create_dir_all(dir.path().join("queries/scratch")).unwrap();

        assert_eq!(archiver.latest_stamp().await.unwrap(), Some(tied));
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let archiver = ArtifactArchiver::new(dir.path());

        assert!(matches!(
            archiver.open("query_1/query_1.out").await,
            Err(ArchiveError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_open_returns_base_name() {
        let dir = TempDir::new().unwrap();
        let archiver = ArtifactArchiver::new(dir.path());
        archiver.write_input(&stamp(), "SELECT 1").await.unwrap();

        let (_, name) = archiver
            .open("query_1700000000/query_1700000000.in")
            .await
            .unwrap();
        assert_eq!(name, "query_1700000000.in");
    }
}
