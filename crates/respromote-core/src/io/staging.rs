//! Local staging directory for fetched archives.
//!
//! Layout: `{stage}/{ruleapp}_ruleapp.jar` for `RuleApp` archives and
//! `{stage}/{xom}` (version-less) for XOM bytecode. Files are overwritten on
//! every run and never deleted by the promoter.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::PromoteError;

/// Buffer size used when draining a response body to disk.
pub const COPY_BUFFER_SIZE: usize = 1024;

/// A staging directory owned by one promotion at a time.
#[derive(Debug, Clone)]
pub struct Staging {
    dir: PathBuf,
}

impl Staging {
    /// Use `dir` as the staging directory. The directory is not created.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create `dir` (and parents) if needed, then use it.
    ///
    /// # Errors
    ///
    /// Returns [`PromoteError::Storage`] if the directory cannot be created.
    pub async fn ensure(dir: impl Into<PathBuf>) -> Result<Self, PromoteError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PromoteError::storage(&dir, e))?;
        Ok(Self { dir })
    }

    /// The staging directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path for the staged file `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PromoteError::Storage`] if the staging directory does not
    /// exist, or if `name` is not a plain file name.
    pub fn stage(&self, name: &str) -> Result<PathBuf, PromoteError> {
        if !self.dir.is_dir() {
            return Err(PromoteError::storage(
                &self.dir,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "staging directory does not exist",
                ),
            ));
        }

        let mut components = Path::new(name).components();
        let plain = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !plain {
            return Err(PromoteError::storage(
                self.dir.join(name),
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "staged name must be a plain file name",
                ),
            ));
        }

        Ok(self.dir.join(name))
    }

    fn check_staged(&self, path: &Path) -> Result<(), PromoteError> {
        if path.starts_with(&self.dir) {
            return Ok(());
        }
        Err(PromoteError::storage(
            path,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "path is outside the staging directory",
            ),
        ))
    }

    /// Read a staged file back in full.
    ///
    /// # Errors
    ///
    /// Returns [`PromoteError::Storage`] if `path` is outside the staging
    /// directory or the file cannot be read.
    pub async fn read(&self, path: &Path) -> Result<Vec<u8>, PromoteError> {
        self.check_staged(path)?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PromoteError::storage(path, e))?;
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        tracing::debug!(path = %absolute.display(), bytes = bytes.len(), "Read staged archive");
        Ok(bytes)
    }

    /// Drain `stream` into `path` through a [`COPY_BUFFER_SIZE`] buffer.
    ///
    /// The file is created or truncated. Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Errors yielded by the stream are returned as-is. A `path` outside the
    /// staging directory and create/write/flush failures are
    /// [`PromoteError::Storage`].
    pub async fn write<S>(&self, stream: S, path: &Path) -> Result<u64, PromoteError>
    where
        S: Stream<Item = Result<Bytes, PromoteError>>,
    {
        self.check_staged(path)?;
        let storage = |source: std::io::Error| PromoteError::storage(path, source);

        let file = File::create(path).await.map_err(storage)?;
        let mut writer = BufWriter::with_capacity(COPY_BUFFER_SIZE, file);
        let mut stream = std::pin::pin!(stream);
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await.map_err(storage)?;
            written += chunk.len() as u64;
        }

        writer.flush().await.map_err(storage)?;
        Ok(written)
    }

    /// Remove every regular file in the staging directory.
    ///
    /// Returns the number of files removed. A missing directory is treated as
    /// already clean.
    ///
    /// # Errors
    ///
    /// Returns [`PromoteError::Storage`] if the directory cannot be listed or
    /// a file cannot be removed.
    pub async fn purge(&self) -> Result<usize, PromoteError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(PromoteError::storage(&self.dir, e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PromoteError::storage(&self.dir, e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| PromoteError::storage(&path, e))?;
            if file_type.is_file() {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|e| PromoteError::storage(&path, e))?;
                removed += 1;
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn chunks(parts: &[&'static [u8]]) -> impl Stream<Item = Result<Bytes, PromoteError>> {
        futures::stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::from_static(p)))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_stage_requires_existing_directory() {
        let tmp = TempDir::new().unwrap();
        let staging = Staging::new(tmp.path().join("missing"));
        let err = staging.stage("loan_ruleapp.jar").unwrap_err();
        assert!(matches!(err, PromoteError::Storage { .. }));
    }

    #[test]
    fn test_stage_rejects_nested_names() {
        let tmp = TempDir::new().unwrap();
        let staging = Staging::new(tmp.path());
        assert_eq!(
            staging.stage("xomA").unwrap(),
            tmp.path().join("xomA")
        );
        assert!(staging.stage("../xomA").is_err());
        assert!(staging.stage("a/b").is_err());
        assert!(staging.stage("").is_err());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let tmp = TempDir::new().unwrap();
        let staging = Staging::new(tmp.path());
        let path = staging.stage("xomA").unwrap();

        let large = vec![7u8; COPY_BUFFER_SIZE * 3 + 17];
        let large: &'static [u8] = Box::leak(large.into_boxed_slice());
        let written = staging
            .write(chunks(&[b"PK", large, b"tail"]), &path)
            .await
            .unwrap();

        let back = staging.read(&path).await.unwrap();
        assert_eq!(written, back.len() as u64);
        assert_eq!(&back[..2], b"PK");
        assert_eq!(&back[back.len() - 4..], b"tail");
    }

    #[tokio::test]
    async fn test_write_truncates_previous_content() {
        let tmp = TempDir::new().unwrap();
        let staging = Staging::new(tmp.path());
        let path = staging.stage("xomA").unwrap();

        staging.write(chunks(&[b"first run, longer"]), &path).await.unwrap();
        staging.write(chunks(&[b"second"]), &path).await.unwrap();

        assert_eq!(staging.read(&path).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_stream_error_is_propagated() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("xomA");
        let stream = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(PromoteError::protocol("http://src/xoms/xomA/1/bytecode", "truncated")),
        ]);

        let err = Staging::new(tmp.path())
            .write(stream, &path)
            .await
            .unwrap_err();
        assert!(matches!(err, PromoteError::Protocol { .. }));
    }

    #[tokio::test]
    async fn test_write_outside_staging_dir_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let staging = Staging::ensure(tmp.path().join("data")).await.unwrap();
        let outside = tmp.path().join("xomA");

        let err = staging
            .write(chunks(&[b"PK"]), &outside)
            .await
            .unwrap_err();
        assert!(matches!(err, PromoteError::Storage { .. }));
        assert!(!outside.exists());

        std::fs::write(&outside, b"PK").unwrap();
        assert!(staging.read(&outside).await.is_err());
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let tmp = TempDir::new().unwrap();
        let staging = Staging::new(tmp.path());
        let err = staging.read(&tmp.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, PromoteError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_ensure_and_purge() {
        let tmp = TempDir::new().unwrap();
        let staging = Staging::ensure(tmp.path().join("data")).await.unwrap();
        assert!(staging.dir().is_dir());

        std::fs::write(staging.stage("loan_ruleapp.jar").unwrap(), b"jar").unwrap();
        std::fs::write(staging.stage("xomA").unwrap(), b"xom").unwrap();
        std::fs::create_dir(staging.dir().join("keep")).unwrap();

        assert_eq!(staging.purge().await.unwrap(), 2);
        assert!(staging.dir().join("keep").is_dir());
        assert_eq!(staging.purge().await.unwrap(), 0);

        let missing = Staging::new(tmp.path().join("never-created"));
        assert_eq!(missing.purge().await.unwrap(), 0);
    }
}
