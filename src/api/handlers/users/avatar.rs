//! Avatar ingestion pipeline: staged upload → resize → durable commit →
//! best-effort staging cleanup.
//!
//! Destination names are deterministic (`<account-id><ext>`), so re-uploading
//! always replaces the previous avatar at the same path. The resized image is
//! written to a scratch sibling and renamed into place, so the destination
//! never exists partially written.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{ImageReader, imageops::FilterType};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Fixed square output size for committed avatars.
pub const AVATAR_DIMENSION: u32 = 250;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("avatar file is required")]
    MissingFile,
    #[error("failed to process avatar image")]
    Processing(#[source] anyhow::Error),
}

/// Image transformation collaborator; constructed once at process start.
pub trait ImageProcessor: Send + Sync {
    /// Decode `input`, resize to a `size` x `size` square, and write `output`
    /// in the input's format.
    ///
    /// # Errors
    /// `MissingFile` when the input does not exist, `Processing` for decode,
    /// resize, or write failures.
    fn square(&self, input: &Path, output: &Path, size: u32) -> Result<(), IngestError>;
}

/// Default processor backed by the `image` crate.
pub struct FixedResizer;

impl ImageProcessor for FixedResizer {
    fn square(&self, input: &Path, output: &Path, size: u32) -> Result<(), IngestError> {
        let reader = ImageReader::open(input).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                IngestError::MissingFile
            } else {
                IngestError::Processing(err.into())
            }
        })?;
        // Sniff the content rather than trusting the staged extension.
        let reader = reader
            .with_guessed_format()
            .map_err(|err| IngestError::Processing(err.into()))?;
        let Some(format) = reader.format() else {
            return Err(IngestError::Processing(anyhow::anyhow!(
                "unrecognized image format"
            )));
        };
        let decoded = reader
            .decode()
            .map_err(|err| IngestError::Processing(err.into()))?;

        let resized = decoded.resize_exact(size, size, FilterType::Triangle);
        resized
            .save_with_format(output, format)
            .map_err(|err| IngestError::Processing(err.into()))?;
        Ok(())
    }
}

/// Commits staged uploads into the durable avatar store.
pub struct AvatarIngester {
    upload_dir: PathBuf,
    avatar_dir: PathBuf,
    public_path: String,
    processor: Arc<dyn ImageProcessor>,
}

impl AvatarIngester {
    #[must_use]
    pub fn new(
        upload_dir: PathBuf,
        avatar_dir: PathBuf,
        public_path: String,
        processor: Arc<dyn ImageProcessor>,
    ) -> Self {
        Self {
            upload_dir,
            avatar_dir,
            public_path,
            processor,
        }
    }

    /// Create the staging and durable directories if absent.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    pub fn ensure_directories(&self) -> io::Result<()> {
        fs::create_dir_all(&self.upload_dir)?;
        fs::create_dir_all(&self.avatar_dir)
    }

    #[must_use]
    pub fn avatar_dir(&self) -> &Path {
        &self.avatar_dir
    }

    #[must_use]
    pub fn public_path(&self) -> &str {
        &self.public_path
    }

    /// Scratch path for an incoming upload, namespaced by account so parallel
    /// uploads from different accounts never collide.
    #[must_use]
    pub fn staging_path(&self, account_id: Uuid, original_name: &str) -> PathBuf {
        // Only the final path component; uploads must not escape the
        // staging directory.
        let name = Path::new(original_name)
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or("upload");
        self.upload_dir.join(format!("{account_id}-{name}"))
    }

    /// Deterministic destination filename: `<account-id><original ext>`.
    #[must_use]
    pub fn destination_name(account_id: Uuid, original_name: &str) -> String {
        match Path::new(original_name)
            .extension()
            .and_then(OsStr::to_str)
        {
            Some(ext) => format!("{account_id}.{}", ext.to_lowercase()),
            None => account_id.to_string(),
        }
    }

    /// Resize the staged file and commit it under the deterministic name,
    /// returning the public URL path.
    ///
    /// The commit is a scratch-write plus rename, so a processing failure
    /// leaves any previous avatar untouched. Staging cleanup afterwards is
    /// best-effort: the observable outcome depends only on the commit.
    ///
    /// # Errors
    /// `MissingFile` if the staged file is gone, `Processing` for decode,
    /// resize, or store failures.
    pub fn ingest(
        &self,
        account_id: Uuid,
        staged: &Path,
        original_name: &str,
    ) -> Result<String, IngestError> {
        let file_name = Self::destination_name(account_id, original_name);
        let destination = self.avatar_dir.join(&file_name);
        let scratch = self.avatar_dir.join(format!(".tmp-{file_name}"));

        let committed = self
            .processor
            .square(staged, &scratch, AVATAR_DIMENSION)
            .and_then(|()| {
                fs::rename(&scratch, &destination)
                    .map_err(|err| IngestError::Processing(err.into()))
            });
        if let Err(err) = committed {
            let _ = fs::remove_file(&scratch);
            return Err(err);
        }

        if let Err(err) = fs::remove_file(staged) {
            warn!(
                "Could not delete staged upload {}: {err}",
                staged.display()
            );
        }

        Ok(format!(
            "{}/{}",
            self.public_path.trim_end_matches('/'),
            file_name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn ingester(root: &TempDir) -> AvatarIngester {
        AvatarIngester::new(
            root.path().join("tmp"),
            root.path().join("avatars"),
            "/avatars".to_string(),
            Arc::new(FixedResizer),
        )
    }

    fn stage_image(ingester: &AvatarIngester, account_id: Uuid, name: &str, color: Rgb<u8>) -> Result<PathBuf> {
        let staged = ingester.staging_path(account_id, name);
        let mut img = RgbImage::new(10, 5);
        for pixel in img.pixels_mut() {
            *pixel = color;
        }
        img.save(&staged)?;
        Ok(staged)
    }

    #[test]
    fn ingest_commits_fixed_square() -> Result<()> {
        let root = TempDir::new()?;
        let ingester = ingester(&root);
        ingester.ensure_directories()?;
        let account_id = Uuid::new_v4();

        let staged = stage_image(&ingester, account_id, "photo.png", Rgb([255, 0, 0]))?;
        let url = ingester.ingest(account_id, &staged, "photo.png")?;

        assert_eq!(url, format!("/avatars/{account_id}.png"));
        let committed = image::open(root.path().join("avatars").join(format!("{account_id}.png")))?;
        assert_eq!(committed.width(), AVATAR_DIMENSION);
        assert_eq!(committed.height(), AVATAR_DIMENSION);
        // Staged file is cleaned up after a successful commit.
        assert!(!staged.exists());
        Ok(())
    }

    #[test]
    fn reupload_replaces_at_same_path() -> Result<()> {
        let root = TempDir::new()?;
        let ingester = ingester(&root);
        ingester.ensure_directories()?;
        let account_id = Uuid::new_v4();

        let staged = stage_image(&ingester, account_id, "first.png", Rgb([255, 0, 0]))?;
        let first_url = ingester.ingest(account_id, &staged, "first.png")?;

        let staged = stage_image(&ingester, account_id, "second.png", Rgb([0, 0, 255]))?;
        let second_url = ingester.ingest(account_id, &staged, "second.png")?;

        // Same extension, same account: identical destination path.
        assert_eq!(first_url, second_url);
        let committed =
            image::open(root.path().join("avatars").join(format!("{account_id}.png")))?.to_rgb8();
        assert_eq!(committed.get_pixel(0, 0), &Rgb([0, 0, 255]));
        Ok(())
    }

    #[test]
    fn missing_staged_file_is_missing_file() -> Result<()> {
        let root = TempDir::new()?;
        let ingester = ingester(&root);
        ingester.ensure_directories()?;
        let account_id = Uuid::new_v4();

        let staged = ingester.staging_path(account_id, "ghost.png");
        let err = ingester
            .ingest(account_id, &staged, "ghost.png")
            .expect_err("missing staged file must fail");
        assert!(matches!(err, IngestError::MissingFile));
        Ok(())
    }

    #[test]
    fn undecodable_staged_file_is_processing_error() -> Result<()> {
        let root = TempDir::new()?;
        let ingester = ingester(&root);
        ingester.ensure_directories()?;
        let account_id = Uuid::new_v4();

        let staged = ingester.staging_path(account_id, "fake.png");
        fs::write(&staged, b"this is not an image")?;
        let err = ingester
            .ingest(account_id, &staged, "fake.png")
            .expect_err("garbage bytes must fail");
        assert!(matches!(err, IngestError::Processing(_)));
        // A failed ingest leaves no scratch or destination artifacts behind.
        let leftovers: Vec<_> = fs::read_dir(root.path().join("avatars"))?.collect();
        assert!(leftovers.is_empty());
        Ok(())
    }

    #[test]
    fn destination_name_lowercases_extension() {
        let account_id = Uuid::new_v4();
        assert_eq!(
            AvatarIngester::destination_name(account_id, "Photo.JPG"),
            format!("{account_id}.jpg")
        );
        assert_eq!(
            AvatarIngester::destination_name(account_id, "no-extension"),
            account_id.to_string()
        );
    }

    #[test]
    fn staging_path_strips_directories() -> Result<()> {
        let root = TempDir::new()?;
        let ingester = ingester(&root);
        let account_id = Uuid::new_v4();
        let staged = ingester.staging_path(account_id, "../../evil.png");
        assert_eq!(
            staged,
            root.path().join("tmp").join(format!("{account_id}-evil.png"))
        );
        Ok(())
    }
}
