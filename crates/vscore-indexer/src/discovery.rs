//! Video discovery in an input folder.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{IndexerError, IndexerResult};

/// Recognized video container extensions, lowercase.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "m4v", "flv", "wmv"];

/// Whether `path` has a recognized video extension (case-insensitive).
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Video files directly inside `folder`, sorted by file name.
///
/// Subdirectories are not descended into.
pub async fn discover_videos(folder: impl AsRef<Path>) -> IndexerResult<Vec<PathBuf>> {
    let folder = folder.as_ref();

    let meta = fs::metadata(folder)
        .await
        .map_err(|_| IndexerError::InputNotFound(folder.to_path_buf()))?;
    if !meta.is_dir() {
        return Err(IndexerError::NotADirectory(folder.to_path_buf()));
    }

    let mut videos = Vec::new();
    let mut entries = fs::read_dir(folder).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_video_file(&path) {
            videos.push(path);
        }
    }
    videos.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    tracing::debug!(
        folder = %folder.display(),
        count = videos.len(),
        "Discovered videos"
    );
    Ok(videos)
}
