//! Downloading and cleaning up submission files.
//!
//! Files land in the configured download directory named after the last URL
//! path segment. Cleanup is best-effort: a file that cannot be deleted is
//! logged and left behind, it never affects the grading outcome.

use std::path::{Path, PathBuf};

use crate::error::{GradrError, Result};
use crate::lms::client::LmsClient;
use crate::lms::types::SubmissionDetail;

/// Derive a local filename from a file URL, stripping query and fragment.
pub fn filename_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next().unwrap_or("").trim();
    if name.is_empty() {
        "download".to_string()
    } else {
        name.to_string()
    }
}

/// Download every attached file of a submission into `dir`.
///
/// Returns the local paths in the order the LMS listed them; the first one
/// is the canonical submission.
pub async fn download_files<C: LmsClient + ?Sized>(
    client: &C,
    detail: &SubmissionDetail,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let file_details = &detail.exercise.file_details;
    if file_details.is_empty() {
        tracing::warn!(
            attempt_id = %detail.exercise.attempt_id,
            "no files attached to submission"
        );
        return Ok(Vec::new());
    }

    tokio::fs::create_dir_all(dir).await?;

    let mut downloaded = Vec::with_capacity(file_details.len());
    for file in file_details {
        let bytes = client
            .fetch_file(&file.file_path)
            .await
            .map_err(|failure| GradrError::Download {
                path: file.file_path.clone(),
                message: failure.to_string(),
            })?;
        let dest = dir.join(filename_from_url(&file.file_path));
        tokio::fs::write(&dest, &bytes).await?;
        tracing::info!(file = %dest.display(), bytes = bytes.len(), "downloaded submission file");
        downloaded.push(dest);
    }

    Ok(downloaded)
}

/// Delete downloaded files after a successful grade submission. Best-effort.
pub fn remove_files(paths: &[PathBuf]) {
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => tracing::info!(file = %path.display(), "deleted downloaded file"),
            Err(err) => {
                tracing::warn!(file = %path.display(), %err, "could not delete downloaded file")
            }
        }
    }
}
