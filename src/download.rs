#![forbid(unsafe_code)]

use std::fs;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use tracing::{info, info_span, warn};

use crate::detail::VideoRecord;
use crate::error::ScrapeError;
use crate::http::Fetch;

/// What ended up on disk for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub path: PathBuf,
    pub bytes: usize,
    pub status: u16,
}

/// Downloads every record, one after the other, into `root/<category>/`.
/// Existing files are overwritten.
pub fn download_videos(
    fetcher: &dyn Fetch,
    records: &[VideoRecord],
    root: &Path,
) -> Result<Vec<DownloadReport>, ScrapeError> {
    let total = records.len();
    let mut reports = Vec::with_capacity(total);
    for (index, record) in records.iter().enumerate() {
        let _video = info_span!("video", current = index + 1, total).entered();
        reports.push(download_video(fetcher, record, root)?);
    }
    Ok(reports)
}

/// The body is written even when the server answered with an error status;
/// only transport and filesystem failures stop the run.
pub fn download_video(
    fetcher: &dyn Fetch,
    record: &VideoRecord,
    root: &Path,
) -> Result<DownloadReport, ScrapeError> {
    flag_path_separators("category", &record.category);
    flag_path_separators("filename", &record.filename);

    let dir = root.join(&record.category);
    fs::create_dir_all(&dir).map_err(|source| ScrapeError::Filesystem {
        path: dir.clone(),
        source,
    })?;
    let path = dir.join(&record.filename);

    let response = fetcher.get(record.media_url.as_str())?;
    if !response.is_success() {
        warn!(
            url = %record.media_url,
            status = response.status,
            "media request did not succeed; writing body anyway"
        );
    }

    fs::write(&path, &response.body).map_err(|source| ScrapeError::Filesystem {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), bytes = response.body.len(), "saved video");

    Ok(DownloadReport {
        path,
        bytes: response.body.len(),
        status: response.status,
    })
}

/// Category and caption text go into paths unsanitised; make it visible when
/// that will nest or escape the intended directory.
fn flag_path_separators(field: &str, value: &str) {
    if value.contains('/') || value.contains(MAIN_SEPARATOR) {
        warn!(field, value, "path segment contains a separator");
    }
}
