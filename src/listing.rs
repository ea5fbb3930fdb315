#![forbid(unsafe_code)]

use tracing::info;
use url::Url;

use crate::config::ScraperConfig;
use crate::error::{ExtractionError, ScrapeError};
use crate::html::{Page, enclosing_link, resolve_path};
use crate::http::{Fetch, fetch_text};

/// Marker Plays.tv put on every embedded video thumbnail of a profile page.
pub const THUMBNAIL_SELECTOR: &str = "video.video-tag";

/// Fetches an archived profile page and returns the detail-page URL of every
/// video thumbnail, in document order.
pub fn list_videos(
    fetcher: &dyn Fetch,
    config: &ScraperConfig,
    archived_profile_url: &str,
) -> Result<Vec<Url>, ScrapeError> {
    let html = fetch_text(fetcher, archived_profile_url)?;
    let page = Page::parse(archived_profile_url, &html);
    let videos = detail_links(&page, config)?;
    info!(count = videos.len(), page = archived_profile_url, "listed videos");
    Ok(videos)
}

/// A profile without thumbnails yields an empty list, not an error.
pub fn detail_links(page: &Page, config: &ScraperConfig) -> Result<Vec<Url>, ExtractionError> {
    page.select_all(THUMBNAIL_SELECTOR)?
        .into_iter()
        .enumerate()
        .map(|(index, thumbnail)| {
            let href = enclosing_link(thumbnail)
                .and_then(|link| link.value().attr("href"))
                .ok_or_else(|| ExtractionError::MissingLink {
                    page: page.url().to_string(),
                    index,
                })?;
            resolve_path(&config.archive_root, href)
        })
        .collect()
}
