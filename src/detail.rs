#![forbid(unsafe_code)]

//! Turns an archived video page into a [`VideoRecord`].
//!
//! Each field comes from its own first-match lookup and none of them has a
//! fallback: a page that lacks the 720p source, the game link, the creation
//! date or the description aborts extraction.

use chrono::NaiveDate;
use tracing::debug;
use url::Url;

use crate::config::ScraperConfig;
use crate::error::{ExtractionError, ScrapeError};
use crate::html::{Page, path_suffix, resolve};
use crate::http::{Fetch, fetch_text};

pub const GAME_SELECTOR: &str = "a.game-link";
pub const CREATED_SELECTOR: &str = "a.created-time";
pub const CAPTION_SELECTOR: &str = "span.description-text";

/// One archived video, ready to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub media_url: Url,
    /// Game label; used as-is as the output directory name.
    pub category: String,
    pub upload_date: NaiveDate,
    pub caption: String,
    pub filename: String,
}

pub fn extract_video(
    fetcher: &dyn Fetch,
    config: &ScraperConfig,
    detail_url: &str,
) -> Result<VideoRecord, ScrapeError> {
    let html = fetch_text(fetcher, detail_url)?;
    let page = Page::parse(detail_url, &html);
    let record = parse_video_page(&page, config)?;
    debug!(page = detail_url, filename = %record.filename, "extracted video");
    Ok(record)
}

pub fn parse_video_page(
    page: &Page,
    config: &ScraperConfig,
) -> Result<VideoRecord, ExtractionError> {
    let source_selector = source_selector(&config.resolution);
    let source_path = page.require_attr(&source_selector, "src")?;
    let media_url = resolve(&config.archive_root, &source_path)?;

    let category = page.require_text(GAME_SELECTOR)?;

    let date_text = page.require_text(CREATED_SELECTOR)?;
    let upload_date = parse_upload_date(page.url(), &date_text, &config.date_format)?;

    let caption = page.require_text(CAPTION_SELECTOR)?;
    let filename = derive_filename(upload_date, &caption, &source_path);

    Ok(VideoRecord {
        media_url,
        category,
        upload_date,
        caption,
        filename,
    })
}

/// Selector for the `<source>` carrying the wanted resolution tier.
pub fn source_selector(resolution: &str) -> String {
    format!("source[res=\"{resolution}\"]")
}

/// Surrounding whitespace is ignored. The text must have the same
/// whitespace-separated fields as `format` before chrono sees it, since chrono
/// alone accepts `Jan 5 19` as year 19 and `Jan5 2019` with no separator.
pub fn parse_upload_date(
    page: &str,
    text: &str,
    format: &str,
) -> Result<NaiveDate, ExtractionError> {
    let invalid = |reason: String| ExtractionError::UploadDate {
        page: page.to_string(),
        text: text.to_string(),
        format: format.to_string(),
        reason,
    };
    let trimmed = text.trim();
    check_date_fields(trimmed, format).map_err(invalid)?;
    NaiveDate::parse_from_str(trimmed, format).map_err(|err| invalid(err.to_string()))
}

fn check_date_fields(text: &str, format: &str) -> Result<(), String> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    let directives: Vec<&str> = format.split_whitespace().collect();
    if fields.len() != directives.len() {
        return Err(format!(
            "expected {} fields, found {}",
            directives.len(),
            fields.len()
        ));
    }

    for (field, directive) in fields.iter().zip(&directives) {
        let digits = field.bytes().all(|b| b.is_ascii_digit());
        let ok = match *directive {
            "%b" => field.len() == 3 && field.bytes().all(|b| b.is_ascii_alphabetic()),
            "%d" | "%m" => digits && (1..=2).contains(&field.len()),
            "%Y" => digits && field.len() == 4,
            literal => *field == literal,
        };
        if !ok {
            return Err(format!("{field:?} is not a valid `{directive}` field"));
        }
    }
    Ok(())
}

/// `<YYYY-MM-DD> <caption><ext>`, with the extension taken from the `src`
/// attribute as written on the page rather than from the resolved URL.
pub fn derive_filename(upload_date: NaiveDate, caption: &str, source_path: &str) -> String {
    format!(
        "{} {}{}",
        upload_date.format("%Y-%m-%d"),
        caption,
        path_suffix(source_path)
    )
}
