#![forbid(unsafe_code)]

//! Runs resolver, listing, detail extraction and download in order.
//!
//! Each stage runs inside its own `tracing` span, and every video inside a
//! `video` span carrying `current`/`total`, so the log shows how far a run got.

use std::path::Path;

use tracing::{info, info_span};

use crate::config::ScraperConfig;
use crate::detail::{VideoRecord, extract_video};
use crate::download::{DownloadReport, download_videos};
use crate::error::ScrapeError;
use crate::http::Fetch;
use crate::listing::list_videos;
use crate::snapshot::{Snapshot, resolve_snapshot};

#[derive(Debug)]
pub struct RunSummary {
    pub snapshot: Snapshot,
    pub records: Vec<VideoRecord>,
    pub downloads: Vec<DownloadReport>,
}

pub fn run(
    fetcher: &dyn Fetch,
    config: &ScraperConfig,
    username: &str,
    root: &Path,
) -> Result<RunSummary, ScrapeError> {
    let _run = info_span!("scrape", user = username).entered();
    let profile_url = config.profile_url(username);

    let snapshot = {
        let _stage = info_span!("resolve", profile = %profile_url).entered();
        resolve_snapshot(fetcher, config, &profile_url)?
    };

    let pages = {
        let _stage = info_span!("list", snapshot = %snapshot.archive_url).entered();
        list_videos(fetcher, config, snapshot.archive_url.as_str())?
    };
    let total = pages.len();

    let records = {
        let _stage = info_span!("extract", total).entered();
        let mut records = Vec::with_capacity(total);
        for (index, page) in pages.iter().enumerate() {
            let _video = info_span!("video", current = index + 1, total).entered();
            info!(page = %page, "reading video page");
            records.push(extract_video(fetcher, config, page.as_str())?);
        }
        records
    };

    let downloads = {
        let _stage = info_span!("download", total, root = %root.display()).entered();
        download_videos(fetcher, &records, root)?
    };
    info!(videos = downloads.len(), "run complete");

    Ok(RunSummary {
        snapshot,
        records,
        downloads,
    })
}
