#![forbid(unsafe_code)]

//! Finds the newest Wayback Machine capture of a profile page through the CDX
//! server API.

use chrono::NaiveDateTime;
use tracing::{info, warn};
use url::Url;

use crate::config::ScraperConfig;
use crate::error::{ExtractionError, ScrapeError};
use crate::html::resolve;
use crate::http::{Fetch, fetch_text};

/// Captures requested from the tail of the index. The newest one is picked
/// from whatever comes back.
const CDX_TAIL_LIMIT: u32 = 25;
const CDX_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub timestamp: NaiveDateTime,
    pub original: String,
    pub archive_url: Url,
}

/// Builds the CDX query for every capture of `profile_url`.
pub fn index_query(config: &ScraperConfig, profile_url: &str) -> Url {
    let mut query = config.cdx_endpoint.clone();
    query
        .query_pairs_mut()
        .append_pair("url", profile_url)
        .append_pair("output", "json")
        .append_pair("fl", "timestamp,original")
        .append_pair("limit", &format!("-{CDX_TAIL_LIMIT}"));
    query
}

pub fn resolve_snapshot(
    fetcher: &dyn Fetch,
    config: &ScraperConfig,
    profile_url: &str,
) -> Result<Snapshot, ScrapeError> {
    let query = index_query(config, profile_url);
    let body = fetch_text(fetcher, query.as_str())?;
    let snapshot = newest_capture(config, query.as_str(), &body)?.ok_or_else(|| {
        ScrapeError::NotFound {
            url: profile_url.to_string(),
        }
    })?;
    info!(
        profile = profile_url,
        archive_url = %snapshot.archive_url,
        "resolved newest snapshot"
    );
    Ok(snapshot)
}

/// Picks the capture with the greatest timestamp out of a CDX JSON table.
///
/// The CDX server answers with `[]` when nothing matched, otherwise with a
/// header row naming the columns followed by one row per capture.
fn newest_capture(
    config: &ScraperConfig,
    query_url: &str,
    body: &str,
) -> Result<Option<Snapshot>, ScrapeError> {
    let malformed = |reason: String| ExtractionError::IndexResponse {
        url: query_url.to_string(),
        reason,
    };

    if body.trim().is_empty() {
        return Ok(None);
    }
    let rows: Vec<Vec<String>> =
        serde_json::from_str(body).map_err(|err| malformed(err.to_string()))?;
    let Some((header, captures)) = rows.split_first() else {
        return Ok(None);
    };

    let column = |name: &str| {
        header
            .iter()
            .position(|field| field == name)
            .ok_or_else(|| malformed(format!("missing `{name}` column")))
    };
    let timestamp_col = column("timestamp")?;
    let original_col = column("original")?;

    let mut newest: Option<(NaiveDateTime, &str, &str)> = None;
    for row in captures {
        let (Some(raw), Some(original)) = (row.get(timestamp_col), row.get(original_col)) else {
            warn!(?row, "skipping short CDX row");
            continue;
        };
        let timestamp = match NaiveDateTime::parse_from_str(raw, CDX_TIMESTAMP_FORMAT) {
            Ok(timestamp) => timestamp,
            Err(err) => {
                warn!(timestamp = %raw, error = %err, "skipping CDX row with bad timestamp");
                continue;
            }
        };
        if newest.is_none_or(|(current, _, _)| timestamp > current) {
            newest = Some((timestamp, raw.as_str(), original.as_str()));
        }
    }

    let Some((timestamp, raw, original)) = newest else {
        return Ok(None);
    };
    let archive_url = resolve(&config.archive_root, &format!("web/{raw}/{original}"))?;
    Ok(Some(Snapshot {
        timestamp,
        original: original.to_string(),
        archive_url,
    }))
}
