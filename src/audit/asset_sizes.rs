//! Asset size lookup via HEAD requests

use crate::audit::pool::WorkerPool;
use crate::state::{AssetRow, FileSize};
use reqwest::header::CONTENT_LENGTH;
use reqwest::Client;
use std::time::Duration;

/// Looks up the declared size of one asset
///
/// A non-success status, a missing or unparseable `Content-Length`, and any
/// transport failure all give [`FileSize::Unavailable`].
pub async fn fetch_size(client: &Client, url: &str, timeout: Duration) -> FileSize {
    let response = match client.head(url).timeout(timeout).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("Size lookup failed for {}: {}", url, e);
            return FileSize::Unavailable;
        }
    };

    if !response.status().is_success() {
        tracing::debug!("Size lookup for {} returned {}", url, response.status());
        return FileSize::Unavailable;
    }

    // Read the header itself: for HEAD responses the body length is zero.
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(FileSize::from_bytes)
        .unwrap_or(FileSize::Unavailable)
}

/// Fills in `file_size` for every asset, keeping discovery order
pub async fn lookup_sizes(
    client: &Client,
    assets: Vec<AssetRow>,
    pool: &WorkerPool,
    timeout: Duration,
) -> Vec<AssetRow> {
    let client = client.clone();
    let total = assets.len();

    let outcomes = pool
        .run(assets, move |asset: AssetRow| {
            let client = client.clone();
            async move { fetch_size(&client, &asset.asset_url, timeout).await }
        })
        .await;

    let sized: Vec<AssetRow> = outcomes
        .into_iter()
        .map(|outcome| {
            let mut asset = outcome.item;
            asset.file_size = outcome.result.unwrap_or(FileSize::Unavailable);
            asset
        })
        .collect();

    let unavailable = sized
        .iter()
        .filter(|asset| asset.file_size == FileSize::Unavailable)
        .count();
    if unavailable > 0 {
        tracing::warn!("Size unavailable for {} of {} assets", unavailable, total);
    }

    sized
}
