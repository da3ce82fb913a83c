//! App listing endpoint
//!
//! Response format:
//!
//! ```json
//! { "applist": { "apps": [ {"appid": 10, "name": "Counter-Strike"} ] } }
//! ```
//!
//! The listing is fetched once per run and never checkpointed. Any failure to
//! obtain it aborts the run.

use crate::catalog::WorkItem;
use crate::CrawlError;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
struct AppListResponse {
    #[serde(default)]
    applist: AppList,
}

#[derive(Debug, Default, Deserialize)]
struct AppList {
    #[serde(default)]
    apps: Vec<RawApp>,
}

#[derive(Debug, Deserialize)]
struct RawApp {
    appid: u64,
    #[serde(default)]
    name: Option<String>,
}

/// Parses a listing body into work items, preserving order
///
/// Missing `applist` or `apps` keys yield an empty list.
pub fn parse_app_list(body: &str) -> Result<Vec<WorkItem>, serde_json::Error> {
    let response: AppListResponse = serde_json::from_str(body)?;
    Ok(response
        .applist
        .apps
        .into_iter()
        .map(|app| WorkItem::new(app.appid, app.name.unwrap_or_default()))
        .collect())
}

/// Fetches the full app listing in a single request
///
/// # Errors
///
/// Returns [`CrawlError::Listing`] on transport failure, non-success status or
/// an unparsable body.
pub async fn fetch_app_list(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<Vec<WorkItem>, CrawlError> {
    tracing::info!("Fetching app list from {}", url);

    let listing_error = |message: String| CrawlError::Listing {
        url: url.to_string(),
        message,
    };

    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| listing_error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(listing_error(format!("HTTP {}", status.as_u16())));
    }

    let body = response
        .text()
        .await
        .map_err(|e| listing_error(e.to_string()))?;

    let apps = parse_app_list(&body).map_err(|e| listing_error(format!("bad payload: {}", e)))?;
    tracing::info!("Total apps reported by listing: {}", apps.len());
    Ok(apps)
}
