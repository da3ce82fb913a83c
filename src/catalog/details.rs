//! App detail endpoint
//!
//! The detail response wraps the payload in an envelope keyed by appid:
//!
//! ```json
//! { "440": { "success": true, "data": { "name": "Team Fortress 2", ... } } }
//! ```
//!
//! Anything other than a successful envelope with an object `data` is treated
//! as "no usable data", the same as a failed fetch.

use crate::storage::{DetailStatus, GameRecord};
use serde_json::{Map, Value};
use url::Url;

/// Builds the detail URL for one app
pub fn detail_url(
    base: &str,
    appid: u64,
    language: &str,
    country: &str,
) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        base,
        &[
            ("appids", appid.to_string().as_str()),
            ("l", language),
            ("cc", country),
        ],
    )
}

/// Pulls the `data` object for `appid` out of a detail response body
///
/// Returns `None` when the body is not JSON, the appid key is absent,
/// `success` is not `true`, or `data` is not an object.
pub fn extract_detail_data(appid: u64, body: &[u8]) -> Option<Map<String, Value>> {
    let envelope: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!("[{}] Detail body is not JSON: {}", appid, e);
            return None;
        }
    };

    let entry = envelope.get(appid.to_string())?;
    if entry.get("success").and_then(Value::as_bool) != Some(true) {
        tracing::debug!("[{}] Detail envelope reports no success", appid);
        return None;
    }

    match entry.get("data") {
        Some(Value::Object(data)) => Some(data.clone()),
        _ => None,
    }
}

fn non_empty_str<'a>(data: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    data.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn json_array_or_empty(value: Option<&Value>) -> String {
    match value {
        Some(v @ Value::Array(_)) => v.to_string(),
        _ => "[]".to_string(),
    }
}

fn release_date(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Object(obj) => obj.get("date").and_then(Value::as_str).map(str::to_string),
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn genre_names(value: Option<&Value>) -> String {
    let names: Vec<Value> = value
        .and_then(Value::as_array)
        .map(|genres| {
            genres
                .iter()
                .filter_map(|g| g.get("description").and_then(Value::as_str))
                .map(|d| Value::String(d.to_string()))
                .collect()
        })
        .unwrap_or_default();
    Value::Array(names).to_string()
}

/// Maps a detail payload onto a full game record
///
/// The title falls back to the listing name, then to `App <appid>`. The
/// description is the first non-empty of `short_description`,
/// `about_the_game` and `detailed_description`.
pub fn game_from_details(appid: u64, listing_name: &str, data: &Map<String, Value>) -> GameRecord {
    let title = non_empty_str(data, "name")
        .map(str::to_string)
        .or_else(|| {
            let name = listing_name.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .unwrap_or_else(|| format!("App {}", appid));

    let description = ["short_description", "about_the_game", "detailed_description"]
        .iter()
        .find_map(|key| non_empty_str(data, key))
        .unwrap_or_default()
        .to_string();

    let price_overview = match data.get("price_overview") {
        None | Some(Value::Null) => None,
        Some(v) => Some(v.to_string()),
    };

    GameRecord {
        appid,
        title,
        description,
        header_image: non_empty_str(data, "header_image").map(str::to_string),
        is_free: data.get("is_free").and_then(Value::as_bool).unwrap_or(false),
        release_date: release_date(data.get("release_date")),
        developers: json_array_or_empty(data.get("developers")),
        publishers: json_array_or_empty(data.get("publishers")),
        genres: genre_names(data.get("genres")),
        price_overview,
        raw_json: Value::Object(data.clone()).to_string(),
        detail_status: DetailStatus::Complete,
        local_image_path: None,
        created_at: None,
    }
}
