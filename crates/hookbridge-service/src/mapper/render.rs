//! Lookup tables and formatting shared by the message builders.

use std::path::Path;

use chrono::{Local, TimeZone};

use hookbridge_core::error::AppError;
use hookbridge_core::result::AppResult;

/// Receiver used when a webhook names nobody.
pub const BROADCAST_RECIPIENT: &str = "All";
/// Downloader shown when the webhook does not say who downloaded.
pub const UNKNOWN_DOWNLOADER: &str = "unknown";
/// Share type text for unknown or absent share types.
pub const SHARE_TYPE_UNDEFINED: &str = "share type not defined";

const PERMISSIONS: &[(i64, &str)] = &[
    (1, "download/view"),
    (2, "update"),
    (3, "download/view/edit"),
    (4, "create"),
    (8, "delete"),
    (16, "grant access"),
    (19, "group"),
    (31, "all"),
];

/// Describe a share permission bitmask. Values outside the table render as
/// `undefined: <value>`.
pub fn permission_description(raw: &str) -> String {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|bits| PERMISSIONS.iter().find(|(v, _)| *v == bits))
        .map(|(_, text)| (*text).to_string())
        .unwrap_or_else(|| format!("undefined: {raw}"))
}

/// Describe who a share targets.
pub fn share_type_description(share_type: Option<&str>, share_with: &str) -> String {
    match share_type.map(str::trim) {
        Some("0") => format!("user: {share_with}"),
        Some("1") => format!("group: {share_with}"),
        Some("3") => "via link".to_string(),
        Some("4") => format!("guest: {share_with}"),
        _ => SHARE_TYPE_UNDEFINED.to_string(),
    }
}

/// Render a unix timestamp in local time as `YYYY-MM-DD HH:MM:SS`.
pub fn local_datetime(field: &str, timestamp: i64) -> AppResult<String> {
    Local
        .timestamp_opt(timestamp, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .ok_or_else(|| AppError::invalid_field(field, format!("timestamp {timestamp} out of range")))
}

/// Last component of a storage path.
pub fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Join a public link path onto the configured origin.
pub fn public_link(origin: &str, link_path: &str) -> String {
    if origin.is_empty() {
        return link_path.to_string();
    }
    match (origin.ends_with('/'), link_path.starts_with('/')) {
        (true, true) => format!("{}{}", origin.trim_end_matches('/'), link_path),
        (false, false) => format!("{origin}/{link_path}"),
        _ => format!("{origin}{link_path}"),
    }
}
