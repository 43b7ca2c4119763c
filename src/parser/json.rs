use crate::error::{Result, SchedulerError};
use crate::types::{EngineConfig, ScheduleRequest};
use std::fs;
use std::path::Path;

/// Load a schedule request from a JSON file. When a `config.toml` sits next
/// to the request it overlays the request's embedded config.
pub fn load_request(path: &Path) -> Result<ScheduleRequest> {
    let mut request: ScheduleRequest = load_json_file(path)?;

    if let Some(dir) = path.parent() {
        if let Some(overlay) = load_config_overlay(&dir.join("config.toml")) {
            request.config = overlay;
        }
    }

    request.config.resolve_weights();
    Ok(request)
}

/// Load an engine config from TOML, if the file exists and parses
pub fn load_config_overlay(path: &Path) -> Option<EngineConfig> {
    if !path.exists() {
        return None;
    }
    let content = fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Generic JSON file loader
pub fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let path_str = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| SchedulerError::FileRead {
        path: path_str.clone(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| {
        SchedulerError::JsonParse {
            file: path_str,
            message: e.to_string(),
        }
        .into()
    })
}
