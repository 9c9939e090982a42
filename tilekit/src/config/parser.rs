//! INI parsing: `Ini` → `LayerConfig`.
//!
//! The single place where INI key names map onto struct fields. Parsing
//! starts from the defaults and overlays whatever the document sets.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::LayerConfig;
use super::size::parse_size;

pub(super) fn parse_ini(ini: &Ini) -> Result<LayerConfig, ConfigFileError> {
    let mut config = LayerConfig::default();

    if let Some(section) = ini.section(Some("layer")) {
        let layer = &mut config.layer;
        if let Some(v) = non_empty(section, "name") {
            layer.name = v.to_string();
        }
        if let Some(v) = non_empty(section, "dataset") {
            layer.dataset = v.to_string();
        }
        if let Some(v) = section.get("service") {
            layer.service = v.trim().to_string();
        }
        if let Some(v) = non_empty(section, "format") {
            if !v.contains('/') {
                return Err(invalid("layer", "format", v, "expected a MIME type like 'image/png'"));
            }
            layer.format = v.to_ascii_lowercase();
        }
        if let Some(v) = section.get("levels") {
            layer.levels = positive("layer", "levels", v)?;
        }
        if let Some(v) = section.get("level_zero_tile_delta") {
            let delta: f64 = number("layer", "level_zero_tile_delta", v)?;
            if !(delta.is_finite() && delta > 0.0 && delta <= 180.0) {
                return Err(invalid(
                    "layer",
                    "level_zero_tile_delta",
                    v,
                    "must be greater than 0 and at most 180 degrees",
                ));
            }
            layer.level_zero_tile_delta = delta;
        }
        if let Some(v) = section.get("tile_size") {
            layer.tile_size = positive("layer", "tile_size", v)?;
        }
    }

    if let Some(section) = ini.section(Some("retrieval")) {
        let retrieval = &mut config.retrieval;
        if let Some(v) = section.get("connect_timeout_ms") {
            retrieval.connect_timeout = Duration::from_millis(positive("retrieval", "connect_timeout_ms", v)?);
        }
        if let Some(v) = section.get("read_timeout_ms") {
            retrieval.read_timeout = Duration::from_millis(positive("retrieval", "read_timeout_ms", v)?);
        }
        if let Some(v) = section.get("use_cache") {
            retrieval.use_cache = parse_bool(v)
                .ok_or_else(|| invalid("retrieval", "use_cache", v, "must be true or false"))?;
        }
        if let Some(v) = section.get("pool_size") {
            retrieval.pool_size = positive("retrieval", "pool_size", v)?;
        }
    }

    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = non_empty(section, "directory") {
            config.cache.directory = expand_tilde(v);
        }
        if let Some(v) = section.get("memory_size") {
            config.cache.memory_size = parse_size(v).map_err(|_| {
                invalid("cache", "memory_size", v, "expected format like '256MB', '2GB', or '1024KB'")
            })?;
        }
    }

    if let Some(section) = ini.section(Some("delegates")) {
        config.delegates = section
            .get_all("delegate")
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from)
            .collect();
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn number<T: FromStr>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, "must be a number"))
}

fn positive<T>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + PartialOrd + Default,
{
    let n: T = value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, "must be a positive integer"))?;
    if n <= T::default() {
        return Err(invalid(section, key, value, "must be a positive integer"));
    }
    Ok(n)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
