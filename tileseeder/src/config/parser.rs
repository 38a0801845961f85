//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};
use reqwest::Url;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::MAX_ZOOM;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("qgis_server")) {
        if let Some(v) = non_empty(section, "url") {
            Url::parse(v).map_err(|e| invalid("qgis_server", "url", v, &e.to_string()))?;
            config.qgis_server.url = v.to_string();
        }
        if let Some(v) = non_empty(section, "timeout") {
            config.qgis_server.timeout = positive(
                "qgis_server",
                "timeout",
                v,
                "must be a positive integer (seconds)",
            )?;
        }
    }

    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = non_empty(section, "tiles_directory") {
            config.cache.tiles_directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "thumbnails_directory") {
            config.cache.thumbnails_directory = expand_tilde(v);
        }
    }

    if let Some(section) = ini.section(Some("catalog")) {
        if let Some(v) = non_empty(section, "directory") {
            config.catalog.directory = expand_tilde(v);
        }
    }

    if let Some(section) = ini.section(Some("queue")) {
        if let Some(v) = non_empty(section, "workers") {
            config.queue.workers =
                positive::<usize>("queue", "workers", v, "must be a positive integer")?;
        }
        if let Some(v) = non_empty(section, "max_retries") {
            config.queue.max_retries =
                parse("queue", "max_retries", v, "must be a non-negative integer")?;
        }
        if let Some(v) = non_empty(section, "retry_delay") {
            config.queue.retry_delay = parse(
                "queue",
                "retry_delay",
                v,
                "must be a non-negative integer (seconds)",
            )?;
        }
        if let Some(v) = non_empty(section, "backoff") {
            config.queue.backoff =
                parse("queue", "backoff", v, "must be 'fixed' or 'exponential'")?;
        }
    }

    if let Some(section) = ini.section(Some("seed")) {
        let zoom_reason = format!("must be an integer between 0 and {}", MAX_ZOOM);
        if let Some(v) = non_empty(section, "min_zoom") {
            config.seed.min_zoom = zoom("min_zoom", v, &zoom_reason)?;
        }
        if let Some(v) = non_empty(section, "max_zoom") {
            config.seed.max_zoom = zoom("max_zoom", v, &zoom_reason)?;
        }
        if config.seed.min_zoom > config.seed.max_zoom {
            return Err(invalid(
                "seed",
                "min_zoom",
                &config.seed.min_zoom.to_string(),
                "must not exceed max_zoom",
            ));
        }
        if let Some(v) = non_empty(section, "style") {
            config.seed.style = v.to_string();
        }
    }

    if let Some(section) = ini.section(Some("thumbnail")) {
        if let Some(v) = non_empty(section, "width") {
            config.thumbnail.width =
                positive("thumbnail", "width", v, "must be a positive integer (pixels)")?;
        }
        if let Some(v) = non_empty(section, "height") {
            config.thumbnail.height =
                positive("thumbnail", "height", v, "must be a positive integer (pixels)")?;
        }
    }

    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = expand_tilde(v);
        }
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

fn parse<T: FromStr>(section: &str, key: &str, value: &str, reason: &str) -> Result<T, ConfigFileError> {
    value.parse().map_err(|_| invalid(section, key, value, reason))
}

fn positive<T>(section: &str, key: &str, value: &str, reason: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + PartialOrd + Default,
{
    let parsed: T = parse(section, key, value, reason)?;
    if parsed <= T::default() {
        return Err(invalid(section, key, value, reason));
    }
    Ok(parsed)
}

fn zoom(key: &str, value: &str, reason: &str) -> Result<u8, ConfigFileError> {
    let zoom: u8 = parse("seed", key, value, reason)?;
    if zoom > MAX_ZOOM {
        return Err(invalid("seed", key, value, reason));
    }
    Ok(zoom)
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
