//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[qgis_server]
; QGIS Server OWS endpoint used for GetMap and GetLegendGraphic requests
url = {}
; Request timeout in seconds
timeout = {}

[cache]
; Root of the tile cache: <tiles_directory>/<layer>/<style>/<z>/<x>/<y>.png
tiles_directory = {}
; Layer thumbnails: <thumbnails_directory>/<layer>.png
thumbnails_directory = {}

[catalog]
; Directory holding .qlr layer definitions and an optional layers.json
directory = {}

[queue]
; Number of concurrent fetch workers
workers = {}
; Retries after the first attempt when QGIS Server answers with an error status
max_retries = {}
; Seconds to wait before the first retry
retry_delay = {}
; "fixed" waits retry_delay every time, "exponential" doubles it per retry (up to 60s)
backoff = {}

[seed]
; Default zoom range for seeding (0-24)
min_zoom = {}
max_zoom = {}
; Default style; "default" requests the layer's default style
style = {}

[thumbnail]
; Thumbnail size in pixels
width = {}
height = {}

[logging]
file = {}
"#,
        config.qgis_server.url,
        config.qgis_server.timeout,
        path_to_string(&config.cache.tiles_directory),
        path_to_string(&config.cache.thumbnails_directory),
        path_to_string(&config.catalog.directory),
        config.queue.workers,
        config.queue.max_retries,
        config.queue.retry_delay,
        config.queue.backoff,
        config.seed.min_zoom,
        config.seed.max_zoom,
        config.seed.style,
        config.thumbnail.width,
        config.thumbnail.height,
        path_to_string(&config.logging.file),
    )
}

/// Render a path with the home directory collapsed back to `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(rest) = path.strip_prefix(&home) {
            return format!("~/{}", rest.display());
        }
    }
    path.display().to_string()
}
