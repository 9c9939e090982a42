//! INI serialization: `LayerConfig` → commented INI string.

use super::settings::LayerConfig;
use super::size::format_size;

pub(super) fn to_ini_string(config: &LayerConfig) -> String {
    let layer = &config.layer;
    let retrieval = &config.retrieval;

    let mut out = format!(
        r#"[layer]
; Display name, also the retrieval caller
name = {name}
; Cache name shared by every level
dataset = {dataset}
; Tile URL template: {{z}} level, {{x}} column, {{y}} row from the south,
; {{-y}} row from the north, {{ext}} format extension
service = {service}
; Image MIME type
format = {format}
levels = {levels}
; Tile edge in degrees at level 0, halved at every level
level_zero_tile_delta = {delta}
tile_size = {tile_size}

[retrieval]
connect_timeout_ms = {connect}
read_timeout_ms = {read}
; false asks intermediate caches to revalidate
use_cache = {use_cache}
; Retrieval worker threads
pool_size = {pool_size}

[cache]
; Downloaded tile files
directory = {directory}
; Decoded textures held in memory. Supports KB, MB, GB suffixes
memory_size = {memory_size}

[delegates]
; One definition per line, in pipeline order. Defaults are implied:
; HttpRetriever(), UrlRequester(), TextureTileFactory(), ImageReader()
"#,
        name = layer.name,
        dataset = layer.dataset,
        service = layer.service,
        format = layer.format,
        levels = layer.levels,
        delta = layer.level_zero_tile_delta,
        tile_size = layer.tile_size,
        connect = retrieval.connect_timeout.as_millis(),
        read = retrieval.read_timeout.as_millis(),
        use_cache = retrieval.use_cache,
        pool_size = retrieval.pool_size,
        directory = config.cache.directory.to_string_lossy(),
        memory_size = format_size(config.cache.memory_size),
    );

    for delegate in &config.delegates {
        out.push_str("delegate = ");
        out.push_str(delegate);
        out.push('\n');
    }
    out
}
