//! `tilekit fetch`: load one tile through the full pipeline.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tilekit::cache::MemoryTextureCache;
use tilekit::config::LayerConfig;
use tilekit::delegate::DelegateFactory;
use tilekit::layer::TiledLayer;
use tilekit::retrieve::{DefaultTransport, PooledRetrievalService, RetrievalBridge};

use crate::error::CliError;

pub struct FetchArgs<'a> {
    pub config: &'a Path,
    pub level: u32,
    pub row: u32,
    pub col: u32,
    pub output: &'a Path,
}

pub fn run(args: FetchArgs<'_>) -> Result<(), CliError> {
    let config = LayerConfig::load_from(args.config)?;

    let service = Arc::new(PooledRetrievalService::new(
        config.service_config(),
        Arc::new(DefaultTransport::new()),
    ));
    let bridge = Arc::new(RetrievalBridge::new(service.clone()));
    let cache = Arc::new(MemoryTextureCache::new(config.cache.memory_size));

    let layer = Arc::new(TiledLayer::from_config(
        &config,
        &DelegateFactory::with_defaults(),
        bridge,
        cache,
    )?);

    let tile = layer.create_tile(args.level, args.row, args.col)?;
    println!("Fetching tile {} from layer '{}'", tile, layer.name());

    let start = Instant::now();
    let loaded = layer.load_tile(&tile);
    service.shutdown();

    if !loaded? {
        return Err(CliError::TileUnavailable(tile.to_string()));
    }
    let texture = layer
        .texture(&tile)
        .ok_or_else(|| CliError::TileUnavailable(tile.to_string()))?;

    texture.save(args.output).map_err(|error| CliError::ImageWrite {
        path: args.output.to_path_buf(),
        error,
    })?;

    println!(
        "Loaded {}x{} texture in {:.2}s",
        texture.width(),
        texture.height(),
        start.elapsed().as_secs_f64()
    );
    println!("Saved: {}", args.output.display());
    Ok(())
}
