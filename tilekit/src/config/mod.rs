//! Layer configuration files.
//!
//! A layer is described by an INI document:
//!
//! ```ini
//! [layer]
//! name = Blue Marble
//! dataset = bmng
//! service = https://tiles.example.com/bmng/{z}/{y}/{x}.png
//! format = image/png
//! levels = 5
//!
//! [retrieval]
//! read_timeout_ms = 20000
//!
//! [cache]
//! directory = ~/.cache/tilekit
//! memory_size = 256MB
//!
//! [delegates]
//! delegate = ResizeTransformer(256,256)
//! delegate = ColorToAlphaTransformer(0,0,0)
//! ```
//!
//! # Example
//!
//! ```
//! use tilekit::config::LayerConfig;
//!
//! let config = LayerConfig::from_ini_str("[layer]\nname = Demo\nlevels = 3\n").unwrap();
//! assert_eq!(config.layer.name, "Demo");
//! assert_eq!(config.level_set().len(), 3);
//! ```

mod file;
mod parser;
mod settings;
mod size;
mod writer;

pub use file::ConfigFileError;
pub use settings::{
    default_cache_directory, CacheSettings, LayerConfig, LayerSettings, RetrievalSettings,
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_DATASET, DEFAULT_FORMAT, DEFAULT_LAYER_NAME,
    DEFAULT_LEVEL_COUNT, DEFAULT_READ_TIMEOUT_MS,
};
pub use size::{format_size, parse_size, SizeParseError};
