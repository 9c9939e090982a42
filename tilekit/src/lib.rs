//! TileKit - configurable tile pipelines for virtual-globe imagery
//!
//! A tiled imagery layer is assembled from small pipeline stages called
//! delegates. Each delegate is created from a definition string and plays
//! one or more roles in the layer's pipeline: building tile URLs, creating
//! retrievers, reading image files, transforming decoded images, adjusting
//! render state, and creating tiles.
//!
//! Tile bytes are retrieved through the [`retrieve`] module, either directly
//! or through a prioritized pooled retrieval service behind a blocking
//! bridge.
//!
//! # Example
//!
//! ```
//! use tilekit::delegate::{DelegateContext, DelegateFactory, DelegateKit};
//!
//! let factory = DelegateFactory::with_defaults();
//! let kit = DelegateKit::from_definitions(
//!     ["ResizeTransformer(256,256)", "ColorToAlphaTransformer(0,0,0)"],
//!     &factory,
//!     &DelegateContext::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(kit.transformer_count(), 2);
//! ```

pub mod cache;
pub mod config;
pub mod delegate;
pub mod layer;
pub mod logging;
pub mod render;
pub mod retrieve;
pub mod tile;
