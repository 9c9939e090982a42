//! Tile delegate pipeline.
//!
//! A tiled layer is assembled at configuration time from delegates: small,
//! immutable pipeline stages each built from a definition string such as
//! `ResizeTransformer(256,256)`. The [`DelegateFactory`] resolves definitions
//! to delegate instances, and a [`DelegateKit`] routes them into the slots of
//! one layer's pipeline by the roles they play:
//!
//! | Role | Slot | Built-in delegates |
//! |------|------|--------------------|
//! | [`RetrieverFactory`] | single | `HttpRetriever` |
//! | [`TileUrlBuilder`] | optional single | `UrlTemplate` |
//! | [`TileReader`] | ordered list | `ImageReader` |
//! | [`ImageTransformer`] | ordered list | the `*Transformer` types |
//! | [`RenderDelegate`] | ordered list | the `*Render` types |
//! | [`TileRequester`] | single | `UrlRequester`, `LocalRequester` |
//! | [`TileFactory`] | single | `TextureTileFactory`, `FlippedRowTileFactory` |
//!
//! # Example
//!
//! ```
//! use tilekit::delegate::{DelegateContext, DelegateFactory};
//!
//! let factory = DelegateFactory::with_defaults();
//! let ctx = DelegateContext::default();
//!
//! let delegate = factory.create_delegate("colortoalphatransformer( 0, 0, 0 )", &ctx).unwrap();
//! assert_eq!(delegate.to_definition(), "ColorToAlphaTransformer(0,0,0)");
//! ```

mod definition;
mod error;
mod kit;
mod reader;
mod registry;
mod render;
mod requester;
mod retriever;
mod tile_factory;
mod traits;
mod transform;
mod url_builder;

pub use definition::{Definition, DefinitionError};
pub use error::{DecodeError, DelegateError, TileLoadError};
pub use kit::{DelegateKit, DelegateKitBuilder, KitEntry, DEFAULT_DEFINITIONS};
pub use reader::ImageReader;
pub use registry::{
    builtin_types, DelegateContext, DelegateFactory, DelegateType, DEFAULT_CALLER, PARAM_LAYER,
};
pub use render::{ColorMaskRender, DepthTestRender, NearestNeighborRender};
pub use requester::{LocalRequester, UrlRequester};
pub use retriever::HttpRetriever;
pub use tile_factory::{FlippedRowTileFactory, TextureTileFactory};
pub use traits::{
    Capabilities, Delegate, ImageTransformer, RenderDelegate, RequestTask, RetrieverFactory,
    TileFactory, TileLoader, TileReader, TileRequester, TileUrlBuilder,
};
pub use transform::{
    ColorLimitTransformer, ColorToAlphaTransformer, FilterTransformer, PixelFilter,
    ResizeTransformer, StripingFilterTransformer, TransparentColorTransformer, FILTER_NAMESPACES,
};
pub use url_builder::UrlTemplate;
