//! Per-layer delegate assembly.
//!
//! A [`DelegateKit`] holds the delegates of one layer, routed into typed
//! slots by the roles they report, and implements the whole pipeline
//! contract by forwarding to them. Kits start from a compiled-in default
//! set; configured delegates replace defaults slot by slot.
//!
//! # Example
//!
//! ```
//! use tilekit::delegate::{DelegateContext, DelegateFactory, DelegateKit};
//!
//! let factory = DelegateFactory::with_defaults();
//! let kit = DelegateKit::from_definitions(
//!     ["ResizeTransformer(256,256)"],
//!     &factory,
//!     &DelegateContext::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(kit.to_definitions(), ["ResizeTransformer(256,256)"]);
//! assert_eq!(kit.definitions().len(), 5);
//! ```

use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use tracing::debug;
use url::Url;

use super::error::{DecodeError, DelegateError, TileLoadError};
use super::registry::{DelegateContext, DelegateFactory};
use super::traits::{
    Delegate, ImageTransformer, RenderDelegate, RequestTask, RetrieverFactory, TileFactory,
    TileLoader, TileReader, TileRequester, TileUrlBuilder,
};
use crate::render::DrawContext;
use crate::retrieve::{RetrievalPostProcessor, Retriever};
use crate::tile::{Level, Sector, Tile, TileKey};

/// Delegates every kit starts from, in installation order.
pub const DEFAULT_DEFINITIONS: [&str; 4] = [
    "HttpRetriever()",
    "UrlRequester()",
    "TextureTileFactory()",
    "ImageReader()",
];

/// A role reference plus the delegate that provides it.
struct Slot<T: ?Sized> {
    delegate: Arc<dyn Delegate>,
    role: Arc<T>,
    is_default: bool,
}

impl<T: ?Sized> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            delegate: Arc::clone(&self.delegate),
            role: Arc::clone(&self.role),
            is_default: self.is_default,
        }
    }
}

impl<T: ?Sized> Slot<T> {
    fn new(delegate: &Arc<dyn Delegate>, role: Arc<T>, is_default: bool) -> Self {
        Self {
            delegate: Arc::clone(delegate),
            role,
            is_default,
        }
    }

    fn holds(&self, delegate: &Arc<dyn Delegate>) -> bool {
        same_delegate(&self.delegate, delegate)
    }
}

fn same_delegate(a: &Arc<dyn Delegate>, b: &Arc<dyn Delegate>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Keep configured entries, drop defaults, once a list slot is customized.
fn push_list<T: ?Sized>(list: &mut Vec<Slot<T>>, slot: Slot<T>) {
    if !slot.is_default {
        list.retain(|s| !s.is_default);
    }
    list.push(slot);
}

/// One installed delegate.
#[derive(Clone)]
pub struct KitEntry {
    delegate: Arc<dyn Delegate>,
    is_default: bool,
}

impl KitEntry {
    pub fn delegate(&self) -> &Arc<dyn Delegate> {
        &self.delegate
    }

    pub fn definition(&self) -> String {
        self.delegate.to_definition()
    }

    /// Whether the entry came from the default set.
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn roles(&self) -> Vec<&'static str> {
        Arc::clone(&self.delegate).capabilities().roles()
    }
}

impl fmt::Debug for KitEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KitEntry")
            .field("definition", &self.definition())
            .field("is_default", &self.is_default)
            .finish()
    }
}

/// Programmatic kit assembly. Starts empty; [`build`](Self::build) checks
/// that the mandatory slots are filled.
#[derive(Default)]
pub struct DelegateKitBuilder {
    entries: Vec<KitEntry>,
    retriever_factory: Option<Slot<dyn RetrieverFactory>>,
    url_builder: Option<Slot<dyn TileUrlBuilder>>,
    tile_requester: Option<Slot<dyn TileRequester>>,
    tile_factory: Option<Slot<dyn TileFactory>>,
    readers: Vec<Slot<dyn TileReader>>,
    transformers: Vec<Slot<dyn ImageTransformer>>,
    renderers: Vec<Slot<dyn RenderDelegate>>,
}

impl DelegateKitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a configured delegate into every slot it fits.
    pub fn install(&mut self, delegate: Arc<dyn Delegate>) -> Result<&mut Self, DelegateError> {
        self.route(delegate, false)
    }

    /// Route a default delegate. Defaults give way to configured delegates.
    pub fn install_default(&mut self, delegate: Arc<dyn Delegate>) -> Result<&mut Self, DelegateError> {
        self.route(delegate, true)
    }

    fn route(&mut self, delegate: Arc<dyn Delegate>, is_default: bool) -> Result<&mut Self, DelegateError> {
        let caps = Arc::clone(&delegate).capabilities();
        if caps.is_empty() {
            return Err(DelegateError::Unroutable {
                definition: delegate.to_definition(),
            });
        }

        debug!(
            definition = %delegate.to_definition(),
            roles = ?caps.roles(),
            is_default,
            "Installing delegate"
        );

        if let Some(role) = caps.retriever_factory {
            self.retriever_factory = Some(Slot::new(&delegate, role, is_default));
        }
        if let Some(role) = caps.url_builder {
            self.url_builder = Some(Slot::new(&delegate, role, is_default));
        }
        if let Some(role) = caps.tile_requester {
            self.tile_requester = Some(Slot::new(&delegate, role, is_default));
        }
        if let Some(role) = caps.tile_factory {
            self.tile_factory = Some(Slot::new(&delegate, role, is_default));
        }
        if let Some(role) = caps.tile_reader {
            push_list(&mut self.readers, Slot::new(&delegate, role, is_default));
        }
        if let Some(role) = caps.image_transformer {
            push_list(&mut self.transformers, Slot::new(&delegate, role, is_default));
        }
        if let Some(role) = caps.render {
            push_list(&mut self.renderers, Slot::new(&delegate, role, is_default));
        }

        self.entries.push(KitEntry { delegate, is_default });
        Ok(self)
    }

    fn references(&self, delegate: &Arc<dyn Delegate>) -> bool {
        self.retriever_factory.iter().any(|s| s.holds(delegate))
            || self.url_builder.iter().any(|s| s.holds(delegate))
            || self.tile_requester.iter().any(|s| s.holds(delegate))
            || self.tile_factory.iter().any(|s| s.holds(delegate))
            || self.readers.iter().any(|s| s.holds(delegate))
            || self.transformers.iter().any(|s| s.holds(delegate))
            || self.renderers.iter().any(|s| s.holds(delegate))
    }

    /// Validate and freeze the kit. Entries no slot refers to any more are
    /// dropped.
    pub fn build(&self) -> Result<DelegateKit, DelegateError> {
        let retriever_factory = self
            .retriever_factory
            .clone()
            .ok_or(DelegateError::IncompleteKit {
                missing: "retriever factory",
            })?;
        let tile_requester = self
            .tile_requester
            .clone()
            .ok_or(DelegateError::IncompleteKit {
                missing: "tile requester",
            })?;
        let tile_factory = self
            .tile_factory
            .clone()
            .ok_or(DelegateError::IncompleteKit {
                missing: "tile factory",
            })?;

        let entries = self
            .entries
            .iter()
            .filter(|e| self.references(&e.delegate))
            .cloned()
            .collect();

        Ok(DelegateKit {
            entries,
            retriever_factory,
            url_builder: self.url_builder.clone(),
            tile_requester,
            tile_factory,
            readers: self.readers.clone(),
            transformers: self.transformers.clone(),
            renderers: self.renderers.clone(),
        })
    }
}

/// The assembled pipeline of one layer.
pub struct DelegateKit {
    entries: Vec<KitEntry>,
    retriever_factory: Slot<dyn RetrieverFactory>,
    url_builder: Option<Slot<dyn TileUrlBuilder>>,
    tile_requester: Slot<dyn TileRequester>,
    tile_factory: Slot<dyn TileFactory>,
    readers: Vec<Slot<dyn TileReader>>,
    transformers: Vec<Slot<dyn ImageTransformer>>,
    renderers: Vec<Slot<dyn RenderDelegate>>,
}

impl DelegateKit {
    /// Build a kit from the default set plus `definitions`, in document order.
    pub fn from_definitions<I, S>(
        definitions: I,
        factory: &DelegateFactory,
        ctx: &DelegateContext,
    ) -> Result<Self, DelegateError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = DelegateKitBuilder::new();
        for definition in DEFAULT_DEFINITIONS {
            builder.install_default(factory.create_delegate(definition, ctx)?)?;
        }
        for definition in definitions {
            builder.install(factory.create_delegate(definition.as_ref(), ctx)?)?;
        }
        builder.build()
    }

    /// The compiled-in default definitions.
    pub fn default_definitions() -> &'static [&'static str] {
        &DEFAULT_DEFINITIONS
    }

    pub fn entries(&self) -> &[KitEntry] {
        &self.entries
    }

    /// Every effective definition, defaults included.
    pub fn definitions(&self) -> Vec<String> {
        self.entries.iter().map(KitEntry::definition).collect()
    }

    /// Definitions worth persisting: configured entries that differ from the
    /// default set.
    pub fn to_definitions(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| !e.is_default)
            .map(KitEntry::definition)
            .filter(|d| !DEFAULT_DEFINITIONS.iter().any(|x| x.eq_ignore_ascii_case(d)))
            .collect()
    }

    pub fn has_url_builder(&self) -> bool {
        self.url_builder.is_some()
    }

    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    pub fn transformer_count(&self) -> usize {
        self.transformers.len()
    }

    pub fn render_count(&self) -> usize {
        self.renderers.len()
    }

    /// Remote locator of a tile; the tile's own locator without a URL builder.
    pub fn build_remote_url(&self, tile: &Tile, format: &str) -> Result<Url, url::ParseError> {
        match &self.url_builder {
            Some(slot) => slot.role.build_url(tile, format),
            None => tile.resource_url(format),
        }
    }

    pub fn create_retriever(
        &self,
        url: &Url,
        post_processor: Arc<dyn RetrievalPostProcessor>,
    ) -> Box<dyn Retriever> {
        self.retriever_factory.role.create_retriever(url, post_processor)
    }

    /// Try each reader in order. `None` moves on; an error stops the chain.
    pub fn read_image(&self, tile: &Tile, url: &Url) -> Result<Option<RgbaImage>, DecodeError> {
        for slot in &self.readers {
            if let Some(image) = slot.role.read_image(tile, url)? {
                return Ok(Some(image));
            }
        }
        Ok(None)
    }

    /// Fold every transformer over the raster, in installation order.
    pub fn transform_image(&self, image: RgbaImage, tile: Option<&Tile>) -> RgbaImage {
        self.transformers
            .iter()
            .fold(image, |image, slot| slot.role.transform(&image, tile))
    }

    pub fn pre_render(&self, dc: &mut dyn DrawContext) {
        for slot in &self.renderers {
            slot.role.pre_render(dc);
        }
    }

    pub fn post_render(&self, dc: &mut dyn DrawContext) {
        for slot in &self.renderers {
            slot.role.post_render(dc);
        }
    }

    /// Create a tile through the tile factory, keyed by its transformed key.
    pub fn create_texture_tile(&self, sector: Sector, level: &Arc<Level>, row: u32, col: u32) -> Tile {
        let tile = self.tile_factory.role.create_texture_tile(sector, level, row, col);
        let key = self.transform_tile_key(&tile.raw_key(), level);
        if tile.key() == &key {
            tile
        } else {
            tile.with_key(key)
        }
    }

    pub fn transform_tile_key(&self, key: &TileKey, level: &Level) -> TileKey {
        self.tile_factory.role.transform_tile_key(key, level)
    }

    pub fn force_texture_load(&self, tile: &Tile, loader: &dyn TileLoader) -> Result<bool, TileLoadError> {
        self.tile_requester.role.force_texture_load(tile, loader)
    }

    pub fn local_tile_url(&self, tile: &Tile, loader: &dyn TileLoader) -> Option<Url> {
        self.tile_requester.role.local_tile_url(tile, loader)
    }

    pub fn create_request_task(&self, tile: Tile, loader: Arc<dyn TileLoader>) -> RequestTask {
        self.tile_requester.role.create_request_task(tile, loader)
    }
}

impl fmt::Debug for DelegateKit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.definitions()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate::traits::Capabilities;
    use crate::render::{GlStateContext, TextureFilter};
    use crate::tile::LevelSet;
    use image::Rgba;
    use parking_lot::Mutex;

    fn kit(definitions: &[&str]) -> Result<DelegateKit, DelegateError> {
        DelegateKit::from_definitions(
            definitions.iter().copied(),
            &DelegateFactory::with_defaults(),
            &DelegateContext::default(),
        )
    }

    fn tile() -> Tile {
        let levels = LevelSet::new("ds", "", "image/png", 2, 36.0, 512);
        let level = levels.level(1).unwrap();
        Tile::new(level.tile_sector(2, 3), Arc::clone(level), 2, 3)
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[test]
    fn test_defaults_only() {
        let kit = kit(&[]).unwrap();
        assert_eq!(kit.definitions(), DEFAULT_DEFINITIONS);
        assert!(kit.to_definitions().is_empty());
        assert!(!kit.has_url_builder());
        assert_eq!(kit.reader_count(), 1);
        assert_eq!(kit.transformer_count(), 0);
    }

    #[test]
    fn test_singleton_replaces_default() {
        let kit = kit(&["FlippedRowTileFactory()", "LocalRequester()"]).unwrap();
        assert_eq!(
            kit.definitions(),
            ["HttpRetriever()", "ImageReader()", "FlippedRowTileFactory()", "LocalRequester()"]
        );
        assert_eq!(kit.to_definitions(), ["FlippedRowTileFactory()", "LocalRequester()"]);
    }

    #[test]
    fn test_list_slot_replaces_defaults_once() {
        let kit = kit(&["ImageReader()", "ImageReader()"]).unwrap();
        assert_eq!(kit.reader_count(), 2);
        // Configured copies of the default are not persisted
        assert!(kit.to_definitions().is_empty());
    }

    #[test]
    fn test_transformers_in_document_order() {
        let kit = kit(&["ResizeTransformer(4,4)", "ColorLimitTransformer(1,2,3)"]).unwrap();
        assert_eq!(
            kit.to_definitions(),
            ["ResizeTransformer(4,4)", "ColorLimitTransformer(1,2,3)"]
        );
        assert_eq!(kit.transformer_count(), 2);
    }

    #[test]
    fn test_unrecognized_definition() {
        let err = kit(&["Bogus(1)"]).unwrap_err();
        assert!(matches!(err, DelegateError::Unrecognized { definition } if definition == "Bogus(1)"));
    }

    #[test]
    fn test_builder_requires_mandatory_slots() {
        let factory = DelegateFactory::with_defaults();
        let ctx = DelegateContext::default();
        let mut builder = DelegateKitBuilder::new();
        builder
            .install(factory.create_delegate("HttpRetriever()", &ctx).unwrap())
            .unwrap();
        assert!(matches!(
            builder.build(),
            Err(DelegateError::IncompleteKit { missing: "tile requester" })
        ));

        builder
            .install(factory.create_delegate("UrlRequester()", &ctx).unwrap())
            .unwrap();
        assert!(matches!(
            builder.build(),
            Err(DelegateError::IncompleteKit { missing: "tile factory" })
        ));

        builder
            .install(factory.create_delegate("TextureTileFactory()", &ctx).unwrap())
            .unwrap();
        let kit = builder.build().unwrap();
        assert_eq!(kit.reader_count(), 0);
    }

    // =========================================================================
    // Routing
    // =========================================================================

    #[derive(Debug)]
    struct Inert;

    impl Delegate for Inert {
        fn to_definition(&self) -> String {
            "Inert()".to_string()
        }

        fn capabilities(self: Arc<Self>) -> Capabilities {
            Capabilities::new()
        }
    }

    #[test]
    fn test_unroutable_delegate() {
        let mut builder = DelegateKitBuilder::new();
        let err = builder.install(Arc::new(Inert)).err().unwrap();
        assert!(matches!(err, DelegateError::Unroutable { definition } if definition == "Inert()"));
    }

    /// Plays both the reader and transformer roles.
    #[derive(Debug)]
    struct ReadAndTint {
        result: Option<u8>,
        fail: bool,
    }

    impl Delegate for ReadAndTint {
        fn to_definition(&self) -> String {
            format!("ReadAndTint({:?},{})", self.result, self.fail)
        }

        fn capabilities(self: Arc<Self>) -> Capabilities {
            Capabilities::new()
                .with_tile_reader(self.clone())
                .with_image_transformer(self)
        }
    }

    impl TileReader for ReadAndTint {
        fn read_image(&self, _tile: &Tile, _url: &Url) -> Result<Option<RgbaImage>, DecodeError> {
            if self.fail {
                return Err(DecodeError::NotAFileUrl("test".to_string()));
            }
            Ok(self.result.map(|v| RgbaImage::from_pixel(1, 1, Rgba([v, v, v, 255]))))
        }
    }

    impl ImageTransformer for ReadAndTint {
        fn transform(&self, image: &RgbaImage, _tile: Option<&Tile>) -> RgbaImage {
            let mut out = image.clone();
            for p in out.pixels_mut() {
                p[0] = p[0].saturating_add(1);
            }
            out
        }
    }

    fn mandatory(builder: &mut DelegateKitBuilder) {
        let factory = DelegateFactory::with_defaults();
        let ctx = DelegateContext::default();
        for def in ["HttpRetriever()", "UrlRequester()", "TextureTileFactory()"] {
            builder.install(factory.create_delegate(def, &ctx).unwrap()).unwrap();
        }
    }

    #[test]
    fn test_multi_role_delegate_routed_everywhere() {
        let mut builder = DelegateKitBuilder::new();
        mandatory(&mut builder);
        builder
            .install(Arc::new(ReadAndTint { result: Some(5), fail: false }))
            .unwrap();
        let kit = builder.build().unwrap();

        assert_eq!(kit.reader_count(), 1);
        assert_eq!(kit.transformer_count(), 1);
        assert_eq!(kit.entries().len(), 4);
        assert_eq!(kit.entries()[3].roles(), ["tile-reader", "image-transformer"]);
    }

    #[test]
    fn test_reader_chain_none_continues() {
        let mut builder = DelegateKitBuilder::new();
        mandatory(&mut builder);
        builder
            .install(Arc::new(ReadAndTint { result: None, fail: false }))
            .unwrap()
            .install(Arc::new(ReadAndTint { result: Some(9), fail: false }))
            .unwrap();
        let kit = builder.build().unwrap();

        let url = Url::parse("file:///tmp/x.png").unwrap();
        let image = kit.read_image(&tile(), &url).unwrap().unwrap();
        assert_eq!(image.get_pixel(0, 0)[0], 9);

        // Both transformers run in order
        let out = kit.transform_image(image, None);
        assert_eq!(out.get_pixel(0, 0)[0], 11);
    }

    #[test]
    fn test_reader_chain_error_aborts() {
        let mut builder = DelegateKitBuilder::new();
        mandatory(&mut builder);
        builder
            .install(Arc::new(ReadAndTint { result: None, fail: true }))
            .unwrap()
            .install(Arc::new(ReadAndTint { result: Some(9), fail: false }))
            .unwrap();
        let kit = builder.build().unwrap();

        let url = Url::parse("file:///tmp/x.png").unwrap();
        assert!(kit.read_image(&tile(), &url).is_err());
    }

    #[test]
    fn test_replaced_entries_pruned() {
        let mut builder = DelegateKitBuilder::new();
        mandatory(&mut builder);
        let factory = DelegateFactory::with_defaults();
        let ctx = DelegateContext::default();
        builder
            .install(factory.create_delegate("FlippedRowTileFactory()", &ctx).unwrap())
            .unwrap();
        let kit = builder.build().unwrap();
        assert_eq!(
            kit.definitions(),
            ["HttpRetriever()", "UrlRequester()", "FlippedRowTileFactory()"]
        );
    }

    /// Keys every tile to row 0 but hands out raw-keyed tiles.
    #[derive(Debug)]
    struct RowZeroFactory;

    impl Delegate for RowZeroFactory {
        fn to_definition(&self) -> String {
            "RowZeroFactory()".to_string()
        }

        fn capabilities(self: Arc<Self>) -> Capabilities {
            Capabilities::new().with_tile_factory(self)
        }
    }

    impl TileFactory for RowZeroFactory {
        fn create_texture_tile(&self, sector: Sector, level: &Arc<Level>, row: u32, col: u32) -> Tile {
            Tile::new(sector, Arc::clone(level), row, col)
        }

        fn transform_tile_key(&self, key: &TileKey, _level: &Level) -> TileKey {
            key.with_row(0)
        }
    }

    // =========================================================================
    // Forwarding
    // =========================================================================

    #[test]
    fn test_created_tiles_carry_transformed_key() {
        let mut builder = DelegateKitBuilder::new();
        let factory = DelegateFactory::with_defaults();
        let ctx = DelegateContext::default();
        for def in ["HttpRetriever()", "UrlRequester()"] {
            builder.install(factory.create_delegate(def, &ctx).unwrap()).unwrap();
        }
        builder.install(Arc::new(RowZeroFactory)).unwrap();
        let kit = builder.build().unwrap();

        let levels = LevelSet::new("ds", "", "image/png", 2, 36.0, 512);
        let level = levels.level(1).unwrap();
        let tile = kit.create_texture_tile(level.tile_sector(6, 3), level, 6, 3);
        assert_eq!(tile.row(), 6);
        assert_eq!(tile.key(), &TileKey::new("ds", 1, 0, 3));
        assert_eq!(kit.transform_tile_key(&tile.raw_key(), level), *tile.key());
    }

    #[test]
    fn test_remote_url_falls_back_to_tile_locator() {
        let levels = LevelSet::new("ds", "https://h.example/{z}/{y}/{x}.png", "image/png", 2, 36.0, 512);
        let level = levels.level(1).unwrap();
        let tile = Tile::new(level.tile_sector(2, 3), Arc::clone(level), 2, 3);

        let plain = kit(&[]).unwrap();
        assert_eq!(
            plain.build_remote_url(&tile, "image/png").unwrap(),
            tile.resource_url("image/png").unwrap()
        );

        let templated = kit(&["UrlTemplate(https://other.example/{z}/{x}/{y}.{ext})"]).unwrap();
        assert_eq!(
            templated.build_remote_url(&tile, "image/png").unwrap().as_str(),
            "https://other.example/1/3/2.png"
        );
    }

    #[test]
    fn test_render_hooks_in_list_order() {
        #[derive(Debug)]
        struct Recorder(&'static str, Arc<Mutex<Vec<String>>>);

        impl Delegate for Recorder {
            fn to_definition(&self) -> String {
                format!("Recorder({})", self.0)
            }

            fn capabilities(self: Arc<Self>) -> Capabilities {
                Capabilities::new().with_render(self)
            }
        }

        impl RenderDelegate for Recorder {
            fn pre_render(&self, _dc: &mut dyn DrawContext) {
                self.1.lock().push(format!("pre-{}", self.0));
            }

            fn post_render(&self, _dc: &mut dyn DrawContext) {
                self.1.lock().push(format!("post-{}", self.0));
            }
        }

        let log = Arc::new(Mutex::new(Vec::new()));
        let mut builder = DelegateKitBuilder::new();
        mandatory(&mut builder);
        builder
            .install(Arc::new(Recorder("a", Arc::clone(&log))))
            .unwrap()
            .install(Arc::new(Recorder("b", Arc::clone(&log))))
            .unwrap();
        let kit = builder.build().unwrap();

        let mut dc = GlStateContext::new();
        kit.pre_render(&mut dc);
        kit.post_render(&mut dc);
        assert_eq!(*log.lock(), ["pre-a", "pre-b", "post-a", "post-b"]);
    }

    #[test]
    fn test_render_delegates_restore_state() {
        let kit = kit(&["NearestNeighborRender()", "DepthTestRender(0)"]).unwrap();
        let mut dc = GlStateContext::new();

        kit.pre_render(&mut dc);
        assert_eq!(dc.state().texture_filter, TextureFilter::Nearest);
        assert!(!dc.state().depth_test);

        kit.post_render(&mut dc);
        assert_eq!(dc.depth(), 0);
        assert_eq!(dc.state().texture_filter, TextureFilter::Linear);
        assert!(dc.state().depth_test);
    }
}
