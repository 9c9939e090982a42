//! Delegate type registry and definition resolution.
//!
//! The factory holds delegate types in registration order. Resolving a
//! definition string tries each type's parser in turn; the first that
//! accepts it wins. A type may have a replacement registered for it, in
//! which case the replacement's parser gets a chance at the same definition
//! and its instance is used when it accepts.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::definition::Definition;
use super::error::DelegateError;
use super::traits::Delegate;
use super::{reader, render, requester, retriever, tile_factory, transform, url_builder};
use crate::retrieve::{Caller, Fetcher, HttpFetcher, RetrievalProperties};

/// Parameter naming the layer a delegate is built for.
pub const PARAM_LAYER: &str = "layer";

/// Caller name used when no layer parameter is set.
pub const DEFAULT_CALLER: &str = "tilekit";

/// What a delegate parser gets to see besides its definition.
#[derive(Clone)]
pub struct DelegateContext {
    params: BTreeMap<String, String>,
    fetcher: Arc<dyn Fetcher>,
    properties: RetrievalProperties,
}

impl DelegateContext {
    /// Context whose retrievers fetch through `fetcher`.
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            params: BTreeMap::new(),
            fetcher,
            properties: RetrievalProperties::default(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_properties(mut self, properties: RetrievalProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    pub fn properties(&self) -> &RetrievalProperties {
        &self.properties
    }

    /// Retrieval caller derived from the layer parameter.
    pub fn caller(&self) -> Caller {
        Caller::new(self.param(PARAM_LAYER).unwrap_or(DEFAULT_CALLER))
    }
}

impl Default for DelegateContext {
    fn default() -> Self {
        Self::new(Arc::new(HttpFetcher::new()))
    }
}

impl fmt::Debug for DelegateContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateContext")
            .field("params", &self.params)
            .field("properties", &self.properties)
            .finish()
    }
}

type ParseFn = dyn Fn(&Definition, &DelegateContext) -> Option<Arc<dyn Delegate>> + Send + Sync;

/// A registered delegate type: a name plus its parser.
#[derive(Clone)]
pub struct DelegateType {
    name: &'static str,
    parse: Arc<ParseFn>,
}

impl DelegateType {
    pub fn new<F>(name: &'static str, parse: F) -> Self
    where
        F: Fn(&Definition, &DelegateContext) -> Option<Arc<dyn Delegate>> + Send + Sync + 'static,
    {
        Self {
            name,
            parse: Arc::new(parse),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run the parser. `None` means the definition is not for this type.
    pub fn parse(&self, definition: &Definition, ctx: &DelegateContext) -> Option<Arc<dyn Delegate>> {
        (self.parse)(definition, ctx)
    }
}

impl fmt::Debug for DelegateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DelegateType").field(&self.name).finish()
    }
}

/// Every built-in delegate type in resolution order.
pub fn builtin_types() -> Vec<DelegateType> {
    vec![
        retriever::HttpRetriever::delegate_type(),
        url_builder::UrlTemplate::delegate_type(),
        reader::ImageReader::delegate_type(),
        transform::ColorToAlphaTransformer::delegate_type(),
        transform::TransparentColorTransformer::delegate_type(),
        transform::ColorLimitTransformer::delegate_type(),
        transform::ResizeTransformer::delegate_type(),
        transform::StripingFilterTransformer::delegate_type(),
        transform::FilterTransformer::delegate_type(),
        render::NearestNeighborRender::delegate_type(),
        render::ColorMaskRender::delegate_type(),
        render::DepthTestRender::delegate_type(),
        requester::UrlRequester::delegate_type(),
        requester::LocalRequester::delegate_type(),
        tile_factory::TextureTileFactory::delegate_type(),
        tile_factory::FlippedRowTileFactory::delegate_type(),
    ]
}

/// Resolves definition strings to delegate instances.
#[derive(Debug, Clone, Default)]
pub struct DelegateFactory {
    types: Vec<DelegateType>,
    replacements: HashMap<&'static str, DelegateType>,
}

impl DelegateFactory {
    /// An empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory with every built-in type registered.
    pub fn with_defaults() -> Self {
        let mut factory = Self::new();
        for delegate_type in builtin_types() {
            factory.register(delegate_type);
        }
        factory
    }

    /// Process-wide factory, seeded with the built-in types on first use.
    pub fn global() -> &'static RwLock<DelegateFactory> {
        static GLOBAL: OnceLock<RwLock<DelegateFactory>> = OnceLock::new();
        GLOBAL.get_or_init(|| RwLock::new(DelegateFactory::with_defaults()))
    }

    /// Register a type. A name already present keeps its original position
    /// and parser; returns whether the type was added.
    pub fn register(&mut self, delegate_type: DelegateType) -> bool {
        if self.types.iter().any(|t| t.name == delegate_type.name) {
            debug!(name = delegate_type.name, "Delegate type already registered");
            return false;
        }
        self.types.push(delegate_type);
        true
    }

    /// Substitute `replacement` wherever a definition resolves to `original`.
    pub fn register_replacement(&mut self, original: &'static str, replacement: DelegateType) {
        self.replacements.insert(original, replacement);
    }

    /// Registered type names in resolution order.
    pub fn registered_types(&self) -> Vec<&'static str> {
        self.types.iter().map(|t| t.name).collect()
    }

    /// Resolve a definition string.
    pub fn create_delegate(
        &self,
        definition: &str,
        ctx: &DelegateContext,
    ) -> Result<Arc<dyn Delegate>, DelegateError> {
        let parsed = Definition::parse(definition)?;
        self.create_from(&parsed, ctx)
            .ok_or_else(|| DelegateError::Unrecognized {
                definition: definition.trim().to_string(),
            })
    }

    /// Resolve an already parsed definition.
    pub fn create_from(&self, definition: &Definition, ctx: &DelegateContext) -> Option<Arc<dyn Delegate>> {
        let (delegate_type, delegate) = self
            .types
            .iter()
            .find_map(|t| t.parse(definition, ctx).map(|d| (t, d)))?;

        if let Some(replacement) = self.replacements.get(delegate_type.name) {
            match replacement.parse(definition, ctx) {
                Some(replaced) => {
                    debug!(
                        original = delegate_type.name,
                        replacement = replacement.name,
                        "Delegate replaced"
                    );
                    return Some(replaced);
                }
                None => warn!(
                    original = delegate_type.name,
                    replacement = replacement.name,
                    definition = %definition,
                    "Replacement rejected definition, keeping original"
                ),
            }
        }

        Some(delegate)
    }
}
