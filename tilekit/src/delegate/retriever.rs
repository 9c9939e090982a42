//! `HttpRetriever()` / `HttpRetriever(entry)`: the default retriever factory.

use std::fmt;
use std::sync::Arc;

use url::Url;

use super::definition::Definition;
use super::registry::{DelegateContext, DelegateType};
use super::traits::{Capabilities, Delegate, RetrieverFactory};
use crate::retrieve::{
    Caller, FetchRequest, Fetcher, RetrievalPostProcessor, RetrievalProperties, Retriever,
    UrlRetriever,
};

/// Builds [`UrlRetriever`]s bound to the context's fetcher.
///
/// The optional argument names an archive entry to return in place of a ZIP
/// payload.
#[derive(Clone)]
pub struct HttpRetriever {
    entry: Option<String>,
    fetcher: Arc<dyn Fetcher>,
    caller: Caller,
    properties: RetrievalProperties,
}

impl HttpRetriever {
    pub const NAME: &'static str = "HttpRetriever";

    pub fn new(ctx: &DelegateContext, entry: Option<String>) -> Self {
        Self {
            entry,
            fetcher: Arc::clone(ctx.fetcher()),
            caller: ctx.caller(),
            properties: ctx.properties().clone(),
        }
    }

    pub fn from_definition(def: &Definition, ctx: &DelegateContext) -> Option<Self> {
        if !def.is(Self::NAME) {
            return None;
        }
        match def.args() {
            [] => Some(Self::new(ctx, None)),
            [entry] => Some(Self::new(ctx, Some(entry.clone()))),
            _ => None,
        }
    }

    pub fn delegate_type() -> DelegateType {
        DelegateType::new(Self::NAME, |def, ctx| {
            Self::from_definition(def, ctx).map(|d| Arc::new(d) as Arc<dyn Delegate>)
        })
    }

    pub fn entry(&self) -> Option<&str> {
        self.entry.as_deref()
    }
}

impl fmt::Debug for HttpRetriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRetriever")
            .field("entry", &self.entry)
            .field("caller", &self.caller)
            .finish()
    }
}

impl Delegate for HttpRetriever {
    fn to_definition(&self) -> String {
        Definition::new(Self::NAME, self.entry.iter().cloned()).to_string()
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().with_retriever_factory(self)
    }
}

impl RetrieverFactory for HttpRetriever {
    fn create_retriever(
        &self,
        url: &Url,
        post_processor: Arc<dyn RetrievalPostProcessor>,
    ) -> Box<dyn Retriever> {
        let mut request =
            FetchRequest::new(url.clone(), self.caller.clone()).with_properties(self.properties.clone());
        if let Some(entry) = &self.entry {
            request = request.with_extract_entry(entry.clone());
        }
        Box::new(UrlRetriever::new(
            Arc::clone(&self.fetcher),
            request,
            post_processor,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate::registry::PARAM_LAYER;
    use crate::retrieve::{FetchResponse, PassThrough, RetrievalError};
    use bytes::Bytes;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct CapturingFetcher {
        requests: Mutex<Vec<FetchRequest>>,
    }

    impl Fetcher for CapturingFetcher {
        fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, RetrievalError> {
            self.requests.lock().push(request.clone());
            Ok(FetchResponse::ok(Bytes::from_static(b"x"), Some("image/png".into())))
        }
    }

    #[test]
    fn test_definitions() {
        let ctx = DelegateContext::default();
        let plain = HttpRetriever::from_definition(&Definition::parse("HttpRetriever").unwrap(), &ctx).unwrap();
        assert_eq!(plain.to_definition(), "HttpRetriever()");

        let zipped =
            HttpRetriever::from_definition(&Definition::parse("httpretriever(tile.png)").unwrap(), &ctx).unwrap();
        assert_eq!(zipped.entry(), Some("tile.png"));
        assert_eq!(zipped.to_definition(), "HttpRetriever(tile.png)");

        assert!(HttpRetriever::from_definition(&Definition::parse("HttpRetriever(a,b)").unwrap(), &ctx).is_none());
    }

    #[test]
    fn test_retriever_carries_context() {
        let fetcher = Arc::new(CapturingFetcher::default());
        let ctx = DelegateContext::new(fetcher.clone()).with_param(PARAM_LAYER, "bmng");
        let factory =
            HttpRetriever::from_definition(&Definition::parse("HttpRetriever(t.png)").unwrap(), &ctx).unwrap();

        let url = Url::parse("http://tiles.test/0/0/0.zip").unwrap();
        let mut retriever = factory.create_retriever(&url, Arc::new(PassThrough));
        assert!(retriever.retrieve().unwrap().is_some());

        let requests = fetcher.requests.lock();
        assert_eq!(requests[0].caller.as_str(), "bmng");
        assert_eq!(requests[0].extract_entry.as_deref(), Some("t.png"));
        assert_eq!(requests[0].url, url);
    }
}
