//! The resource protocol handler.

use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::address::TileAddressParser;
use super::descriptor::TileSourceDescriptor;
use super::error::ProtocolError;
use crate::backend::TileProvider;
use crate::region::AggregateDescriptor;
use crate::state::StateStore;

/// Which kind of resource the renderer is asking for.
///
/// The kind is set by the renderer alongside the URL; it is not derived from
/// the URL's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Tile-source metadata.
    Descriptor,
    /// One tile's bytes.
    Tile,
}

/// A resource fetch issued by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub url: String,
    pub kind: RequestKind,
}

impl ResourceRequest {
    pub fn descriptor(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: RequestKind::Descriptor,
        }
    }

    pub fn tile(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: RequestKind::Tile,
        }
    }
}

/// Handler output.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceResponse {
    Descriptor(TileSourceDescriptor),
    /// Tile bytes. Empty means the tile is absent, not that it failed.
    Tile(Bytes),
}

/// Bridges renderer resource requests to the tile provider.
///
/// Before any provider call the handler checks, in order:
/// 1. the request's cancellation token,
/// 2. that the session is initialized.
///
/// Both checks apply to descriptor and tile requests alike. The handler
/// reads the [`StateStore`] but never writes it; a failed request stays
/// local to that request.
pub struct ResourceProtocolHandler {
    parser: TileAddressParser,
    provider: Arc<dyn TileProvider>,
    store: Arc<StateStore>,
    aggregate: AggregateDescriptor,
}

impl ResourceProtocolHandler {
    /// Create a handler for `scheme`.
    ///
    /// # Arguments
    ///
    /// * `scheme` - URL scheme this handler answers for
    /// * `provider` - Where tile bytes come from
    /// * `store` - Consulted for the session-initialized flag
    /// * `aggregate` - Session extent reported by descriptor requests
    pub fn new(
        scheme: &str,
        provider: Arc<dyn TileProvider>,
        store: Arc<StateStore>,
        aggregate: AggregateDescriptor,
    ) -> Self {
        Self {
            parser: TileAddressParser::new(scheme),
            provider,
            store,
            aggregate,
        }
    }

    pub fn scheme(&self) -> &str {
        self.parser.scheme()
    }

    /// Serve one request.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Cancelled`] if `cancel` is already set
    /// - [`ProtocolError::NotInitialized`] if the session is not open
    /// - [`ProtocolError::AddressParse`] for a malformed tile URL
    /// - [`ProtocolError::Provider`] if the provider call fails
    pub async fn handle(
        &self,
        request: &ResourceRequest,
        cancel: &CancellationToken,
    ) -> Result<ResourceResponse, ProtocolError> {
        if cancel.is_cancelled() {
            debug!(url = %request.url, "Request cancelled before dispatch");
            return Err(ProtocolError::Cancelled);
        }

        if !self.store.is_session_initialized() {
            debug!(url = %request.url, "Request before session initialized");
            return Err(ProtocolError::NotInitialized);
        }

        match request.kind {
            RequestKind::Descriptor => Ok(ResourceResponse::Descriptor(
                TileSourceDescriptor::new(&request.url, &self.aggregate),
            )),
            RequestKind::Tile => {
                let tile = self.parser.parse(&request.url)?;
                let bytes = self.provider.fetch_tile(tile).await?;

                match bytes {
                    Some(data) => {
                        debug!(%tile, size = data.len(), "Served tile");
                        Ok(ResourceResponse::Tile(data))
                    }
                    None => {
                        debug!(%tile, "Tile absent, serving empty body");
                        Ok(ResourceResponse::Tile(Bytes::new()))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, BoxFuture, SessionInfo};
    use crate::coord::TileCoord;
    use crate::region::{BoundingBox, CenterPoint};
    use parking_lot::Mutex;

    /// Provider returning a fixed result and recording every call.
    struct MockProvider {
        response: Result<Option<Bytes>, BackendError>,
        calls: Mutex<Vec<TileCoord>>,
    }

    impl MockProvider {
        fn new(response: Result<Option<Bytes>, BackendError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    impl TileProvider for MockProvider {
        fn init_session(&self) -> BoxFuture<'_, Result<SessionInfo, BackendError>> {
            Box::pin(async { Ok(SessionInfo { regions: vec![] }) })
        }

        fn fetch_tile(
            &self,
            tile: TileCoord,
        ) -> BoxFuture<'_, Result<Option<Bytes>, BackendError>> {
            self.calls.lock().push(tile);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    fn aggregate() -> AggregateDescriptor {
        AggregateDescriptor {
            bounds: BoundingBox::new(-76.5, 45.0, -75.0, 45.7),
            center: CenterPoint::new(-75.75, 45.35),
            min_zoom: 0,
            max_zoom: 14,
        }
    }

    fn handler(provider: Arc<MockProvider>, initialized: bool) -> ResourceProtocolHandler {
        let store = Arc::new(StateStore::new());
        if initialized {
            store.open_session(Vec::new());
        }
        ResourceProtocolHandler::new("pmtiles", provider, store, aggregate())
    }

    #[tokio::test]
    async fn test_tile_served_verbatim() {
        let provider = MockProvider::new(Ok(Some(Bytes::from_static(&[1, 2, 3]))));
        let handler = handler(Arc::clone(&provider), true);

        let response = handler
            .handle(
                &ResourceRequest::tile("pmtiles://regions/10/296/366"),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(response, ResourceResponse::Tile(Bytes::from_static(&[1, 2, 3])));
        assert_eq!(*provider.calls.lock(), vec![TileCoord::new(10, 296, 366)]);
    }

    #[tokio::test]
    async fn test_absent_tile_is_empty() {
        let provider = MockProvider::new(Ok(None));
        let handler = handler(Arc::clone(&provider), true);

        let response = handler
            .handle(
                &ResourceRequest::tile("pmtiles://regions/1/0/0"),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(response, ResourceResponse::Tile(Bytes::new()));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let provider = MockProvider::new(Err(BackendError::new("corrupt directory")));
        let handler = handler(Arc::clone(&provider), true);

        let result = handler
            .handle(
                &ResourceRequest::tile("pmtiles://regions/1/0/0"),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(
            result,
            Err(ProtocolError::Provider(BackendError::new("corrupt directory")))
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_dispatch() {
        let provider = MockProvider::new(Ok(Some(Bytes::from_static(&[1]))));
        let handler = handler(Arc::clone(&provider), true);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = handler
            .handle(&ResourceRequest::tile("pmtiles://regions/1/0/0"), &cancel)
            .await;

        assert_eq!(result, Err(ProtocolError::Cancelled));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_checked_before_initialization() {
        let provider = MockProvider::new(Ok(None));
        let handler = handler(Arc::clone(&provider), false);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = handler
            .handle(&ResourceRequest::descriptor("pmtiles://regions"), &cancel)
            .await;

        assert_eq!(result, Err(ProtocolError::Cancelled));
    }

    #[tokio::test]
    async fn test_not_initialized_for_both_kinds() {
        let provider = MockProvider::new(Ok(None));
        let handler = handler(Arc::clone(&provider), false);
        let cancel = CancellationToken::new();

        for request in [
            ResourceRequest::tile("pmtiles://regions/1/0/0"),
            ResourceRequest::descriptor("pmtiles://regions"),
        ] {
            let result = handler.handle(&request, &cancel).await;
            assert_eq!(result, Err(ProtocolError::NotInitialized));
        }
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_address_never_reaches_provider() {
        let provider = MockProvider::new(Ok(None));
        let handler = handler(Arc::clone(&provider), true);
        let cancel = CancellationToken::new();

        for url in [
            "pmtiles://regions/1/0",
            "pmtiles://regions/1/x/0",
            "http://regions/1/0/0",
        ] {
            let result = handler.handle(&ResourceRequest::tile(url), &cancel).await;
            assert!(matches!(result, Err(ProtocolError::AddressParse(_))));
        }
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_descriptor_uses_aggregate() {
        let provider = MockProvider::new(Ok(None));
        let handler = handler(Arc::clone(&provider), true);

        let response = handler
            .handle(
                &ResourceRequest::descriptor("pmtiles://regions"),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let ResourceResponse::Descriptor(descriptor) = response else {
            panic!("expected descriptor response");
        };
        assert_eq!(descriptor.tiles, vec!["pmtiles://regions/{z}/{x}/{y}"]);
        assert_eq!(descriptor.minzoom, 0);
        assert_eq!(descriptor.maxzoom, 14);
        assert_eq!(descriptor.bounds, [-76.5, 45.0, -75.0, 45.7]);
        assert_eq!(provider.call_count(), 0);
    }
}
