//! Remote HTML directory listing provider.

use async_trait::async_trait;
use splice_core::config::ListingConfig;
use url::Url;

use super::SegmentListProvider;
use crate::errors::ListingError;
use crate::remote::{SegmentListing, parse_listing};

/// Fetches a generic file server's directory index and scrapes it.
///
/// A page with no playable links still succeeds with the conventional
/// fallback names; check [`SegmentListing::is_fallback`].
#[derive(Debug, Clone)]
pub struct RemoteListingProvider {
    base_url: Url,
    client: reqwest::Client,
}

impl RemoteListingProvider {
    /// Creates a provider for the listing at `base_url`.
    ///
    /// # Errors
    /// - `ListingError::Network` - HTTP client could not be constructed
    pub fn new(base_url: Url, config: &ListingConfig) -> Result<Self, ListingError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| ListingError::Network {
                url: base_url.to_string(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self::with_client(base_url, client))
    }

    /// Creates a provider sharing an existing client.
    pub fn with_client(base_url: Url, client: reqwest::Client) -> Self {
        Self { base_url, client }
    }

    /// Listing location.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl SegmentListProvider for RemoteListingProvider {
    async fn segments(&self) -> Result<SegmentListing, ListingError> {
        let response = self
            .client
            .get(self.base_url.clone())
            .send()
            .await
            .map_err(|e| ListingError::Network {
                url: self.base_url.to_string(),
                reason: format!("Request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(ListingError::Network {
                url: self.base_url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let html = response.text().await.map_err(|e| ListingError::Network {
            url: self.base_url.to_string(),
            reason: format!("Failed to read body: {e}"),
        })?;

        Ok(parse_listing(&html, &self.base_url))
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::http::StatusCode;
    use axum::response::Html;
    use axum::routing::get;

    use super::*;
    use crate::remote::ListingOrigin;

    async fn serve(app: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{address}/videos/")).unwrap()
    }

    #[tokio::test]
    async fn test_fetches_and_parses_listing() {
        let app = Router::new().route(
            "/videos/",
            get(|| async {
                Html(r#"<ul><li><a href="s2.mp4">s2</a></li><li><a href="s1.mp4">s1</a></li></ul>"#)
            }),
        );
        let base = serve(app).await;

        let provider = RemoteListingProvider::new(base.clone(), &ListingConfig::default()).unwrap();
        let listing = provider.segments().await.unwrap();

        assert_eq!(listing.origin, ListingOrigin::Parsed);
        assert_eq!(
            listing.segments,
            vec![base.join("s1.mp4").unwrap(), base.join("s2.mp4").unwrap()]
        );
    }

    #[tokio::test]
    async fn test_unparseable_page_uses_fallback() {
        let app = Router::new().route("/videos/", get(|| async { Html("<p>nothing here</p>") }));
        let base = serve(app).await;

        let provider = RemoteListingProvider::new(base, &ListingConfig::default()).unwrap();
        let listing = provider.segments().await.unwrap();

        assert!(listing.is_fallback());
        assert_eq!(listing.segments.len(), 5);
    }

    #[tokio::test]
    async fn test_error_status_is_network_error() {
        let app = Router::new().route(
            "/videos/",
            get(|| async { (StatusCode::FORBIDDEN, "denied") }),
        );
        let base = serve(app).await;

        let provider = RemoteListingProvider::new(base, &ListingConfig::default()).unwrap();
        let result = provider.segments().await;

        assert!(matches!(
            result,
            Err(ListingError::Network { ref reason, .. }) if reason.contains("403")
        ));
    }
}
