//! reqwest-backed catalog range query client

use async_trait::async_trait;
use reqwest::Url;

use range_harvest_core::{PriceRange, QueryError, RangePage, RangeQueryClient};

use crate::config::{ConfigValidationError, HttpConfig};
use crate::pool::HttpClientPool;

/// Query parameter carrying the lower price bound
pub const MIN_PRICE_PARAM: &str = "minPrice";

/// Query parameter carrying the upper price bound
pub const MAX_PRICE_PARAM: &str = "maxPrice";

/// Errors raised while constructing a [`CatalogClient`]
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Endpoint is not an absolute http(s) URL
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// Endpoint as given
        endpoint: String,
        /// What was wrong with it
        reason: String,
    },

    /// HTTP configuration failed validation
    #[error("invalid HTTP config: {0}")]
    Config(#[from] ConfigValidationError),

    /// reqwest could not build the client
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Catalog client issuing `GET <endpoint>?minPrice=<low>&maxPrice=<high>`
///
/// The response body is JSON with `total`, `count` and `products` fields.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    endpoint: Url,
    pool: HttpClientPool,
}

impl CatalogClient {
    /// Create a client for `endpoint`
    pub fn new(endpoint: &str, config: &HttpConfig) -> Result<Self, ClientError> {
        let endpoint = parse_endpoint(endpoint)?;
        config.validate()?;
        let pool = HttpClientPool::new(config)?;

        tracing::debug!(
            endpoint = %endpoint,
            request_timeout_ms = config.request_timeout.as_millis() as u64,
            "Catalog client ready"
        );

        Ok(Self { endpoint, pool })
    }

    /// The configured endpoint
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// URL queried for `range`
    ///
    /// Bounds use the shortest decimal that round-trips, so `50000.0` is sent
    /// as `50000`. Existing query parameters on the endpoint are kept.
    pub fn query_url(&self, range: &PriceRange) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair(MIN_PRICE_PARAM, &range.low().to_string())
            .append_pair(MAX_PRICE_PARAM, &range.high().to_string());
        url
    }

    /// Timeouts surface as `Timeout` whether they hit the headers or the body
    fn transport_error(&self, error: reqwest::Error) -> QueryError {
        if error.is_timeout() {
            QueryError::Timeout(self.pool.config().request_timeout)
        } else {
            QueryError::Http(error)
        }
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}

/// Decode a catalog response body
pub fn parse_page(body: &[u8]) -> Result<RangePage, QueryError> {
    let page: RangePage = serde_json::from_slice(body)?;
    Ok(page)
}

#[async_trait]
impl RangeQueryClient for CatalogClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn query(&self, range: &PriceRange) -> Result<RangePage, QueryError> {
        let url = self.query_url(range);

        let response = self
            .pool
            .client()
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(QueryError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        let page = parse_page(&body)?;

        tracing::trace!(
            range = %range,
            count = page.count,
            returned = page.products.len(),
            "Catalog page received"
        );

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn range(low: f64, high: f64) -> PriceRange {
        PriceRange::new(low, high).unwrap()
    }

    fn client(endpoint: &str) -> CatalogClient {
        let config = HttpConfig::default().with_request_timeout(Duration::from_secs(2));
        CatalogClient::new(endpoint, &config).unwrap()
    }

    /// Serve one canned HTTP response and hand back the request line
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            request.lines().next().unwrap_or_default().to_string()
        });

        (format!("http://{}/products", addr), handle)
    }

    #[test]
    fn test_query_url_formats_bounds() {
        let client = client("http://catalog.local/products");
        let url = client.query_url(&range(0.0, 50_000.0));
        assert_eq!(
            url.as_str(),
            "http://catalog.local/products?minPrice=0&maxPrice=50000"
        );

        let url = client.query_url(&range(12.5, 12.75));
        assert_eq!(url.query(), Some("minPrice=12.5&maxPrice=12.75"));
    }

    #[test]
    fn test_query_url_keeps_existing_params() {
        let client = client("https://catalog.local/api?store=7");
        let url = client.query_url(&range(1.0, 2.0));
        assert_eq!(url.query(), Some("store=7&minPrice=1&maxPrice=2"));
    }

    #[test]
    fn test_rejects_bad_endpoints() {
        let config = HttpConfig::default();
        assert!(matches!(
            CatalogClient::new("not a url", &config),
            Err(ClientError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            CatalogClient::new("ftp://catalog.local/products", &config),
            Err(ClientError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_rejects_invalid_http_config() {
        let config = HttpConfig::default().with_request_timeout(Duration::ZERO);
        assert!(matches!(
            CatalogClient::new("http://catalog.local/products", &config),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_parse_page() {
        let body = br#"{
            "total": 3500,
            "count": 2,
            "products": [
                {"id": 1, "name": "Lamp", "price": 19.99},
                {"id": 2, "name": "Desk", "price": 149.0}
            ]
        }"#;

        let page = parse_page(body).unwrap();
        assert_eq!(page.total, 3500);
        assert_eq!(page.count, 2);
        assert_eq!(page.products[1].name, "Desk");
    }

    #[test]
    fn test_parse_page_missing_products() {
        let page = parse_page(br#"{"total": 10, "count": 0}"#).unwrap();
        assert!(page.products.is_empty());
    }

    #[test]
    fn test_parse_page_invalid_json() {
        let err = parse_page(b"<html>busy</html>").unwrap_err();
        assert!(matches!(err, QueryError::Decode(_)));
    }

    #[tokio::test]
    async fn test_query_success() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"total":2,"count":1,"products":[{"id":5,"name":"Chair","price":75.5}]}"#,
        )
        .await;

        let page = client(&endpoint).query(&range(50.0, 100.0)).await.unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.products[0].id, 5);

        let request_line = server.await.unwrap();
        assert!(request_line.starts_with("GET /products?minPrice=50&maxPrice=100 "));
    }

    #[tokio::test]
    async fn test_query_maps_error_status() {
        let (endpoint, server) = serve_once("503 Service Unavailable", "overloaded").await;

        let err = client(&endpoint)
            .query(&range(0.0, 1.0))
            .await
            .unwrap_err();
        match err {
            QueryError::Status { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "overloaded");
            }
            other => panic!("expected status error, got {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_query_maps_bad_body() {
        let (endpoint, server) = serve_once("200 OK", "not json").await;

        let err = client(&endpoint)
            .query(&range(0.0, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Decode(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_query_body_stall_is_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Headers promise 100 bytes, then the body stops after a few
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await.unwrap();
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"total\":",
                )
                .await
                .unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_secs(3)).await;
        });

        let config = HttpConfig::default().with_request_timeout(Duration::from_secs(1));
        let client = CatalogClient::new(&format!("http://{}/products", addr), &config).unwrap();

        let err = client.query(&range(0.0, 1.0)).await.unwrap_err();
        match err {
            QueryError::Timeout(timeout) => assert_eq!(timeout, Duration::from_secs(1)),
            other => panic!("expected timeout, got {:?}", other),
        }
        server.abort();
    }

    #[tokio::test]
    async fn test_query_connection_refused() {
        // Bind then drop to get a port nothing listens on
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let err = client(&format!("http://{}/products", addr))
            .query(&range(0.0, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Http(_)));
    }
}
