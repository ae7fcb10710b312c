use axum::{
    extract::{ConnectInfo, Request},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tower_governor::key_extractor::KeyExtractor;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id carried in request extensions and echoed on the response
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Reuse the caller's id when it is a usable header value
    fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| Self(s.to_string()))
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

/// Client address as reported by a fronting proxy.
///
/// The first parseable entry of `x-forwarded-for` wins, then `x-real-ip`.
pub fn forwarded_client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse().ok());

    forwarded.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok())
    })
}

/// Proxy headers first, then the socket peer. Requests with neither share one bucket.
pub fn client_ip<T>(req: &Request<T>) -> IpAddr {
    forwarded_client_ip(req.headers())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Tag each request with a `RequestId` and log it
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = RequestId::from_headers(req.headers());

    tracing::info!(
        request_id = %request_id.as_str(),
        method = %req.method(),
        path = %req.uri().path(),
        client_ip = %client_ip(&req),
        "Incoming request"
    );

    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    tracing::debug!(
        request_id = %request_id.as_str(),
        status = %response.status(),
        "Request completed"
    );

    if let Ok(header_value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }

    response
}

/// Rate limiting key: the client IP
#[derive(Clone)]
pub struct ClientIpKeyExtractor;

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, tower_governor::GovernorError> {
        Ok(client_ip(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, value.parse().unwrap());
        }
        headers
    }

    #[test]
    fn test_request_id_is_uuid_when_absent() {
        let id = RequestId::from_headers(&HeaderMap::new());
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_request_id_is_reused() {
        let id = RequestId::from_headers(&headers(&[("x-request-id", "abc")]));
        assert_eq!(id.as_str(), "abc");
    }

    #[test]
    fn test_first_forwarded_address_wins() {
        let h = headers(&[
            ("x-forwarded-for", "192.168.1.1, 10.0.0.1"),
            ("x-real-ip", "10.0.0.7"),
        ]);
        assert_eq!(forwarded_client_ip(&h), Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn test_garbage_forwarded_falls_back_to_real_ip() {
        let h = headers(&[("x-forwarded-for", "not-an-ip"), ("x-real-ip", "::1")]);
        assert_eq!(forwarded_client_ip(&h), Some("::1".parse().unwrap()));
    }

    #[test]
    fn test_peer_address_fallback() {
        let mut req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_ip(&req), IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        let peer: SocketAddr = "203.0.113.9:5555".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(client_ip(&req), peer.ip());
    }
}
