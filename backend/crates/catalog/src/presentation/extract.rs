//! Request extractors

use crate::domain::value_objects::ClientAddress;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use platform::client::resolve_client_address;
use std::convert::Infallible;
use std::net::SocketAddr;

pub const BARCODE_HEADER: &str = "barcode";
pub const UUID_HEADER: &str = "uuid";
pub const NAME_HEADER: &str = "name";

/// Who is asking and about what
///
/// Client installations send their inputs as request headers. Values are
/// taken verbatim; shape checks happen in the handlers after rate limiting.
#[derive(Debug, Clone)]
pub struct ClientRequest {
    pub address: ClientAddress,
    pub uuid: String,
    pub barcode: String,
    pub name: String,
}

impl ClientRequest {
    pub fn from_headers(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        Self {
            address: ClientAddress::new(resolve_client_address(headers, peer)),
            uuid: header_value(headers, UUID_HEADER),
            barcode: header_value(headers, BARCODE_HEADER),
            name: header_value(headers, NAME_HEADER),
        }
    }
}

impl<S> FromRequestParts<S> for ClientRequest
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(Self::from_headers(&parts.headers, peer))
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
