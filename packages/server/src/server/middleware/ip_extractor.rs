use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use std::net::{IpAddr, SocketAddr};

/// Client IP resolved for the request. Recorded on OTP rows for auditing.
#[derive(Clone, Debug)]
pub struct ClientIp(pub IpAddr);

/// Middleware to resolve the client address.
///
/// Priority:
/// 1. X-Forwarded-For header, first hop (requests through proxies)
/// 2. X-Real-IP header (Nginx)
/// 3. Socket peer address (direct connection)
pub async fn extract_client_ip(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    mut request: Request,
    next: Next,
) -> Response {
    let headers = request.headers();
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|list| list.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<IpAddr>().ok())
        })
        .unwrap_or_else(|| addr.ip());

    request.extensions_mut().insert(ClientIp(ip));
    next.run(request).await
}
