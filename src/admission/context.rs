//! Request context and rate limit key derivation

use std::collections::HashMap;

use crate::config::KeyType;

/// Shared key for requests with no authenticated principal
pub const ANONYMOUS_PRINCIPAL: &str = "anonymous";

/// Proxy headers consulted for the client IP, in priority order. Header
/// names are matched case-insensitively.
pub const IP_HEADER_CHAIN: [&str; 5] = [
    "x-forwarded-for",
    "proxy-client-ip",
    "wl-proxy-client-ip",
    "http_client_ip",
    "http_x_forwarded_for",
];

/// The slice of an incoming request that key derivation needs
///
/// Transport-agnostic on purpose: an HTTP middleware, a gRPC interceptor
/// or a test fixture all build one of these the same way.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    headers: HashMap<String, String>,
    remote_addr: Option<String>,
    principal: Option<String>,
    operation: String,
}

impl RequestContext {
    /// Context for a named operation (handler, route or RPC method)
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Self::default()
        }
    }

    /// Attach a request header. Names are stored lowercased.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Attach the transport-level peer address
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// Attach the authenticated principal
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Resolve the client IP through the proxy header chain, falling back
    /// to the peer address. X-Forwarded-For may carry a comma-separated
    /// chain; the first entry is the originating client. Empty values and
    /// the literal "unknown" (any case) are skipped.
    pub fn client_ip(&self) -> String {
        for header in IP_HEADER_CHAIN {
            if let Some(value) = self.headers.get(header) {
                let first = value.split(',').next().unwrap_or("").trim();
                if !first.is_empty() && !first.eq_ignore_ascii_case("unknown") {
                    return first.to_string();
                }
            }
        }
        match &self.remote_addr {
            Some(addr) if !addr.is_empty() => addr.clone(),
            _ => "unknown".to_string(),
        }
    }
}

/// Derive the rate limit key for a request under the given key type
pub fn derive_key(ctx: &RequestContext, key_type: KeyType) -> String {
    match key_type {
        KeyType::Ip => ctx.client_ip(),
        KeyType::User => ctx
            .principal
            .clone()
            .unwrap_or_else(|| ANONYMOUS_PRINCIPAL.to_string()),
        KeyType::Method => ctx.operation.to_string(),
    }
}
