//! Cookie によるブラウザセッションの識別

use crate::domain::session::BrowserSessionId;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::header::InvalidHeaderValue;
use axum::http::{HeaderMap, HeaderValue, header};
use std::convert::Infallible;
use std::time::Duration;

pub const SESSION_COOKIE: &str = "qr_session";

/// リクエストのブラウザセッション
///
/// Cookie がない、または値が不正な場合は新しいIDを発行する。
#[derive(Debug, Clone, Copy)]
pub struct BrowserSession {
    pub id: BrowserSessionId,
}

impl BrowserSession {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let id = session_id_from_cookies(headers).unwrap_or_else(BrowserSessionId::generate);
        Self { id }
    }

    /// `Set-Cookie` ヘッダーの値
    pub fn cookie(&self, ttl: Duration) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::try_from(format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.id,
            ttl.as_secs()
        ))
    }
}

impl<S> FromRequestParts<S> for BrowserSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

fn session_id_from_cookies(headers: &HeaderMap) -> Option<BrowserSessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| value.trim().parse().ok())
}
