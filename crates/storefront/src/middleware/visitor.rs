//! Per-visitor API client extractor.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::api::ApiClient;
use crate::middleware::RequestId;
use crate::session::SessionContext;
use crate::state::AppState;

/// Backend client acting for the visitor who made the request.
///
/// The session token comes from the `Authorization` header or the configured
/// session cookie; a visitor without one gets an anonymous client whose calls
/// fail with `Unauthorized` before reaching the network.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(VisitorApi(api): VisitorApi) -> impl IntoResponse {
///     let order = api.get_order(order_id).await?;
/// }
/// ```
pub struct VisitorApi(pub ApiClient);

impl FromRequestParts<AppState> for VisitorApi {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = SessionContext::from_headers(&parts.headers, &state.config().session_cookie);
        let mut client = state.api().for_session(session);

        if let Some(request_id) = parts.extensions.get::<RequestId>() {
            client = client.with_request_id(request_id.as_str());
        }

        Ok(Self(client))
    }
}
