//! `reqwest` implementation of [`StorefrontApi`].

use std::sync::Arc;

use async_trait::async_trait;
use pantry_core::{LineId, LoyaltyBalance, OrderId};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::wire::{CartBody, CartLineBody, ErrorBody, LoyaltyBody, OrderBody, PaymentBody};
use super::{
    ApiError, CartLine, CreateOrderRequest, CreatePaymentRequest, PaymentSession, PersistedOrder,
    StorefrontApi,
};
use crate::config::BackendApiConfig;
use crate::middleware::request_id::REQUEST_ID_HEADER;
use crate::session::SessionContext;

#[derive(Serialize)]
struct UpdateQuantityBody {
    quantity: u32,
}

/// Client for the Pantry backend, bound to one visitor's session.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
    session: SessionContext,
    request_id: Option<String>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("session", &self.session)
            .field("request_id", &self.request_id)
            .finish()
    }
}

impl ApiClient {
    /// Create an anonymous client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &BackendApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("pantry-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
            session: SessionContext::anonymous(),
            request_id: None,
        })
    }

    /// A client sharing this one's connection pool, acting for `session`.
    #[must_use]
    pub fn for_session(&self, session: SessionContext) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            session,
            request_id: self.request_id.clone(),
        }
    }

    /// Forward `request_id` to the backend on every call.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// The session this client acts for.
    #[must_use]
    pub const fn session(&self) -> &SessionContext {
        &self.session
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| ApiError::Parse(format!("Invalid endpoint path {path}: {e}")))
    }

    /// Build an authenticated request. Fails without touching the network
    /// when the session has no token.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let token = self.session.bearer_token().ok_or(ApiError::Unauthorized)?;
        let url = self.endpoint(path)?;

        let mut builder = self.inner.client.request(method, url).bearer_auth(token);
        if let Some(request_id) = &self.request_id {
            builder = builder.header(REQUEST_ID_HEADER, request_id);
        }
        Ok(builder)
    }

    /// Send a request and turn non-success statuses into errors.
    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!(%status, path, "Backend rejected session token");
                Err(ApiError::Unauthorized)
            }
            s if !s.is_success() => {
                let text = response.text().await.unwrap_or_default();
                let message = ErrorBody::message_from(&text);
                if s == StatusCode::NOT_FOUND {
                    debug!(path, message = ?message, "Backend resource not found");
                    return Err(ApiError::NotFound {
                        path: path.to_string(),
                        message,
                    });
                }
                warn!(status = s.as_u16(), path, message = ?message, "Backend request failed");
                Err(ApiError::Api {
                    status: s.as_u16(),
                    message,
                })
            }
            _ => Ok(response),
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, "Unexpected response body from backend");
            ApiError::Parse(e.to_string())
        })
    }
}

#[async_trait]
impl StorefrontApi for ApiClient {
    #[instrument(skip(self))]
    async fn get_cart(&self) -> Result<Vec<CartLine>, ApiError> {
        let builder = self.request(Method::GET, "cart")?;
        let response = self.send(builder, "cart").await?;
        let body: CartBody = Self::read_json(response).await?;
        let lines = body.into_lines()?;
        debug!(line_count = lines.len(), "Fetched cart");
        Ok(lines)
    }

    #[instrument(skip(self))]
    async fn update_cart_line(
        &self,
        line_id: LineId,
        quantity: u32,
    ) -> Result<CartLine, ApiError> {
        let path = format!("cart/{line_id}");
        let builder = self
            .request(Method::PUT, &path)?
            .json(&UpdateQuantityBody { quantity });
        let response = self.send(builder, &path).await?;
        let body: CartLineBody = Self::read_json(response).await?;
        CartLine::try_from(body)
    }

    #[instrument(skip(self))]
    async fn delete_cart_line(&self, line_id: LineId) -> Result<(), ApiError> {
        let path = format!("cart/{line_id}");
        let builder = self.request(Method::DELETE, &path)?;
        self.send(builder, &path).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_loyalty_points(&self) -> Result<LoyaltyBalance, ApiError> {
        let builder = self.request(Method::GET, "loyalty/points")?;
        let response = self.send(builder, "loyalty/points").await?;
        let body: LoyaltyBody = Self::read_json(response).await?;
        Ok(body.into())
    }

    #[instrument(skip(self, order), fields(items = order.items.len(), points_used = order.points_used))]
    async fn create_order(&self, order: &CreateOrderRequest) -> Result<PersistedOrder, ApiError> {
        let builder = self.request(Method::POST, "orders")?.json(order);
        let response = self.send(builder, "orders").await?;
        let body: OrderBody = Self::read_json(response).await?;
        let order = PersistedOrder::from(body);
        debug!(order_id = %order.id, "Order created");
        Ok(order)
    }

    #[instrument(skip(self))]
    async fn get_order(&self, order_id: OrderId) -> Result<PersistedOrder, ApiError> {
        let path = format!("orders/{order_id}");
        let builder = self.request(Method::GET, &path)?;
        let response = self.send(builder, &path).await?;
        let body: OrderBody = Self::read_json(response).await?;
        Ok(body.into())
    }

    #[instrument(skip(self, request), fields(order_id = %request.order_id, method = %request.payment_method))]
    async fn create_payment(
        &self,
        request: &CreatePaymentRequest,
    ) -> Result<PaymentSession, ApiError> {
        let builder = self.request(Method::POST, "payments")?.json(request);
        let response = self.send(builder, "payments").await?;
        let body: PaymentBody = Self::read_json(response).await?;
        Ok(body.into())
    }
}
