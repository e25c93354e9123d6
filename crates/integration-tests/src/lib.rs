//! Integration test harness for the Pantry storefront.
//!
//! Provides an in-process fake of the Pantry REST backend and a helper that
//! serves the real storefront router, both on ephemeral localhost ports.
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = FakeBackend::start(BackendState::with_cart(vec![cart_line(1, 2, 50_000, 10)])).await;
//! let api = backend.client(Some(TEST_TOKEN));
//! let lines = api.get_cart().await?;
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use pantry_storefront::api::ApiClient;
use pantry_storefront::config::{BackendApiConfig, StorefrontConfig};
use pantry_storefront::session::SessionContext;
use pantry_storefront::state::AppState;
use serde_json::{Value, json};

/// The only bearer token the fake backend accepts.
pub const TEST_TOKEN: &str = "test-token";

/// A request as seen by the fake backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub request_id: Option<String>,
}

/// Mutable state behind the fake backend.
#[derive(Debug, Default)]
pub struct BackendState {
    /// Cart lines in wire format.
    pub cart: Vec<Value>,
    pub loyalty_points: i64,
    /// Order ID to status.
    pub orders: HashMap<i64, String>,
    pub next_order_id: i64,
    /// URL returned by `POST /payments`; `None` returns a body without one.
    pub pay_url: Option<String>,
    /// When set, `POST /orders` fails with this status and message.
    pub order_error: Option<(u16, String)>,
    /// Bodies received on `POST /orders`.
    pub order_bodies: Vec<Value>,
    /// Bodies received on `POST /payments`.
    pub payment_bodies: Vec<Value>,
    pub requests: Vec<RecordedRequest>,
}

impl BackendState {
    /// A backend holding `cart`, with 100 loyalty points and a working
    /// gateway.
    #[must_use]
    pub fn with_cart(cart: Vec<Value>) -> Self {
        Self {
            cart,
            loyalty_points: 100,
            next_order_id: 1000,
            pay_url: Some("https://gateway.test/pay?ref=1000".to_string()),
            ..Self::default()
        }
    }
}

/// A cart line in the backend's wire format.
#[must_use]
pub fn cart_line(line_id: i64, quantity: i64, unit_price: i64, stock: i64) -> Value {
    json!({
        "lineId": line_id,
        "productId": line_id * 10,
        "quantity": quantity,
        "unitPrice": unit_price,
        "productName": format!("Product {line_id}"),
        "productImage": format!("/images/{line_id}.jpg"),
        "stockAvailable": stock,
    })
}

type Shared = Arc<Mutex<BackendState>>;

/// A running fake backend.
pub struct FakeBackend {
    pub base_url: String,
    state: Shared,
}

impl FakeBackend {
    /// Start the fake backend on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start(state: BackendState) -> Self {
        let state: Shared = Arc::new(Mutex::new(state));

        let app = Router::new()
            .route("/api/cart", get(get_cart))
            .route("/api/cart/{line_id}", put(update_line).delete(delete_line))
            .route("/api/loyalty/points", get(loyalty_points))
            .route("/api/orders", post(create_order))
            .route("/api/orders/{order_id}", get(get_order))
            .route("/api/payments", post(create_payment))
            .layer(middleware::from_fn_with_state(state.clone(), authorize))
            .with_state(state.clone());

        let addr = serve(app).await;
        Self {
            base_url: format!("http://{addr}/api"),
            state,
        }
    }

    /// Lock the backend state for inspection or setup.
    ///
    /// # Panics
    ///
    /// Panics if a handler panicked while holding the lock.
    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().expect("backend state poisoned")
    }

    /// Backend configuration pointing at this fake.
    ///
    /// # Panics
    ///
    /// Panics if the base URL is invalid.
    #[must_use]
    pub fn api_config(&self) -> BackendApiConfig {
        BackendApiConfig::new(&self.base_url, Duration::from_secs(5)).expect("valid base URL")
    }

    /// A real API client for this backend, optionally signed in.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client(&self, token: Option<&str>) -> ApiClient {
        let session = token.map_or_else(SessionContext::anonymous, SessionContext::with_token);
        ApiClient::new(&self.api_config())
            .expect("client builds")
            .for_session(session)
    }

    /// Number of requests that reached a handler.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }
}

/// Serve the real storefront router against `backend`; returns its base URL.
///
/// # Panics
///
/// Panics if the configuration is invalid or the listener cannot be bound.
pub async fn spawn_storefront(backend: &FakeBackend) -> String {
    let base_url = backend.base_url.clone();
    let config = StorefrontConfig::from_lookup(move |key| match key {
        "PANTRY_API_BASE_URL" => Some(base_url.clone()),
        "PANTRY_SESSION_COOKIE" => Some("access_token".to_string()),
        _ => None,
    })
    .expect("valid config");

    let state = AppState::new(config).expect("state builds");
    let addr = serve(pantry_storefront::routes::app(state)).await;
    format!("http://{addr}")
}

/// An HTTP client that does not follow redirects.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client builds")
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake server");
    });
    addr
}

// =============================================================================
// Handlers
// =============================================================================

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().expect("backend state poisoned")
}

async fn authorize(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    lock(&state).requests.push(RecordedRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        request_id,
    });

    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TEST_TOKEN}"));
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"}))).into_response();
    }

    next.run(request).await
}

async fn get_cart(State(state): State<Shared>) -> Json<Value> {
    Json(json!({ "items": lock(&state).cart }))
}

async fn update_line(
    State(state): State<Shared>,
    Path(line_id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let quantity = body["quantity"].as_i64().unwrap_or(0);
    let mut state = lock(&state);
    let Some(line) = state.cart.iter_mut().find(|l| l["lineId"] == line_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if quantity > line["stockAvailable"].as_i64().unwrap_or(0) {
        return (
            StatusCode::CONFLICT,
            Json(json!({"message": "Not enough stock"})),
        )
            .into_response();
    }
    line["quantity"] = json!(quantity);
    Json(line.clone()).into_response()
}

async fn delete_line(State(state): State<Shared>, Path(line_id): Path<i64>) -> StatusCode {
    let mut state = lock(&state);
    let before = state.cart.len();
    state.cart.retain(|l| l["lineId"] != line_id);
    if state.cart.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn loyalty_points(State(state): State<Shared>) -> Json<Value> {
    Json(json!({ "totalPoints": lock(&state).loyalty_points }))
}

async fn create_order(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    state.order_bodies.push(body.clone());

    if let Some((status, message)) = state.order_error.clone() {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST);
        return (status, Json(json!({ "message": message }))).into_response();
    }

    let id = state.next_order_id;
    state.next_order_id += 1;
    state.orders.insert(id, "PENDING".to_string());

    let ordered: Vec<Value> = body["cartItemIds"].as_array().cloned().unwrap_or_default();
    state.cart.retain(|l| !ordered.contains(&l["lineId"]));

    (StatusCode::CREATED, Json(json!({ "id": id, "status": "PENDING" }))).into_response()
}

async fn get_order(State(state): State<Shared>, Path(order_id): Path<i64>) -> Response {
    lock(&state).orders.get(&order_id).map_or_else(
        || StatusCode::NOT_FOUND.into_response(),
        |status| Json(json!({ "id": order_id, "status": status })).into_response(),
    )
}

async fn create_payment(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut state = lock(&state);
    state.payment_bodies.push(body);
    Json(
        state
            .pay_url
            .as_ref()
            .map_or_else(|| json!({}), |url| json!({ "payUrl": url })),
    )
}
