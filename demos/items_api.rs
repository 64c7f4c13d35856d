//! Items API Example
//!
//! A small JSON API behind the full gate pipeline.
//!
//! Run with:
//! ```bash
//! cargo run --example items_api
//! ```
//!
//! Then test:
//! ```bash
//! # List items
//! curl -i http://localhost:3000/items
//!
//! # Create an item
//! curl -i -X POST http://localhost:3000/items \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "widget", "quantity": 3}'
//!
//! # Rejected: body on a GET
//! curl -i http://localhost:3000/items -H "Content-Type: application/json" -d '{}'
//!
//! # Rejected: unknown route
//! curl -i http://localhost:3000/nope
//!
//! # Health checks
//! curl -i http://localhost:3000/live
//! curl -i http://localhost:3000/ready
//!
//! # Prometheus metrics
//! curl http://localhost:3000/metrics
//! ```

use axum::{
    Json,
    extract::{Path, State},
    routing::get,
};
use axum_gatekeeper::{Config, Error, FluentRouter, Result, context};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::RwLock;

#[derive(Clone, Serialize)]
struct Item {
    id: u64,
    name: String,
    quantity: u32,
}

#[derive(Deserialize)]
struct NewItem {
    name: String,
    quantity: u32,
}

#[derive(Default)]
struct AppState {
    items: RwLock<BTreeMap<u64, Item>>,
}

async fn list_items(State(state): State<Arc<AppState>>) -> Json<Vec<Item>> {
    Json(state.items.read().await.values().cloned().collect())
}

async fn get_item(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> Result<Json<Item>> {
    state
        .items
        .read()
        .await
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| Error::not_found(format!("Item {id} does not exist.")))
}

async fn create_item(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewItem>,
) -> Result<Json<Item>> {
    if payload.name.trim().is_empty() {
        return Err(Error::bad_request("Item name cannot be empty."));
    }

    let mut items = state.items.write().await;
    let id = items.keys().next_back().map_or(1, |last| last + 1);
    let item = Item {
        id,
        name: payload.name,
        quantity: payload.quantity,
    };
    items.insert(id, item.clone());

    tracing::info!(
        item_id = id,
        request_id = context::request_id().unwrap_or_default(),
        "Item created"
    );
    Ok(Json(item))
}

async fn run() -> Result<()> {
    let config: Config = r#"
[http]
bind_addr = "127.0.0.1"
bind_port = 3000
request_timeout = "5s"

[http.rate_limit]
window = "60s"
max = 200

[http.body_limit]
default_limit = "64KiB"

[logging]
format = "default"
"#
    .parse()?;

    config.setup_tracing();
    config.setup_fatal_handlers();

    let state = Arc::new(AppState::default());

    FluentRouter::<Arc<AppState>>::with_state(config, state)?
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", get(get_item))
        .setup_middleware()?
        .start()
        .await
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!(error = %err, "Failed to start server");
        std::process::exit(1);
    }
}
