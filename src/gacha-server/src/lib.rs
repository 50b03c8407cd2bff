//! Gacha Simulator API
//!
//! HTTP surface over the `gacha` draw engine: pool inspection, rate tables,
//! normal/pickup/box draws and in-memory statistics.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use gacha::{
    catalog, DrawOrchestrator, DrawResult, DrawStatistics, GachaError, GachaSettings, Item,
    ItemRate, PoolRegistry, RarityRate, RateTable,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{OpenApi, ToSchema};
use utoipa_scalar::{Scalar, Servable};
use uuid::Uuid;

// =============================================================================
// Startup
// =============================================================================

/// Settings file read when none is given explicitly
pub const DEFAULT_SETTINGS: &str = "gacha.toml";

/// Build the orchestrator from disk. Any failure here is fatal.
///
/// An explicit `settings` path must exist. Without one, [`DEFAULT_SETTINGS`]
/// is read if present and built-in defaults apply otherwise.
pub fn load_orchestrator(
    data_dir: &Path,
    settings: Option<&Path>,
) -> anyhow::Result<DrawOrchestrator> {
    let settings = match settings {
        Some(path) => GachaSettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => GachaSettings::load_or_default(Path::new(DEFAULT_SETTINGS))
            .with_context(|| format!("Failed to load settings from {DEFAULT_SETTINGS}"))?,
    };
    let catalogs = catalog::load_dir(data_dir)
        .with_context(|| format!("Failed to load catalogs from {}", data_dir.display()))?;
    let registry = PoolRegistry::from_catalogs(catalogs)?;
    let gacha = DrawOrchestrator::new(registry, settings)?;
    Ok(gacha)
}

// =============================================================================
// App State
// =============================================================================

pub struct AppState {
    pub gacha: DrawOrchestrator,
    pub stats: Mutex<DrawStatistics>,
}

impl AppState {
    pub fn new(gacha: DrawOrchestrator) -> Self {
        Self {
            gacha,
            stats: Mutex::new(DrawStatistics::new()),
        }
    }

    fn lock_stats(&self) -> Result<MutexGuard<'_, DrawStatistics>, (StatusCode, String)> {
        self.stats.lock().map_err(|_| {
            tracing::error!("Statistics lock poisoned");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Statistics unavailable".to_string(),
            )
        })
    }

    fn record(&self, result: &DrawResult) -> Result<(), (StatusCode, String)> {
        self.lock_stats()?.record(result);
        Ok(())
    }
}

/// Map a draw error to a response. Anything that is not the caller's fault
/// points at bad catalog data and is logged.
fn error_response(err: GachaError) -> (StatusCode, String) {
    match &err {
        GachaError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        GachaError::UnknownPool(_) => (StatusCode::NOT_FOUND, err.to_string()),
        GachaError::Data(_) | GachaError::EmptyTable => {
            tracing::error!(error = %err, "Draw failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Draw failed, see server logs".to_string(),
            )
        }
    }
}

// =============================================================================
// OpenAPI Schema
// =============================================================================

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gacha Simulator API",
        description = "Weighted loot-box draws with guaranteed slots and pickup boosting",
        version = "0.3.0",
        license(name = "BSD-2-Clause"),
    ),
    paths(
        health,
        list_pools,
        list_pool_items,
        get_pool_item,
        get_pool_rates,
        pull,
        pull_pickup,
        pull_box,
        get_pickup_rates,
        get_stats,
        reset_stats,
    ),
    components(schemas(
        HealthResponse,
        PoolsResponse,
        ItemResponse,
        PickupRequest,
        BoxPullRequest,
        DrawEntryResponse,
        PullResponse,
        RarityRateResponse,
        ItemRateResponse,
        RatesResponse,
        StatsResponse,
    ))
)]
pub struct ApiDoc;

// =============================================================================
// Types
// =============================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PoolsResponse {
    pub pools: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemResponse {
    pub id: u32,
    pub name: String,
    pub rarity: String,
    pub base_weight: u32,
}

impl From<&Item> for ItemResponse {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            rarity: item.rarity.to_string(),
            base_weight: item.base_weight,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PickupRequest {
    pub pickup_item_ids: Vec<u32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BoxPullRequest {
    pub pool: String,
    pub count: usize,
    /// Item ids the caller already owns; they are never drawn
    #[serde(default)]
    pub exclude_ids: Vec<u32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DrawEntryResponse {
    pub id: u32,
    pub name: String,
    pub rarity: String,
    pub is_pickup_hit: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PullResponse {
    /// Unique ID assigned to this draw
    pub draw_id: String,
    /// UTC time the draw was made (RFC 3339)
    pub timestamp: String,
    pub kind: String,
    pub total_pulls: usize,
    /// Slots in draw order; for ten-pulls the last one is the guaranteed slot
    pub items: Vec<DrawEntryResponse>,
}

impl From<DrawResult> for PullResponse {
    fn from(result: DrawResult) -> Self {
        let kind = match result.kind {
            gacha::DrawKind::Normal => "normal",
            gacha::DrawKind::Pickup => "pickup",
            gacha::DrawKind::Box => "box",
        };
        Self {
            draw_id: Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            kind: kind.to_string(),
            total_pulls: result.len(),
            items: result
                .entries
                .into_iter()
                .map(|entry| DrawEntryResponse {
                    id: entry.id,
                    name: entry.name,
                    rarity: entry.rarity.to_string(),
                    is_pickup_hit: entry.is_pickup_hit,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RarityRateResponse {
    pub rarity: String,
    pub weight: i64,
    pub probability: f64,
    pub percent: String,
}

impl From<&RarityRate> for RarityRateResponse {
    fn from(rate: &RarityRate) -> Self {
        Self {
            rarity: rate.rarity.to_string(),
            weight: rate.weight,
            probability: rate.probability,
            percent: format!("{:.2}%", rate.probability * 100.0),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemRateResponse {
    pub id: u32,
    pub name: String,
    pub rarity: String,
    pub is_pickup: bool,
    pub base_weight: u32,
    pub adjusted_weight: i64,
    pub probability: f64,
    pub percent: String,
}

impl From<&ItemRate> for ItemRateResponse {
    fn from(rate: &ItemRate) -> Self {
        Self {
            id: rate.id,
            name: rate.name.clone(),
            rarity: rate.rarity.to_string(),
            is_pickup: rate.is_pickup,
            base_weight: rate.base_weight,
            adjusted_weight: rate.weight,
            probability: rate.probability,
            percent: format!("{:.4}%", rate.probability * 100.0),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RatesResponse {
    pub pool: String,
    pub total_weight: i64,
    pub rarities: Vec<RarityRateResponse>,
    pub items: Vec<ItemRateResponse>,
}

impl From<RateTable> for RatesResponse {
    fn from(table: RateTable) -> Self {
        Self {
            rarities: table.by_rarity.iter().map(Into::into).collect(),
            items: table.items.iter().map(Into::into).collect(),
            pool: table.pool,
            total_weight: table.total_weight,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub total_draws: u64,
    pub total_pulls: u64,
    pub normal_draws: u64,
    pub pickup_draws: u64,
    pub box_draws: u64,
    pub pickup_hits: u64,
    pub by_rarity: BTreeMap<String, u64>,
}

impl From<&DrawStatistics> for StatsResponse {
    fn from(stats: &DrawStatistics) -> Self {
        Self {
            total_draws: stats.total_draws,
            total_pulls: stats.total_pulls,
            normal_draws: stats.normal_draws,
            pickup_draws: stats.pickup_draws,
            box_draws: stats.box_draws,
            pickup_hits: stats.pickup_hits,
            by_rarity: stats
                .by_rarity
                .iter()
                .map(|(rarity, count)| (rarity.to_string(), *count))
                .collect(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse)),
    tag = "System"
)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// OPTIONS handler returns OpenAPI schema for API discovery
async fn options_schema() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[utoipa::path(
    get,
    path = "/pools",
    responses((status = 200, description = "Registered pool names", body = PoolsResponse)),
    tag = "Pools"
)]
async fn list_pools(State(state): State<Arc<AppState>>) -> Json<PoolsResponse> {
    Json(PoolsResponse {
        pools: state
            .gacha
            .list_pools()
            .into_iter()
            .map(String::from)
            .collect(),
    })
}

#[utoipa::path(
    get,
    path = "/pools/{pool}/items",
    params(("pool" = String, Path, description = "Pool name")),
    responses(
        (status = 200, description = "Items in catalog order", body = Vec<ItemResponse>),
        (status = 404, description = "Pool not found")
    ),
    tag = "Pools"
)]
async fn list_pool_items(
    State(state): State<Arc<AppState>>,
    AxumPath(pool): AxumPath<String>,
) -> Result<Json<Vec<ItemResponse>>, (StatusCode, String)> {
    let pool = state.gacha.registry().pool(&pool).map_err(error_response)?;
    Ok(Json(pool.items().iter().map(ItemResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/pools/{pool}/items/{id}",
    params(
        ("pool" = String, Path, description = "Pool name"),
        ("id" = u32, Path, description = "Item id")
    ),
    responses(
        (status = 200, description = "Item found", body = ItemResponse),
        (status = 404, description = "Pool or item not found")
    ),
    tag = "Pools"
)]
async fn get_pool_item(
    State(state): State<Arc<AppState>>,
    AxumPath((pool, id)): AxumPath<(String, u32)>,
) -> Result<Json<ItemResponse>, (StatusCode, String)> {
    let pool = state.gacha.registry().pool(&pool).map_err(error_response)?;
    let item = pool.item(id).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("Item {} not found in pool '{}'", id, pool.name()),
        )
    })?;
    Ok(Json(ItemResponse::from(item)))
}

#[utoipa::path(
    get,
    path = "/pools/{pool}/rates",
    params(("pool" = String, Path, description = "Pool name")),
    responses(
        (status = 200, description = "Draw probabilities", body = RatesResponse),
        (status = 404, description = "Pool not found")
    ),
    tag = "Rates"
)]
async fn get_pool_rates(
    State(state): State<Arc<AppState>>,
    AxumPath(pool): AxumPath<String>,
) -> Result<Json<RatesResponse>, (StatusCode, String)> {
    let rates = state.gacha.rates(&pool).map_err(error_response)?;
    Ok(Json(rates.into()))
}

#[utoipa::path(
    post,
    path = "/rates/pickup",
    request_body = PickupRequest,
    responses(
        (status = 200, description = "Draw probabilities with pickup boost applied", body = RatesResponse),
        (status = 400, description = "Invalid pickup selection")
    ),
    tag = "Rates"
)]
async fn get_pickup_rates(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PickupRequest>,
) -> Result<Json<RatesResponse>, (StatusCode, String)> {
    let rates = state
        .gacha
        .pickup_rates(&req.pickup_item_ids)
        .map_err(error_response)?;
    Ok(Json(rates.into()))
}

#[utoipa::path(
    post,
    path = "/pull",
    responses((status = 200, description = "Draw result", body = PullResponse)),
    tag = "Draws"
)]
async fn pull(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PullResponse>, (StatusCode, String)> {
    let result = {
        let mut rng = rand::thread_rng();
        state.gacha.draw(&mut rng).map_err(error_response)?
    };
    state.record(&result)?;
    tracing::info!(pulls = result.len(), "Normal draw served");
    Ok(Json(result.into()))
}

#[utoipa::path(
    post,
    path = "/pull/pickup",
    request_body = PickupRequest,
    responses(
        (status = 200, description = "Draw result", body = PullResponse),
        (status = 400, description = "Invalid pickup selection")
    ),
    tag = "Draws"
)]
async fn pull_pickup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PickupRequest>,
) -> Result<Json<PullResponse>, (StatusCode, String)> {
    let result = {
        let mut rng = rand::thread_rng();
        state
            .gacha
            .draw_pickup(&req.pickup_item_ids, &mut rng)
            .map_err(error_response)?
    };
    state.record(&result)?;
    tracing::info!(
        pulls = result.len(),
        hits = result.pickup_hits(),
        pickup = ?req.pickup_item_ids,
        "Pickup draw served"
    );
    Ok(Json(result.into()))
}

#[utoipa::path(
    post,
    path = "/pull/box",
    request_body = BoxPullRequest,
    responses(
        (status = 200, description = "Distinct items drawn without replacement", body = PullResponse),
        (status = 400, description = "Invalid count"),
        (status = 404, description = "Pool not found")
    ),
    tag = "Draws"
)]
async fn pull_box(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BoxPullRequest>,
) -> Result<Json<PullResponse>, (StatusCode, String)> {
    let result = {
        let mut rng = rand::thread_rng();
        state
            .gacha
            .draw_box(&req.pool, req.count, &req.exclude_ids, &mut rng)
            .map_err(error_response)?
    };
    state.record(&result)?;
    tracing::info!(pool = %req.pool, pulls = result.len(), "Box draw served");
    Ok(Json(result.into()))
}

#[utoipa::path(
    get,
    path = "/stats",
    responses((status = 200, description = "Draw statistics since start or last reset", body = StatsResponse)),
    tag = "System"
)]
async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, (StatusCode, String)> {
    let stats = state.lock_stats()?;
    Ok(Json(StatsResponse::from(&*stats)))
}

#[utoipa::path(
    delete,
    path = "/stats",
    responses((status = 204, description = "Statistics cleared")),
    tag = "System"
)]
async fn reset_stats(State(state): State<Arc<AppState>>) -> Result<StatusCode, (StatusCode, String)> {
    state.lock_stats()?.reset();
    tracing::info!("Statistics reset");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Router
// =============================================================================

/// Build the full application router
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes with CORS
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/pools", get(list_pools))
        .route("/pools/{pool}/items", get(list_pool_items))
        .route("/pools/{pool}/items/{id}", get(get_pool_item))
        .route("/pools/{pool}/rates", get(get_pool_rates))
        .route("/rates/pickup", post(get_pickup_rates))
        .route("/pull", post(pull))
        .route("/pull/pickup", post(pull_pickup))
        .route("/pull/box", post(pull_box))
        .route("/stats", get(get_stats).delete(reset_stats))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state)
        .layer(cors);

    // Root OPTIONS returns OpenAPI schema (no CORS interception)
    Router::new()
        .route("/", axum::routing::options(options_schema))
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
}
