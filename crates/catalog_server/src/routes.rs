//! HTTP adapter: maps verbs, paths and JSON bodies onto service calls.
//!
//! # Invariants
//! - Payloads, path ids and query filters are validated before any service
//!   call; every rejection becomes a JSON 400.
//! - Storage work runs on the blocking pool, never on a runtime worker.
//! - On update the path id wins over any id in the body.

use crate::error::ApiError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use catalog_core::{
    core_version, Category, CategoryId, CategoryService, EntityKind, Product, ProductFilter,
    ProductId, ProductService, Store, StoreResult,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Shared per-process handler state.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
    categories: CategoryService,
    products: ProductService,
}

impl AppState {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            categories: CategoryService::new(Arc::clone(&store)),
            products: ProductService::new(Arc::clone(&store)),
            store,
        }
    }
}

/// Body returned by create endpoints.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Created {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub category: Option<CategoryId>,
}

/// Builds the full application router.
///
/// `access_log` adds one `http_request` log event per request.
pub fn build_router(state: AppState, access_log: bool) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route(
            "/api/categories",
            get(list_categories).post(create_category),
        )
        .route(
            "/api/categories/",
            get(list_categories).post(create_category),
        )
        .route(
            "/api/categories/:id",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/", get(list_products).post(create_product))
        .route(
            "/api/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .with_state(state);

    if access_log {
        router.layer(middleware::from_fn(log_request))
    } else {
        router
    }
}

async fn health(State(state): State<AppState>) -> Result<Json<Health>, ApiError> {
    run_blocking(move || state.store.ping()).await?;
    Ok(Json(Health {
        status: "ok",
        version: core_version(),
    }))
}

async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = run_blocking(move || state.categories.list()).await?;
    Ok(Json(categories))
}

async fn get_category(
    State(state): State<AppState>,
    id: Result<Path<CategoryId>, PathRejection>,
) -> Result<Json<Category>, ApiError> {
    let id = parse_path(id)?;
    run_blocking(move || state.categories.get(id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound {
            entity: EntityKind::Category,
            id,
        })
}

async fn create_category(
    State(state): State<AppState>,
    payload: Result<Json<Category>, JsonRejection>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let category = parse_body(payload)?;
    category.validate()?;
    let id = run_blocking(move || state.categories.create(&category)).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

async fn update_category(
    State(state): State<AppState>,
    id: Result<Path<CategoryId>, PathRejection>,
    payload: Result<Json<Category>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let id = parse_path(id)?;
    let mut category = parse_body(payload)?;
    category.validate()?;
    category.id = id;
    run_blocking(move || state.categories.update(&category)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_category(
    State(state): State<AppState>,
    id: Result<Path<CategoryId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = parse_path(id)?;
    run_blocking(move || state.categories.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_products(
    State(state): State<AppState>,
    params: Result<Query<ProductListParams>, QueryRejection>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let params = parse_query(params)?;
    let filter = ProductFilter {
        category: params.category,
    };
    let products = run_blocking(move || state.products.list(&filter)).await?;
    Ok(Json(products))
}

async fn get_product(
    State(state): State<AppState>,
    id: Result<Path<ProductId>, PathRejection>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_path(id)?;
    run_blocking(move || state.products.get(id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound {
            entity: EntityKind::Product,
            id,
        })
}

async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<Product>, JsonRejection>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let product = parse_body(payload)?;
    product.validate()?;
    let id = run_blocking(move || state.products.create(&product)).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

async fn update_product(
    State(state): State<AppState>,
    id: Result<Path<ProductId>, PathRejection>,
    payload: Result<Json<Product>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let id = parse_path(id)?;
    let mut product = parse_body(payload)?;
    product.validate()?;
    product.id = id;
    run_blocking(move || state.products.update(&product)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_product(
    State(state): State<AppState>,
    id: Result<Path<ProductId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = parse_path(id)?;
    run_blocking(move || state.products.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn parse_path<T>(id: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    id.map(|Path(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn parse_query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| ApiError::Internal(format!("storage task failed: {err}")))?
        .map_err(ApiError::from)
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started_at = Instant::now();

    let response = next.run(request).await;

    info!(
        "event=http_request module=api method={} path={} status={} duration_ms={}",
        method,
        path,
        response.status().as_u16(),
        started_at.elapsed().as_millis()
    );
    response
}
