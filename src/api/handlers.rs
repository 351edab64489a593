use axum::extract::State;
use axum::http::Uri;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::error::ApiResult;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::AppState;
use crate::models::{DbData, OperationalCost, Product, ProductType, RawMaterial, Sale};
use crate::reports::{DateRange, SalesSummary};
use crate::service::{NewSale, RestockInput, ServiceError};

/// Health check response
#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// The whole document, for clients that refetch after every write.
pub async fn get_data(State(state): State<AppState>) -> ApiResult<Json<DbData>> {
    Ok(Json(state.service.snapshot().await?))
}

// Raw materials

pub async fn list_raw_materials(State(state): State<AppState>) -> ApiResult<Json<Vec<RawMaterial>>> {
    Ok(Json(state.service.list_raw_materials().await?))
}

pub async fn get_raw_material(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<RawMaterial>> {
    Ok(Json(state.service.get_raw_material(&id).await?))
}

pub async fn create_raw_material(
    State(state): State<AppState>,
    ApiJson(material): ApiJson<RawMaterial>,
) -> ApiResult<(StatusCode, Json<RawMaterial>)> {
    let created = state.service.create_raw_material(material).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_raw_material(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(material): ApiJson<RawMaterial>,
) -> ApiResult<Json<RawMaterial>> {
    Ok(Json(state.service.update_raw_material(&id, material).await?))
}

pub async fn delete_raw_material(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    state.service.delete_raw_material(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restock_raw_material(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(input): ApiJson<RestockInput>,
) -> ApiResult<Json<RawMaterial>> {
    Ok(Json(state.service.restock_raw_material(&id, input).await?))
}

pub async fn import_raw_materials(
    State(state): State<AppState>,
    ApiJson(materials): ApiJson<Vec<RawMaterial>>,
) -> ApiResult<Json<Vec<RawMaterial>>> {
    Ok(Json(state.service.import_raw_materials(materials).await?))
}

pub async fn low_stock(State(state): State<AppState>) -> ApiResult<Json<Vec<RawMaterial>>> {
    Ok(Json(state.service.low_stock_materials().await?))
}

// Drinks and foods share handlers; the product type comes from the route group.

pub async fn list_products(
    State(state): State<AppState>,
    Extension(product_type): Extension<ProductType>,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.service.list_products(product_type).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Extension(product_type): Extension<ProductType>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.service.get_product(product_type, &id).await?))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(product_type): Extension<ProductType>,
    ApiJson(product): ApiJson<Product>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let created = state.service.create_product(product_type, product).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(product_type): Extension<ProductType>,
    ApiPath(id): ApiPath<String>,
    ApiJson(product): ApiJson<Product>,
) -> ApiResult<Json<Product>> {
    Ok(Json(
        state
            .service
            .update_product(product_type, &id, product)
            .await?,
    ))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Extension(product_type): Extension<ProductType>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    state.service.delete_product(product_type, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn import_products(
    State(state): State<AppState>,
    Extension(product_type): Extension<ProductType>,
    ApiJson(products): ApiJson<Vec<Product>>,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(
        state
            .service
            .import_products(product_type, products)
            .await?,
    ))
}

// Sales

pub async fn list_sales(State(state): State<AppState>) -> ApiResult<Json<Vec<Sale>>> {
    Ok(Json(state.service.list_sales().await?))
}

pub async fn get_sale(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Sale>> {
    Ok(Json(state.service.get_sale(&id).await?))
}

pub async fn record_sale(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewSale>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    let sale = state.service.record_sale(input).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

pub async fn delete_sale(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    state.service.delete_sale(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Operational costs

pub async fn list_operational_costs(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<OperationalCost>>> {
    Ok(Json(state.service.list_operational_costs().await?))
}

pub async fn create_operational_cost(
    State(state): State<AppState>,
    ApiJson(cost): ApiJson<OperationalCost>,
) -> ApiResult<(StatusCode, Json<OperationalCost>)> {
    let created = state.service.create_operational_cost(cost).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_operational_cost(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(cost): ApiJson<OperationalCost>,
) -> ApiResult<Json<OperationalCost>> {
    Ok(Json(state.service.update_operational_cost(&id, cost).await?))
}

pub async fn delete_operational_cost(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    state.service.delete_operational_cost(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Reports

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Defaults to the 30 days ending today.
pub async fn sales_summary(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> ApiResult<Json<SalesSummary>> {
    let range = DateRange::or_default(query.from, query.to, Utc::now().date_naive())
        .map_err(ServiceError::Validation)?;
    Ok(Json(state.service.summary_for(range).await?))
}

/// Any path no route matches.
pub async fn route_not_found(uri: Uri) -> ServiceError {
    ServiceError::not_found("Route", uri.path())
}
