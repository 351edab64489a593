//! HTTP API over [`CafeService`].
//!
//! # Endpoints
//!
//! - `GET /health`: Health check
//! - `GET /api/data`: The whole document
//! - `/api/raw-materials`, `/api/drinks`, `/api/foods`: list, create, and
//!   per-id get, update, delete, plus `POST .../import`
//! - `POST /api/raw-materials/{id}/restock`, `GET /api/raw-materials/low-stock`
//! - `/api/sales`: list, record, get, delete
//! - `/api/operational-costs`: list, create, update, delete
//! - `GET /api/reports/summary?from=YYYY-MM-DD&to=YYYY-MM-DD`
//!
//! Errors are returned as `{"message": "..."}`, including malformed
//! bodies, bad query strings and unknown routes.

mod error;
mod extract;
mod handlers;

pub use error::{ApiResult, ErrorBody};
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use handlers::HealthResponse;

use axum::routing::{get, post, put};
use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::models::ProductType;
use crate::service::CafeService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CafeService>,
}

fn product_routes(base: &str, product_type: ProductType) -> Router<AppState> {
    Router::new()
        .route(
            base,
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(&format!("{}/import", base), post(handlers::import_products))
        .route(
            &format!("{}/{{id}}", base),
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .layer(Extension(product_type))
}

pub fn router(service: Arc<CafeService>) -> Router {
    let state = AppState { service };

    let materials = Router::new()
        .route(
            "/api/raw-materials",
            get(handlers::list_raw_materials).post(handlers::create_raw_material),
        )
        .route("/api/raw-materials/import", post(handlers::import_raw_materials))
        .route("/api/raw-materials/low-stock", get(handlers::low_stock))
        .route(
            "/api/raw-materials/{id}",
            get(handlers::get_raw_material)
                .put(handlers::update_raw_material)
                .delete(handlers::delete_raw_material),
        )
        .route(
            "/api/raw-materials/{id}/restock",
            post(handlers::restock_raw_material),
        );

    let sales = Router::new()
        .route(
            "/api/sales",
            get(handlers::list_sales).post(handlers::record_sale),
        )
        .route(
            "/api/sales/{id}",
            get(handlers::get_sale).delete(handlers::delete_sale),
        );

    let costs = Router::new()
        .route(
            "/api/operational-costs",
            get(handlers::list_operational_costs).post(handlers::create_operational_cost),
        )
        .route(
            "/api/operational-costs/{id}",
            put(handlers::update_operational_cost).delete(handlers::delete_operational_cost),
        );

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/data", get(handlers::get_data))
        .route("/api/reports/summary", get(handlers::sales_summary))
        .merge(materials)
        .merge(product_routes("/api/drinks", ProductType::Drink))
        .merge(product_routes("/api/foods", ProductType::Food))
        .merge(sales)
        .merge(costs)
        .fallback(handlers::route_not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DbData, Product, RawMaterial, Sale};
    use crate::reports::SalesSummary;
    use crate::service::test_support;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        router(Arc::new(test_support::service()))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn parse<T: DeserializeOwned>(bytes: &[u8]) -> T {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        let health: HealthResponse = parse(&body);
        assert_eq!(health.status, "ok");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_get_data_returns_whole_document() {
        let (status, body) = send(&app(), Method::GET, "/api/data", None).await;
        assert_eq!(status, StatusCode::OK);
        let db: DbData = parse(&body);
        assert_eq!(db.raw_materials.len(), 5);
        assert_eq!(db.drinks.len(), 1);
        assert_eq!(db.foods.len(), 1);
    }

    #[tokio::test]
    async fn test_create_raw_material_returns_created() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/raw-materials",
            Some(json!({"name": "Sugar", "unit": "g", "costPerUnit": 15.0})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: RawMaterial = parse(&body);
        assert!(!created.id.is_empty());

        let uri = format!("/api/raw-materials/{}", created.id);
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse::<RawMaterial>(&body).name, "Sugar");
    }

    #[tokio::test]
    async fn test_unknown_raw_material_is_not_found() {
        let (status, body) = send(&app(), Method::GET, "/api/raw-materials/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let error: ErrorBody = parse(&body);
        assert!(error.message.contains("nope"));
    }

    #[tokio::test]
    async fn test_delete_raw_material_in_use_is_rejected() {
        let app = app();
        let (status, body) = send(&app, Method::DELETE, "/api/raw-materials/milk", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ErrorBody = parse(&body);
        assert!(error.message.contains("in use"));

        let (status, _) = send(&app, Method::DELETE, "/api/raw-materials/salt", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_update_raw_material_cascades_to_drinks() {
        let app = app();
        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/raw-materials/milk",
            Some(json!({"name": "Milk", "unit": "l", "costPerUnit": 2000.0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, Method::GET, "/api/drinks/latte", None).await;
        let latte: Product = parse(&body);
        assert!((latte.cost_price - 4000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_low_stock_route_is_not_an_id() {
        let app = app();
        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/raw-materials/milk",
            Some(json!({
                "name": "Milk",
                "unit": "l",
                "costPerUnit": 1000.0,
                "totalQuantity": 1.0,
                "lowStockThreshold": 2.0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::GET, "/api/raw-materials/low-stock", None).await;
        assert_eq!(status, StatusCode::OK);
        let low: Vec<RawMaterial> = parse(&body);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, "milk");
    }

    #[tokio::test]
    async fn test_drink_and_food_routes_are_separate() {
        let app = app();
        let (status, _) = send(&app, Method::GET, "/api/foods/latte", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/foods",
            Some(json!({
                "name": "Toast",
                "sellingPrice": 15000.0,
                "costPrice": 1.0,
                "ingredients": [{"rawMaterialId": "milk", "quantity": 0.05}]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let toast: Product = parse(&body);
        assert!((toast.cost_price - 50.0).abs() < 1e-9);

        let (_, body) = send(&app, Method::GET, "/api/drinks", None).await;
        assert_eq!(parse::<Vec<Product>>(&body).len(), 1);
        let (_, body) = send(&app, Method::GET, "/api/foods", None).await;
        assert_eq!(parse::<Vec<Product>>(&body).len(), 2);
    }

    #[tokio::test]
    async fn test_record_sale_then_product_cannot_be_deleted() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/sales",
            Some(json!({"productId": "latte", "productType": "drink", "quantity": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let sale: Sale = parse(&body);
        assert!((sale.total_sale_price - 50000.0).abs() < 1e-9);

        let (status, _) = send(&app, Method::DELETE, "/api/drinks/latte", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::DELETE, &format!("/api/sales/{}", sale.id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::DELETE, "/api/drinks/latte", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_sale_beyond_stock_is_rejected() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/sales",
            Some(json!({"productId": "latte", "productType": "drink", "quantity": 51})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ErrorBody = parse(&body);
        assert!(error.message.contains("Milk"));
    }

    #[tokio::test]
    async fn test_operational_cost_crud() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/operational-costs",
            Some(json!({
                "description": "Rent",
                "amount": 3000000.0,
                "date": "2024-05-01T00:00:00Z",
                "recurrence": "monthly"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: Value = parse(&body);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/operational-costs/{}", id),
            Some(json!({
                "description": "Rent",
                "amount": 3500000.0,
                "date": "2024-05-01T00:00:00Z",
                "recurrence": "monthly"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::DELETE, &format!("/api/operational-costs/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::DELETE, &format!("/api/operational-costs/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_summary_rejects_reversed_range() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::GET,
            "/api/reports/summary?from=2024-05-31&to=2024-05-01",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!parse::<ErrorBody>(&body).message.is_empty());

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/reports/summary?from=2024-05-01&to=2024-05-31",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let summary: SalesSummary = parse(&body);
        assert_eq!(summary.sale_count, 0);
    }

    #[tokio::test]
    async fn test_undeserializable_body_is_a_message() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/sales",
            Some(json!({"productId": "latte", "productType": "drink", "quantity": -1})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ErrorBody = parse(&body);
        assert!(error.message.contains("quantity"));
    }

    #[tokio::test]
    async fn test_unparseable_query_is_a_message() {
        let (status, body) = send(
            &app(),
            Method::GET,
            "/api/reports/summary?from=yesterday",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!parse::<ErrorBody>(&body).message.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_route_is_a_message() {
        let (status, body) = send(&app(), Method::GET, "/api/nothing-here", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let error: ErrorBody = parse(&body);
        assert!(error.message.contains("/api/nothing-here"));
    }

    #[tokio::test]
    async fn test_encoded_id_is_decoded() {
        let app = app();
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/raw-materials",
            Some(json!({"id": "cup/16oz", "name": "Cup 16oz", "unit": "pcs", "costPerUnit": 900.0})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, Method::GET, "/api/raw-materials/cup%2F16oz", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse::<RawMaterial>(&body).id, "cup/16oz");
    }
}
