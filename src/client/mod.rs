//! Client side of the app: a [`Backend`] that performs operations either
//! in-process or against a running server, and a [`StateStore`] that keeps
//! the last fetched document for display.

mod http;
mod local;
mod store;

pub use http::HttpBackend;
pub use local::LocalBackend;
pub use store::StateStore;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{DbData, OperationalCost, Product, ProductType, RawMaterial, Sale};
use crate::reports::SalesSummary;
use crate::service::{NewSale, RestockInput, ServiceError};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned {status}: {message}")]
    Api { status: u16, message: String },
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Every operation a client can perform. Both implementations follow the
/// same rules; they differ only in where the document lives.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch_all(&self) -> ClientResult<DbData>;

    async fn create_raw_material(&self, material: RawMaterial) -> ClientResult<RawMaterial>;
    async fn update_raw_material(&self, id: &str, material: RawMaterial) -> ClientResult<RawMaterial>;
    async fn delete_raw_material(&self, id: &str) -> ClientResult<()>;
    async fn restock_raw_material(&self, id: &str, input: RestockInput) -> ClientResult<RawMaterial>;
    async fn import_raw_materials(&self, materials: Vec<RawMaterial>) -> ClientResult<Vec<RawMaterial>>;

    async fn create_product(&self, product_type: ProductType, product: Product) -> ClientResult<Product>;
    async fn update_product(
        &self,
        product_type: ProductType,
        id: &str,
        product: Product,
    ) -> ClientResult<Product>;
    async fn delete_product(&self, product_type: ProductType, id: &str) -> ClientResult<()>;
    async fn import_products(
        &self,
        product_type: ProductType,
        products: Vec<Product>,
    ) -> ClientResult<Vec<Product>>;

    async fn record_sale(&self, sale: NewSale) -> ClientResult<Sale>;
    async fn delete_sale(&self, id: &str) -> ClientResult<()>;

    async fn create_operational_cost(&self, cost: OperationalCost) -> ClientResult<OperationalCost>;
    async fn update_operational_cost(
        &self,
        id: &str,
        cost: OperationalCost,
    ) -> ClientResult<OperationalCost>;
    async fn delete_operational_cost(&self, id: &str) -> ClientResult<()>;

    async fn sales_summary(&self, from: NaiveDate, to: NaiveDate) -> ClientResult<SalesSummary>;
}
