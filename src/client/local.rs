use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

use super::{Backend, ClientResult};
use crate::models::{DbData, OperationalCost, Product, ProductType, RawMaterial, Sale};
use crate::reports::SalesSummary;
use crate::service::{CafeService, NewSale, RestockInput};

/// Runs operations in-process against a local repository.
#[derive(Clone)]
pub struct LocalBackend {
    service: Arc<CafeService>,
}

impl LocalBackend {
    pub fn new(service: Arc<CafeService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn fetch_all(&self) -> ClientResult<DbData> {
        Ok(self.service.snapshot().await?)
    }

    async fn create_raw_material(&self, material: RawMaterial) -> ClientResult<RawMaterial> {
        Ok(self.service.create_raw_material(material).await?)
    }

    async fn update_raw_material(&self, id: &str, material: RawMaterial) -> ClientResult<RawMaterial> {
        Ok(self.service.update_raw_material(id, material).await?)
    }

    async fn delete_raw_material(&self, id: &str) -> ClientResult<()> {
        Ok(self.service.delete_raw_material(id).await?)
    }

    async fn restock_raw_material(&self, id: &str, input: RestockInput) -> ClientResult<RawMaterial> {
        Ok(self.service.restock_raw_material(id, input).await?)
    }

    async fn import_raw_materials(&self, materials: Vec<RawMaterial>) -> ClientResult<Vec<RawMaterial>> {
        Ok(self.service.import_raw_materials(materials).await?)
    }

    async fn create_product(&self, product_type: ProductType, product: Product) -> ClientResult<Product> {
        Ok(self.service.create_product(product_type, product).await?)
    }

    async fn update_product(
        &self,
        product_type: ProductType,
        id: &str,
        product: Product,
    ) -> ClientResult<Product> {
        Ok(self.service.update_product(product_type, id, product).await?)
    }

    async fn delete_product(&self, product_type: ProductType, id: &str) -> ClientResult<()> {
        Ok(self.service.delete_product(product_type, id).await?)
    }

    async fn import_products(
        &self,
        product_type: ProductType,
        products: Vec<Product>,
    ) -> ClientResult<Vec<Product>> {
        Ok(self.service.import_products(product_type, products).await?)
    }

    async fn record_sale(&self, sale: NewSale) -> ClientResult<Sale> {
        Ok(self.service.record_sale(sale).await?)
    }

    async fn delete_sale(&self, id: &str) -> ClientResult<()> {
        Ok(self.service.delete_sale(id).await?)
    }

    async fn create_operational_cost(&self, cost: OperationalCost) -> ClientResult<OperationalCost> {
        Ok(self.service.create_operational_cost(cost).await?)
    }

    async fn update_operational_cost(
        &self,
        id: &str,
        cost: OperationalCost,
    ) -> ClientResult<OperationalCost> {
        Ok(self.service.update_operational_cost(id, cost).await?)
    }

    async fn delete_operational_cost(&self, id: &str) -> ClientResult<()> {
        Ok(self.service.delete_operational_cost(id).await?)
    }

    async fn sales_summary(&self, from: NaiveDate, to: NaiveDate) -> ClientResult<SalesSummary> {
        Ok(self.service.sales_summary(from, to).await?)
    }
}
