use chrono::NaiveDate;
use std::sync::Arc;

use super::{Backend, ClientResult};
use crate::models::{DbData, OperationalCost, Product, ProductType, RawMaterial, Sale};
use crate::reports::SalesSummary;
use crate::service::{NewSale, RestockInput};

/// The client's view of the document.
///
/// Every successful mutation is followed by a full refetch, so the snapshot
/// always reflects what the backend stored (including cost cascades and
/// stock deductions the caller did not perform itself).
pub struct StateStore {
    backend: Arc<dyn Backend>,
    data: DbData,
}

impl StateStore {
    pub async fn load(backend: Arc<dyn Backend>) -> ClientResult<Self> {
        let data = backend.fetch_all().await?;
        Ok(Self { backend, data })
    }

    pub async fn refresh(&mut self) -> ClientResult<()> {
        self.data = self.backend.fetch_all().await?;
        tracing::debug!(
            raw_materials = self.data.raw_materials.len(),
            sales = self.data.sales.len(),
            "Refreshed state"
        );
        Ok(())
    }

    pub fn data(&self) -> &DbData {
        &self.data
    }

    pub fn raw_materials(&self) -> &[RawMaterial] {
        &self.data.raw_materials
    }

    pub fn products(&self, product_type: ProductType) -> &[Product] {
        self.data.products(product_type)
    }

    pub fn sales(&self) -> &[Sale] {
        &self.data.sales
    }

    pub fn operational_costs(&self) -> &[OperationalCost] {
        &self.data.operational_costs
    }

    async fn after<T>(&mut self, result: ClientResult<T>) -> ClientResult<T> {
        let value = result?;
        self.refresh().await?;
        Ok(value)
    }

    pub async fn create_raw_material(&mut self, material: RawMaterial) -> ClientResult<RawMaterial> {
        let result = self.backend.create_raw_material(material).await;
        self.after(result).await
    }

    pub async fn update_raw_material(
        &mut self,
        id: &str,
        material: RawMaterial,
    ) -> ClientResult<RawMaterial> {
        let result = self.backend.update_raw_material(id, material).await;
        self.after(result).await
    }

    pub async fn delete_raw_material(&mut self, id: &str) -> ClientResult<()> {
        let result = self.backend.delete_raw_material(id).await;
        self.after(result).await
    }

    pub async fn restock_raw_material(
        &mut self,
        id: &str,
        input: RestockInput,
    ) -> ClientResult<RawMaterial> {
        let result = self.backend.restock_raw_material(id, input).await;
        self.after(result).await
    }

    pub async fn import_raw_materials(
        &mut self,
        materials: Vec<RawMaterial>,
    ) -> ClientResult<Vec<RawMaterial>> {
        let result = self.backend.import_raw_materials(materials).await;
        self.after(result).await
    }

    pub async fn create_product(
        &mut self,
        product_type: ProductType,
        product: Product,
    ) -> ClientResult<Product> {
        let result = self.backend.create_product(product_type, product).await;
        self.after(result).await
    }

    pub async fn update_product(
        &mut self,
        product_type: ProductType,
        id: &str,
        product: Product,
    ) -> ClientResult<Product> {
        let result = self.backend.update_product(product_type, id, product).await;
        self.after(result).await
    }

    pub async fn delete_product(&mut self, product_type: ProductType, id: &str) -> ClientResult<()> {
        let result = self.backend.delete_product(product_type, id).await;
        self.after(result).await
    }

    pub async fn import_products(
        &mut self,
        product_type: ProductType,
        products: Vec<Product>,
    ) -> ClientResult<Vec<Product>> {
        let result = self.backend.import_products(product_type, products).await;
        self.after(result).await
    }

    pub async fn record_sale(&mut self, sale: NewSale) -> ClientResult<Sale> {
        let result = self.backend.record_sale(sale).await;
        self.after(result).await
    }

    pub async fn delete_sale(&mut self, id: &str) -> ClientResult<()> {
        let result = self.backend.delete_sale(id).await;
        self.after(result).await
    }

    pub async fn create_operational_cost(
        &mut self,
        cost: OperationalCost,
    ) -> ClientResult<OperationalCost> {
        let result = self.backend.create_operational_cost(cost).await;
        self.after(result).await
    }

    pub async fn update_operational_cost(
        &mut self,
        id: &str,
        cost: OperationalCost,
    ) -> ClientResult<OperationalCost> {
        let result = self.backend.update_operational_cost(id, cost).await;
        self.after(result).await
    }

    pub async fn delete_operational_cost(&mut self, id: &str) -> ClientResult<()> {
        let result = self.backend.delete_operational_cost(id).await;
        self.after(result).await
    }

    /// Reports are computed by the backend and do not touch the snapshot.
    pub async fn sales_summary(&self, from: NaiveDate, to: NaiveDate) -> ClientResult<SalesSummary> {
        self.backend.sales_summary(from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, LocalBackend};
    use crate::models::Recurrence;
    use crate::service::{test_support, ServiceError};

    async fn store() -> StateStore {
        let backend = LocalBackend::new(Arc::new(test_support::service()));
        StateStore::load(Arc::new(backend)).await.unwrap()
    }

    #[tokio::test]
    async fn test_load_fetches_document() {
        let store = store().await;
        assert_eq!(store.raw_materials().len(), 5);
        assert_eq!(store.products(ProductType::Drink).len(), 1);
        assert_eq!(store.products(ProductType::Food).len(), 1);
        assert!(store.sales().is_empty());
    }

    #[tokio::test]
    async fn test_sale_refreshes_stock() {
        let mut store = store().await;
        store
            .record_sale(NewSale::new("latte", ProductType::Drink, 5))
            .await
            .unwrap();

        assert_eq!(store.sales().len(), 1);
        let milk = store.data().raw_material("milk").unwrap();
        assert!((milk.total_quantity.unwrap() - 9.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_material_update_refreshes_product_costs() {
        let mut store = store().await;
        let mut beans = store.data().raw_material("beans").unwrap().clone();
        beans.cost_per_unit = 100.0;
        store.update_raw_material("beans", beans).await.unwrap();

        let latte = store.data().product(ProductType::Drink, "latte").unwrap();
        assert!((latte.cost_price - 2000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_snapshot() {
        let mut store = store().await;
        let err = store.delete_raw_material("milk").await.unwrap_err();
        assert!(matches!(err, ClientError::Service(ServiceError::InUse(_))));
        assert_eq!(store.raw_materials().len(), 5);
    }

    #[tokio::test]
    async fn test_operational_cost_roundtrip() {
        let mut store = store().await;
        let cost = store
            .create_operational_cost(OperationalCost::new("Electricity", 750000.0, Recurrence::Monthly))
            .await
            .unwrap();
        assert_eq!(store.operational_costs().len(), 1);

        store.delete_operational_cost(&cost.id).await.unwrap();
        assert!(store.operational_costs().is_empty());
    }
}
