use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::{Backend, ClientError, ClientResult};
use crate::api::ErrorBody;
use crate::models::{DbData, OperationalCost, Product, ProductType, RawMaterial, Sale};
use crate::reports::SalesSummary;
use crate::service::{NewSale, RestockInput};

/// Talks to a `cafebook-server` over its JSON API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL of one record. Ids are opaque, so they are percent-encoded into a
    /// single path segment.
    fn resource(&self, collection: &str, id: &str) -> String {
        self.url(&format!("{}/{}", collection, urlencoding::encode(id)))
    }

    fn product_path(product_type: ProductType) -> &'static str {
        match product_type {
            ProductType::Drink => "/api/drinks",
            ProductType::Food => "/api/foods",
        }
    }

    async fn send(request: RequestBuilder) -> ClientResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.message)
            .unwrap_or(text);
        tracing::debug!(%status, %message, "Server rejected request");
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn json<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<T> {
        Ok(Self::send(request).await?.json().await?)
    }

    async fn empty(request: RequestBuilder) -> ClientResult<()> {
        Self::send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch_all(&self) -> ClientResult<DbData> {
        Self::json(self.client.get(self.url("/api/data"))).await
    }

    async fn create_raw_material(&self, material: RawMaterial) -> ClientResult<RawMaterial> {
        Self::json(self.client.post(self.url("/api/raw-materials")).json(&material)).await
    }

    async fn update_raw_material(&self, id: &str, material: RawMaterial) -> ClientResult<RawMaterial> {
        let url = self.resource("/api/raw-materials", id);
        Self::json(self.client.put(url).json(&material)).await
    }

    async fn delete_raw_material(&self, id: &str) -> ClientResult<()> {
        let url = self.resource("/api/raw-materials", id);
        Self::empty(self.client.delete(url)).await
    }

    async fn restock_raw_material(&self, id: &str, input: RestockInput) -> ClientResult<RawMaterial> {
        let url = format!("{}/restock", self.resource("/api/raw-materials", id));
        Self::json(self.client.post(url).json(&input)).await
    }

    async fn import_raw_materials(&self, materials: Vec<RawMaterial>) -> ClientResult<Vec<RawMaterial>> {
        let url = self.url("/api/raw-materials/import");
        Self::json(self.client.post(url).json(&materials)).await
    }

    async fn create_product(&self, product_type: ProductType, product: Product) -> ClientResult<Product> {
        let url = self.url(Self::product_path(product_type));
        Self::json(self.client.post(url).json(&product)).await
    }

    async fn update_product(
        &self,
        product_type: ProductType,
        id: &str,
        product: Product,
    ) -> ClientResult<Product> {
        let url = self.resource(Self::product_path(product_type), id);
        Self::json(self.client.put(url).json(&product)).await
    }

    async fn delete_product(&self, product_type: ProductType, id: &str) -> ClientResult<()> {
        let url = self.resource(Self::product_path(product_type), id);
        Self::empty(self.client.delete(url)).await
    }

    async fn import_products(
        &self,
        product_type: ProductType,
        products: Vec<Product>,
    ) -> ClientResult<Vec<Product>> {
        let url = self.url(&format!("{}/import", Self::product_path(product_type)));
        Self::json(self.client.post(url).json(&products)).await
    }

    async fn record_sale(&self, sale: NewSale) -> ClientResult<Sale> {
        Self::json(self.client.post(self.url("/api/sales")).json(&sale)).await
    }

    async fn delete_sale(&self, id: &str) -> ClientResult<()> {
        let url = self.resource("/api/sales", id);
        Self::empty(self.client.delete(url)).await
    }

    async fn create_operational_cost(&self, cost: OperationalCost) -> ClientResult<OperationalCost> {
        let url = self.url("/api/operational-costs");
        Self::json(self.client.post(url).json(&cost)).await
    }

    async fn update_operational_cost(
        &self,
        id: &str,
        cost: OperationalCost,
    ) -> ClientResult<OperationalCost> {
        let url = self.resource("/api/operational-costs", id);
        Self::json(self.client.put(url).json(&cost)).await
    }

    async fn delete_operational_cost(&self, id: &str) -> ClientResult<()> {
        let url = self.resource("/api/operational-costs", id);
        Self::empty(self.client.delete(url)).await
    }

    async fn sales_summary(&self, from: NaiveDate, to: NaiveDate) -> ClientResult<SalesSummary> {
        let request = self
            .client
            .get(self.url("/api/reports/summary"))
            .query(&[("from", from.to_string()), ("to", to.to_string())]);
        Self::json(request).await
    }
}
