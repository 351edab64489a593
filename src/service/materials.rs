use serde::{Deserialize, Serialize};

use super::{ensure_id, require_name, require_non_negative, CafeService, ServiceError, ServiceResult};
use crate::logic::{is_raw_material_referenced, recalculate_dependent_product_costs, restock};
use crate::models::{DbData, RawMaterial};

const ENTITY: &str = "Raw material";

/// A purchase of more stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestockInput {
    pub quantity: f64,
    /// Total paid for `quantity`.
    pub cost: f64,
}

fn validate(material: &RawMaterial) -> ServiceResult<()> {
    require_name(ENTITY, &material.name)?;
    require_non_negative("costPerUnit", material.cost_per_unit)?;
    if let Some(quantity) = material.total_quantity {
        require_non_negative("totalQuantity", quantity)?;
    }
    if let Some(cost) = material.total_cost {
        require_non_negative("totalCost", cost)?;
    }
    if let Some(price) = material.selling_price {
        require_non_negative("sellingPrice", price)?;
    }
    if let Some(threshold) = material.low_stock_threshold {
        require_non_negative("lowStockThreshold", threshold)?;
    }
    Ok(())
}

fn normalize(material: &mut RawMaterial) {
    material.name = material.name.trim().to_string();
    if let (Some(quantity), None) = (material.total_quantity, material.total_cost) {
        material.total_cost = Some(quantity * material.cost_per_unit);
    }
}

/// Stores `material` over the record with the same id (or appends it) and
/// cascades to products when the unit cost moved. A repriced stock is valued
/// at the new unit cost, so later restocks average against it.
fn upsert(db: &mut DbData, mut material: RawMaterial) -> RawMaterial {
    let id = material.id.clone();
    let repriced = db
        .raw_material(&id)
        .is_some_and(|existing| existing.cost_per_unit != material.cost_per_unit);
    if let (true, Some(quantity)) = (repriced, material.total_quantity) {
        material.total_cost = Some(quantity * material.cost_per_unit);
    }

    match db.raw_material_mut(&id) {
        Some(existing) => *existing = material.clone(),
        None => db.raw_materials.push(material.clone()),
    }
    if repriced {
        recalculate_dependent_product_costs(db, &id);
    }
    material
}

impl CafeService {
    pub async fn list_raw_materials(&self) -> ServiceResult<Vec<RawMaterial>> {
        self.read(|db| Ok(db.raw_materials)).await
    }

    pub async fn get_raw_material(&self, id: &str) -> ServiceResult<RawMaterial> {
        self.read(|db| {
            db.raw_material(id)
                .cloned()
                .ok_or_else(|| ServiceError::not_found(ENTITY, id))
        })
        .await
    }

    pub async fn create_raw_material(&self, mut material: RawMaterial) -> ServiceResult<RawMaterial> {
        validate(&material)?;
        normalize(&mut material);
        ensure_id(&mut material.id);

        let created = self
            .mutate(move |db| {
                if db.raw_material(&material.id).is_some() {
                    return Err(ServiceError::validation(format!(
                        "Raw material with id '{}' already exists",
                        material.id
                    )));
                }
                db.raw_materials.push(material.clone());
                Ok(material)
            })
            .await?;

        tracing::info!(id = %created.id, name = %created.name, "Created raw material");
        Ok(created)
    }

    /// Replaces a raw material. Products using it get a fresh cost price only
    /// when `cost_per_unit` actually changed.
    pub async fn update_raw_material(
        &self,
        id: &str,
        mut material: RawMaterial,
    ) -> ServiceResult<RawMaterial> {
        validate(&material)?;
        normalize(&mut material);
        material.id = id.to_string();

        let updated = self
            .mutate(move |db| {
                if db.raw_material(&material.id).is_none() {
                    return Err(ServiceError::not_found(ENTITY, &material.id));
                }
                Ok(upsert(db, material))
            })
            .await?;

        tracing::info!(id = %updated.id, "Updated raw material");
        Ok(updated)
    }

    pub async fn restock_raw_material(
        &self,
        id: &str,
        input: RestockInput,
    ) -> ServiceResult<RawMaterial> {
        if !input.quantity.is_finite() || input.quantity <= 0.0 {
            return Err(ServiceError::validation(
                "Restock quantity must be a positive number",
            ));
        }
        require_non_negative("cost", input.cost)?;

        let id = id.to_string();
        let restocked = self
            .mutate(move |db| {
                let material = db
                    .raw_material_mut(&id)
                    .ok_or_else(|| ServiceError::not_found(ENTITY, &id))?;
                let cost_changed = restock(material, input.quantity, input.cost);
                let material = material.clone();
                if cost_changed {
                    recalculate_dependent_product_costs(db, &id);
                }
                Ok(material)
            })
            .await?;

        tracing::info!(
            id = %restocked.id,
            quantity = input.quantity,
            cost_per_unit = restocked.cost_per_unit,
            "Restocked raw material"
        );
        Ok(restocked)
    }

    /// Deletes a raw material unless a recipe, packaging option or topping
    /// list still refers to it.
    pub async fn delete_raw_material(&self, id: &str) -> ServiceResult<()> {
        let id = id.to_string();
        let removed = self
            .mutate(move |db| {
                let material = db
                    .raw_material(&id)
                    .ok_or_else(|| ServiceError::not_found(ENTITY, &id))?;
                if is_raw_material_referenced(db, &id) {
                    return Err(ServiceError::InUse(format!(
                        "Raw material '{}' is in use by one or more products and cannot be deleted",
                        material.name
                    )));
                }
                db.raw_materials.retain(|m| m.id != id);
                Ok(id)
            })
            .await?;

        tracing::info!(id = %removed, "Deleted raw material");
        Ok(())
    }

    /// Upserts a batch by id. The batch is validated up front and written in
    /// one go.
    pub async fn import_raw_materials(
        &self,
        materials: Vec<RawMaterial>,
    ) -> ServiceResult<Vec<RawMaterial>> {
        let mut materials = materials;
        for material in &mut materials {
            validate(material)?;
            normalize(material);
            ensure_id(&mut material.id);
        }

        let imported = self
            .mutate(move |db| {
                Ok(materials
                    .into_iter()
                    .map(|material| upsert(db, material))
                    .collect::<Vec<_>>())
            })
            .await?;

        tracing::info!(count = imported.len(), "Imported raw materials");
        Ok(imported)
    }
}
