use super::{ensure_id, require_name, require_non_negative, CafeService, ServiceError, ServiceResult};
use crate::models::OperationalCost;

const ENTITY: &str = "Operational cost";

fn validate(cost: &OperationalCost) -> ServiceResult<()> {
    require_name("Operational cost description", &cost.description)?;
    require_non_negative("amount", cost.amount)
}

impl CafeService {
    pub async fn list_operational_costs(&self) -> ServiceResult<Vec<OperationalCost>> {
        self.read(|db| Ok(db.operational_costs)).await
    }

    pub async fn create_operational_cost(
        &self,
        mut cost: OperationalCost,
    ) -> ServiceResult<OperationalCost> {
        validate(&cost)?;
        cost.description = cost.description.trim().to_string();
        ensure_id(&mut cost.id);

        let created = self
            .mutate(move |db| {
                if db.operational_costs.iter().any(|c| c.id == cost.id) {
                    return Err(ServiceError::validation(format!(
                        "Operational cost with id '{}' already exists",
                        cost.id
                    )));
                }
                db.operational_costs.push(cost.clone());
                Ok(cost)
            })
            .await?;

        tracing::info!(id = %created.id, amount = created.amount, "Created operational cost");
        Ok(created)
    }

    pub async fn update_operational_cost(
        &self,
        id: &str,
        mut cost: OperationalCost,
    ) -> ServiceResult<OperationalCost> {
        validate(&cost)?;
        cost.id = id.to_string();
        cost.description = cost.description.trim().to_string();

        let updated = self
            .mutate(move |db| {
                let existing = db
                    .operational_costs
                    .iter_mut()
                    .find(|c| c.id == cost.id)
                    .ok_or_else(|| ServiceError::not_found(ENTITY, &cost.id))?;
                *existing = cost.clone();
                Ok(cost)
            })
            .await?;

        tracing::info!(id = %updated.id, "Updated operational cost");
        Ok(updated)
    }

    pub async fn delete_operational_cost(&self, id: &str) -> ServiceResult<()> {
        let id = id.to_string();
        let removed = self
            .mutate(move |db| {
                let before = db.operational_costs.len();
                db.operational_costs.retain(|c| c.id != id);
                if db.operational_costs.len() == before {
                    return Err(ServiceError::not_found(ENTITY, &id));
                }
                Ok(id)
            })
            .await?;

        tracing::info!(id = %removed, "Deleted operational cost");
        Ok(())
    }
}
