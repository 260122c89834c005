// libs/dashboard-cell/src/services/readiness.rs
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use shared_api::{ApiError, RestClient};

use crate::models::{DashboardError, DoctorPricing, Readiness};

/// Checks whether a doctor can take paid consultations.
pub struct ReadinessService {
    client: Arc<RestClient>,
}

impl ReadinessService {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }

    pub async fn has_bank_account(&self, doctor_id: &str) -> Result<bool, DashboardError> {
        let accounts: Vec<Value> = self
            .client
            .get_collection(&format!("/doctor-bank-accounts/?doctor_id={}", doctor_id))
            .await?;
        Ok(!accounts.is_empty())
    }

    /// The pricing endpoint answers with a list, a paginated envelope or a
    /// single object depending on the backend version; the first row wins.
    pub async fn pricing(&self, doctor_id: &str) -> Result<Option<DoctorPricing>, DashboardError> {
        let path = format!("/doctor-pricing/?doctor_id={}", doctor_id);
        let raw: Value = self.client.get(&path).await?;

        let row = match raw {
            Value::Array(items) => items.into_iter().next(),
            Value::Object(mut object) => match object.remove("results") {
                Some(Value::Array(items)) => items.into_iter().next(),
                Some(_) => None,
                None => Some(Value::Object(object)),
            },
            _ => None,
        };

        let pricing = row
            .map(serde_json::from_value::<DoctorPricing>)
            .transpose()
            .map_err(|e| ApiError::Decode(format!("{}: {}", path, e)))?;
        Ok(pricing)
    }

    pub async fn check(&self, doctor_id: &str) -> Result<Readiness, DashboardError> {
        let (has_bank_account, pricing) =
            futures::try_join!(self.has_bank_account(doctor_id), self.pricing(doctor_id))?;
        let pricing = pricing.unwrap_or_default();

        let readiness = Readiness {
            has_bank_account,
            has_pricing: pricing.is_complete(),
            online_fee: pricing.online(),
            in_person_fee: pricing.in_person(),
        };
        debug!(?readiness, "Doctor {} readiness", doctor_id);
        Ok(readiness)
    }
}
