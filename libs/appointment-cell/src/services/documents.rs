// libs/appointment-cell/src/services/documents.rs
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use shared_api::{ApiError, RestClient};

use crate::models::PatientDocument;

#[async_trait]
pub trait DocumentApi: Send + Sync {
    async fn list_for_patient(&self, patient_id: &str) -> Result<Vec<PatientDocument>, ApiError>;
}

pub struct DocumentService {
    client: Arc<RestClient>,
}

impl DocumentService {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentApi for DocumentService {
    async fn list_for_patient(&self, patient_id: &str) -> Result<Vec<PatientDocument>, ApiError> {
        let documents: Vec<PatientDocument> = self
            .client
            .get_collection(&format!("/patients/{}/documents/", patient_id))
            .await?;
        debug!("Patient {} has {} documents", patient_id, documents.len());
        Ok(documents)
    }
}
