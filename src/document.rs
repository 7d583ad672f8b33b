use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A document as submitted to the registry's `documents/create` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub participant_inn: String,
    pub doc_id: String,
    pub doc_status: String,
    pub doc_type: String,
    pub import_request: bool,
    pub owner_inn: String,
    pub producer_inn: String,
    pub production_date: NaiveDate, // serialized as YYYY-MM-DD
    pub production_type: String,
}

/// Status and raw body of the registry's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub status: u16,
    pub body: String,
}

impl SubmitResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
