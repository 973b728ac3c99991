//! Invoice DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_invoicing::{
    BatchOutcome, PendingGroupCount, SearchField, ServiceArea, SummaryCounts,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    #[validate(length(min = 1))]
    pub invoice_number: String,
    pub service_area: ServiceArea,
    #[validate(length(min = 1))]
    pub biller: String,
    #[validate(length(min = 1))]
    pub payer: String,
    /// `YYYY-MM-DD` or `DD/MM/YYYY`
    #[validate(length(min = 1))]
    pub generation_date: String,
    /// SOAT form date, when it differs from the generation date
    pub soat_date: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateInvoiceRequest {
    #[validate(length(min = 1))]
    pub invoice_number: String,
    pub service_area: ServiceArea,
    #[validate(length(min = 1))]
    pub biller: String,
    #[validate(length(min = 1))]
    pub payer: String,
    #[validate(length(min = 1))]
    pub generation_date: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    /// Audit status label, e.g. "Devuelta por Auditor"
    pub audit_status: String,
    pub observation: Option<String>,
    /// Error kind label, mandatory when returning
    pub error_kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FilingRequest {
    pub delivered: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReissueRequest {
    #[validate(length(min = 1))]
    pub new_invoice_number: String,
    /// `YYYY-MM-DD` or `DD/MM/YYYY`
    #[validate(length(min = 1))]
    pub new_generation_date: String,
}

#[derive(Debug, Deserialize)]
pub struct WorklistQuery {
    pub term: Option<String>,
    pub field: Option<SearchField>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkImportRequest {
    #[validate(length(min = 1))]
    pub biller: String,
    #[validate(length(min = 1))]
    pub payer: String,
    pub service_area: ServiceArea,
    pub rows: Vec<BulkImportRow>,
}

#[derive(Debug, Deserialize)]
pub struct BulkImportRow {
    pub invoice_number: String,
    pub generation_date: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub total_rows: usize,
    pub inserted: usize,
    pub skipped: usize,
}

impl From<BatchOutcome> for BatchResponse {
    fn from(outcome: BatchOutcome) -> Self {
        Self {
            total_rows: outcome.total_rows,
            inserted: outcome.inserted,
            skipped: outcome.skipped,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub summary: SummaryCounts,
    pub pending_by_group: Vec<PendingGroupCount>,
}
