//! Invoice handlers
//!
//! Every mutation goes through the domain service and, on success,
//! invalidates the worklist cache; the cache cannot learn about row
//! changes any other way.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use core_kernel::{InvoiceId, SessionContext};
use domain_invoicing::{
    AuditStatus, ErrorKind, IntakeDefaults, IntakeRow, InvoiceDraft, InvoiceError,
    InvoiceProjection, InvoiceStore, ListFilter,
};

use crate::auth::Claims;
use crate::dto::invoices::{
    BatchResponse, BulkImportRequest, CreateInvoiceRequest, CreatedResponse, FilingRequest,
    ReissueRequest, ReviewRequest, StatisticsResponse, UpdateInvoiceRequest, WorklistQuery,
};
use crate::error::ApiError;
use crate::AppState;

fn session(claims: &Claims) -> Result<SessionContext, ApiError> {
    claims.session_context().map_err(|_| ApiError::Unauthorized)
}

fn validated<T: Validate>(request: &T) -> Result<(), ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))
}

/// Creates a new invoice
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    validated(&request)?;
    let ctx = session(&claims)?;
    let draft = InvoiceDraft {
        invoice_number: request.invoice_number,
        service_area: request.service_area,
        biller: request.biller,
        payer: request.payer,
        generation_date: request.generation_date,
        soat_date: request.soat_date,
    };
    let id = state.service.create(&ctx, draft, Utc::now()).await?;
    state.cache.invalidate();
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse { id: *id.as_uuid() }),
    ))
}

/// Lists the worklist, sorted by urgency
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<WorklistQuery>,
) -> Result<Json<Vec<InvoiceProjection>>, ApiError> {
    let filter = ListFilter {
        term: query.term,
        field: query.field,
    };

    let records = match state.cache.get(&filter) {
        Some(records) => records,
        None => {
            let records = state
                .service
                .store()
                .list(&filter)
                .await
                .map_err(InvoiceError::from)?;
            state.cache.put(filter.clone(), records.clone());
            records
        }
    };

    Ok(Json(state.service.project_records(&records, Utc::now())))
}

/// Gets one invoice's worklist row
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceProjection>, ApiError> {
    let row = state
        .service
        .fetch_projection(InvoiceId::from_uuid(id), Utc::now())
        .await?;
    Ok(Json(row))
}

/// Updates an invoice's descriptive fields
pub async fn update_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateInvoiceRequest>,
) -> Result<StatusCode, ApiError> {
    validated(&request)?;
    let ctx = session(&claims)?.editing(InvoiceId::from_uuid(id));
    let draft = InvoiceDraft {
        invoice_number: request.invoice_number,
        service_area: request.service_area,
        biller: request.biller,
        payer: request.payer,
        generation_date: request.generation_date,
        soat_date: None,
    };
    state
        .service
        .update_details(&ctx, InvoiceId::from_uuid(id), draft, Utc::now())
        .await?;
    state.cache.invalidate();
    Ok(StatusCode::NO_CONTENT)
}

/// Records an audit review outcome
pub async fn review_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReviewRequest>,
) -> Result<StatusCode, ApiError> {
    let ctx = session(&claims)?;
    let status: AuditStatus = request.audit_status.parse()?;
    let error_kind: Option<ErrorKind> = request
        .error_kind
        .as_deref()
        .filter(|label| !label.is_empty())
        .map(str::parse)
        .transpose()?;
    state
        .service
        .review(
            &ctx,
            InvoiceId::from_uuid(id),
            status,
            request.observation,
            error_kind,
            Utc::now(),
        )
        .await?;
    state.cache.invalidate();
    Ok(StatusCode::NO_CONTENT)
}

/// Marks a returned invoice as corrected
pub async fn correct_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let ctx = session(&claims)?;
    state
        .service
        .mark_corrected(&ctx, InvoiceId::from_uuid(id), Utc::now())
        .await?;
    state.cache.invalidate();
    Ok(StatusCode::NO_CONTENT)
}

/// Records or clears filing-office delivery
pub async fn set_filing_delivery(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<FilingRequest>,
) -> Result<StatusCode, ApiError> {
    let ctx = session(&claims)?;
    state
        .service
        .set_filing_delivered(&ctx, InvoiceId::from_uuid(id), request.delivered, Utc::now())
        .await?;
    state.cache.invalidate();
    Ok(StatusCode::NO_CONTENT)
}

/// Re-issues an overdue invoice under a new number
pub async fn reissue_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReissueRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    validated(&request)?;
    let ctx = session(&claims)?.reissuing(InvoiceId::from_uuid(id));
    let new_id = state
        .service
        .reissue(
            &ctx,
            InvoiceId::from_uuid(id),
            &request.new_invoice_number,
            &request.new_generation_date,
            Utc::now(),
        )
        .await?;
    state.cache.invalidate();
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: *new_id.as_uuid(),
        }),
    ))
}

/// Marks an invoice for deletion (first phase)
pub async fn request_deletion(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let ctx = session(&claims)?;
    state
        .service
        .request_deletion(&ctx, InvoiceId::from_uuid(id), Utc::now())
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// Cancels a pending deletion mark
pub async fn cancel_deletion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.service.cancel_deletion(InvoiceId::from_uuid(id));
    Ok(StatusCode::NO_CONTENT)
}

/// Confirms a pending deletion and removes the row (second phase)
pub async fn confirm_deletion(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let ctx = session(&claims)?;
    state
        .service
        .confirm_deletion(&ctx, InvoiceId::from_uuid(id), Utc::now())
        .await?;
    state.cache.invalidate();
    Ok(StatusCode::NO_CONTENT)
}

/// Runs a bulk intake batch
pub async fn import_invoices(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<BulkImportRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    validated(&request)?;
    let ctx = session(&claims)?;

    let defaults = IntakeDefaults {
        biller: state.service.catalog().biller(&request.biller)?,
        payer: state.service.catalog().payer(&request.payer)?,
        service_area: request.service_area,
    };
    let rows: Vec<IntakeRow> = request
        .rows
        .into_iter()
        .map(|row| IntakeRow {
            invoice_number: row.invoice_number,
            generation_date: row.generation_date,
        })
        .collect();

    let outcome = state
        .service
        .import_batch(&ctx, &defaults, rows, Utc::now())
        .await?;
    state.cache.invalidate();
    Ok(Json(outcome.into()))
}

/// Global statistics for the dashboard
pub async fn statistics(
    State(state): State<AppState>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let summary = state.service.summary().await?;
    let pending_by_group = state.service.pending_groups().await?;
    Ok(Json(StatisticsResponse {
        summary,
        pending_by_group,
    }))
}
