//! Invoice repository implementation
//!
//! Database access for invoice rows and their SOAT sidecars. The
//! repository implements the domain's storage port: business-key
//! uniqueness is a database constraint (closing the check-then-insert
//! race), and the reissue pair is written in one transaction.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use async_trait::async_trait;
use core_kernel::{InvoiceId, SoatDetailId};
use domain_invoicing::{
    AuditStatus, Biller, BusinessKey, ChainContext, ErrorKind, Invoice, InvoiceNumber,
    InvoiceRecord, InvoiceStore, LifecycleStatus, ListFilter, Payer, PendingGroupCount,
    SearchField, ServiceArea, SoatDetail, StoreError, SummaryCounts,
};

use crate::error::{classify_sqlx_error, DatabaseError};

/// Repository for invoice rows and SOAT sidecars
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

/// Columns selected for every invoice read, including the SOAT sidecar
/// and the self-join back to the replaced original
const SELECT_COLUMNS: &str = r#"
    SELECT
        f.id, f.invoice_number, f.service_area, f.biller, f.payer,
        f.generation_date, f.delivered_at, f.lifecycle, f.audit_status,
        f.audit_observation, f.error_kind, f.original_invoice_id,
        f.replaced_by_number, f.replacement_date, f.filing_delivered_at,
        f.created_at, f.updated_at,
        s.id AS soat_detail_id, s.generation_date AS soat_generation_date,
        o.invoice_number AS original_number,
        o.generation_date AS original_generation_date
    FROM invoices f
    LEFT JOIN soat_details s ON s.invoice_id = f.id
    LEFT JOIN invoices o ON f.original_invoice_id = o.id
"#;

impl InvoiceRepository {
    /// Creates a new InvoiceRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the tables and the composite unique business key
    ///
    /// Idempotent; the schema is bootstrapped on startup.
    pub async fn init_schema(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS invoices (
                id UUID PRIMARY KEY,
                invoice_number TEXT NOT NULL,
                service_area TEXT NOT NULL,
                biller TEXT NOT NULL,
                payer TEXT NOT NULL,
                generation_date DATE NOT NULL,
                delivered_at TIMESTAMPTZ NOT NULL,
                lifecycle TEXT NOT NULL DEFAULT 'Activa',
                audit_status TEXT NOT NULL DEFAULT 'Pendiente',
                audit_observation TEXT,
                error_kind TEXT,
                original_invoice_id UUID REFERENCES invoices(id),
                replaced_by_number TEXT,
                replacement_date DATE,
                filing_delivered_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                CONSTRAINT invoices_business_key
                    UNIQUE (invoice_number, biller, payer, service_area)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(classify_sqlx_error)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS soat_details (
                id UUID PRIMARY KEY,
                invoice_id UUID NOT NULL UNIQUE REFERENCES invoices(id) ON DELETE CASCADE,
                generation_date DATE NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(classify_sqlx_error)?;

        Ok(())
    }

    async fn insert_invoice_tx(
        tx: &mut Transaction<'_, Postgres>,
        invoice: &Invoice,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number, service_area, biller, payer,
                generation_date, delivered_at, lifecycle, audit_status,
                audit_observation, error_kind, original_invoice_id,
                replaced_by_number, replacement_date, filing_delivered_at,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(invoice.number.as_str())
        .bind(invoice.service_area.label())
        .bind(invoice.biller.as_str())
        .bind(invoice.payer.as_str())
        .bind(invoice.generation_date)
        .bind(invoice.delivered_at)
        .bind(invoice.lifecycle.label())
        .bind(invoice.audit_status.label())
        .bind(invoice.audit_observation.as_deref())
        .bind(invoice.error_kind.map(|kind| kind.label()))
        .bind(invoice.original_invoice_id.map(|id| *id.as_uuid()))
        .bind(invoice.replaced_by_number.as_ref().map(|n| n.as_str()))
        .bind(invoice.replacement_date)
        .bind(invoice.filing_delivered_at)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(classify_sqlx_error)?;

        if let Some(detail) = &invoice.soat_detail {
            sqlx::query(
                r#"
                INSERT INTO soat_details (id, invoice_id, generation_date)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(detail.id.as_uuid())
            .bind(invoice.id.as_uuid())
            .bind(detail.generation_date)
            .execute(&mut **tx)
            .await
            .map_err(classify_sqlx_error)?;
        }

        Ok(())
    }

    async fn update_invoice_tx(
        tx: &mut Transaction<'_, Postgres>,
        invoice: &Invoice,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices SET
                invoice_number = $2, service_area = $3, biller = $4, payer = $5,
                generation_date = $6, delivered_at = $7, lifecycle = $8,
                audit_status = $9, audit_observation = $10, error_kind = $11,
                original_invoice_id = $12, replaced_by_number = $13,
                replacement_date = $14, filing_delivered_at = $15, updated_at = $16
            WHERE id = $1
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(invoice.number.as_str())
        .bind(invoice.service_area.label())
        .bind(invoice.biller.as_str())
        .bind(invoice.payer.as_str())
        .bind(invoice.generation_date)
        .bind(invoice.delivered_at)
        .bind(invoice.lifecycle.label())
        .bind(invoice.audit_status.label())
        .bind(invoice.audit_observation.as_deref())
        .bind(invoice.error_kind.map(|kind| kind.label()))
        .bind(invoice.original_invoice_id.map(|id| *id.as_uuid()))
        .bind(invoice.replaced_by_number.as_ref().map(|n| n.as_str()))
        .bind(invoice.replacement_date)
        .bind(invoice.filing_delivered_at)
        .bind(invoice.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(classify_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Invoice", invoice.id));
        }
        Ok(())
    }

    /// Maps the search field onto its column; the whitelist keeps user
    /// input out of the SQL text
    fn search_column(field: SearchField) -> &'static str {
        match field {
            SearchField::InvoiceNumber => "f.invoice_number",
            SearchField::Biller => "f.biller",
            SearchField::Payer => "f.payer",
            SearchField::ServiceArea => "f.service_area",
            SearchField::AuditStatus => "f.audit_status",
        }
    }
}

/// Rehydrates a database row into the domain aggregate plus chain context
fn record_from_row(row: &sqlx::postgres::PgRow) -> Result<InvoiceRecord, DatabaseError> {
    let parse = |what: &str, err: domain_invoicing::InvoiceError| {
        DatabaseError::SerializationError(format!("{}: {}", what, err))
    };

    let id: Uuid = row.try_get("id")?;
    let number_raw: String = row.try_get("invoice_number")?;
    let service_area_raw: String = row.try_get("service_area")?;
    let biller: String = row.try_get("biller")?;
    let payer: String = row.try_get("payer")?;
    let generation_date: NaiveDate = row.try_get("generation_date")?;
    let delivered_at: DateTime<Utc> = row.try_get("delivered_at")?;
    let lifecycle_raw: String = row.try_get("lifecycle")?;
    let audit_status_raw: String = row.try_get("audit_status")?;
    let audit_observation: Option<String> = row.try_get("audit_observation")?;
    let error_kind_raw: Option<String> = row.try_get("error_kind")?;
    let original_invoice_id: Option<Uuid> = row.try_get("original_invoice_id")?;
    let replaced_by_raw: Option<String> = row.try_get("replaced_by_number")?;
    let replacement_date: Option<NaiveDate> = row.try_get("replacement_date")?;
    let filing_delivered_at: Option<DateTime<Utc>> = row.try_get("filing_delivered_at")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
    let soat_detail_id: Option<Uuid> = row.try_get("soat_detail_id")?;
    let soat_generation_date: Option<NaiveDate> = row.try_get("soat_generation_date")?;
    let original_number_raw: Option<String> = row.try_get("original_number")?;
    let original_generation_date: Option<NaiveDate> = row.try_get("original_generation_date")?;

    let invoice = Invoice {
        id: InvoiceId::from_uuid(id),
        number: InvoiceNumber::new(&number_raw).map_err(|e| parse("invoice_number", e))?,
        service_area: ServiceArea::from_str(&service_area_raw)
            .map_err(|e| parse("service_area", e))?,
        biller: Biller::from_trusted(biller),
        payer: Payer::from_trusted(payer),
        generation_date,
        delivered_at,
        lifecycle: LifecycleStatus::from_str(&lifecycle_raw).map_err(|e| parse("lifecycle", e))?,
        audit_status: AuditStatus::from_str(&audit_status_raw)
            .map_err(|e| parse("audit_status", e))?,
        audit_observation,
        error_kind: error_kind_raw
            .as_deref()
            .map(ErrorKind::from_str)
            .transpose()
            .map_err(|e| parse("error_kind", e))?,
        original_invoice_id: original_invoice_id.map(InvoiceId::from_uuid),
        replaced_by_number: replaced_by_raw
            .map(InvoiceNumber::new)
            .transpose()
            .map_err(|e| parse("replaced_by_number", e))?,
        replacement_date,
        filing_delivered_at,
        soat_detail: match (soat_detail_id, soat_generation_date) {
            (Some(detail_id), Some(date)) => Some(SoatDetail {
                id: SoatDetailId::from_uuid(detail_id),
                generation_date: date,
            }),
            _ => None,
        },
        created_at,
        updated_at,
    };

    let chain = ChainContext {
        original_number: original_number_raw
            .map(InvoiceNumber::new)
            .transpose()
            .map_err(|e| parse("original_number", e))?,
        original_generation_date,
    };

    Ok(InvoiceRecord { invoice, chain })
}

#[async_trait]
impl InvoiceStore for InvoiceRepository {
    async fn insert(&self, invoice: &Invoice) -> Result<InvoiceId, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::insert_invoice_tx(&mut tx, invoice)
            .await
            .map_err(StoreError::from)?;
        tx.commit()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(invoice.id)
    }

    async fn fetch(&self, id: InvoiceId) -> Result<Option<InvoiceRecord>, StoreError> {
        let query = format!("{} WHERE f.id = $1", SELECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::from(classify_sqlx_error(e)))?;
        row.as_ref()
            .map(record_from_row)
            .transpose()
            .map_err(StoreError::from)
    }

    async fn update(&self, invoice: &Invoice) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::update_invoice_tx(&mut tx, invoice)
            .await
            .map_err(StoreError::from)?;
        tx.commit()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, id: InvoiceId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from(classify_sqlx_error(e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<InvoiceRecord>, StoreError> {
        let rows = match (&filter.term, filter.field) {
            (Some(term), Some(field)) => {
                let query = format!(
                    "{} WHERE {} ILIKE $1 ORDER BY f.created_at DESC",
                    SELECT_COLUMNS,
                    Self::search_column(field)
                );
                sqlx::query(&query)
                    .bind(format!("%{}%", term))
                    .fetch_all(&self.pool)
                    .await
            }
            _ => {
                let query = format!("{} ORDER BY f.created_at DESC", SELECT_COLUMNS);
                sqlx::query(&query).fetch_all(&self.pool).await
            }
        }
        .map_err(|e| StoreError::from(classify_sqlx_error(e)))?;

        rows.iter()
            .map(|row| record_from_row(row).map_err(StoreError::from))
            .collect()
    }

    async fn key_in_use(
        &self,
        key: &BusinessKey,
        exclude: Option<InvoiceId>,
    ) -> Result<bool, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM invoices
                WHERE invoice_number = $1 AND biller = $2 AND payer = $3
                  AND service_area = $4
                  AND ($5::uuid IS NULL OR id != $5)
            ) AS taken
            "#,
        )
        .bind(key.number.as_str())
        .bind(key.biller.as_str())
        .bind(key.payer.as_str())
        .bind(key.service_area.label())
        .bind(exclude.map(|id| *id.as_uuid()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from(classify_sqlx_error(e)))?;

        let taken: bool = row
            .try_get("taken")
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(taken)
    }

    async fn insert_replacement(
        &self,
        superseded: &Invoice,
        replacement: &Invoice,
    ) -> Result<InvoiceId, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::update_invoice_tx(&mut tx, superseded)
            .await
            .map_err(StoreError::from)?;
        Self::insert_invoice_tx(&mut tx, replacement)
            .await
            .map_err(StoreError::from)?;
        tx.commit()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(replacement.id)
    }

    async fn summary(&self) -> Result<SummaryCounts, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE audit_status = 'Pendiente') AS pending,
                COUNT(*) FILTER (WHERE audit_status = 'Lista para Radicar') AS ready_to_file,
                COUNT(*) FILTER (
                    WHERE audit_status IN ('Devuelta por Auditor', 'Corregida por Legalizador')
                ) AS returned_or_corrected
            FROM invoices
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from(classify_sqlx_error(e)))?;

        let get = |name: &str| -> Result<u64, StoreError> {
            let value: i64 = row
                .try_get(name)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            Ok(value as u64)
        };

        Ok(SummaryCounts {
            total: get("total")?,
            pending: get("pending")?,
            ready_to_file: get("ready_to_file")?,
            returned_or_corrected: get("returned_or_corrected")?,
        })
    }

    async fn pending_by_biller_and_payer(&self) -> Result<Vec<PendingGroupCount>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT biller, payer, COUNT(*) AS pending
            FROM invoices
            WHERE audit_status = 'Pendiente'
            GROUP BY biller, payer
            ORDER BY biller, payer
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::from(classify_sqlx_error(e)))?;

        rows.iter()
            .map(|row| {
                let biller: String = row.try_get("biller")?;
                let payer: String = row.try_get("payer")?;
                let count: i64 = row.try_get("pending")?;
                Ok(PendingGroupCount {
                    biller,
                    payer,
                    count: count as u64,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}
