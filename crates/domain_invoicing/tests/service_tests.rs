//! End-to-end tests for the invoicing service over the in-memory store

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use core_kernel::{BusinessCalendar, DeadlineEngine, Role, SessionContext};
use domain_invoicing::{
    AuditStatus, ErrorKind, IntakeDefaults, IntakeRow, InvoiceDraft, InvoiceError, InvoiceService,
    InvoiceStore, ListFilter, MemoryInvoiceStore, RemainingDisplay, ServiceArea,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_hms_opt(10, 0, 0).unwrap())
}

fn service() -> InvoiceService<MemoryInvoiceStore> {
    InvoiceService::new(
        MemoryInvoiceStore::new(),
        DeadlineEngine::new(BusinessCalendar::new()),
    )
}

fn clerk() -> SessionContext {
    SessionContext::new("ana", Role::Legalizador)
}

fn auditor() -> SessionContext {
    SessionContext::new("carlos", Role::Auditor)
}

fn draft(number: &str, generation_date: &str) -> InvoiceDraft {
    InvoiceDraft {
        invoice_number: number.to_string(),
        service_area: ServiceArea::Outpatient,
        biller: "OSCAR MAYA".to_string(),
        payer: "SURA".to_string(),
        generation_date: generation_date.to_string(),
        soat_date: None,
    }
}

mod creation {
    use super::*;

    #[tokio::test]
    async fn test_create_and_fetch() {
        let service = service();
        let now = at(date(2025, 6, 10));
        let id = service.create(&clerk(), draft("1001", "2025-06-02"), now).await.unwrap();

        let row = service.fetch_projection(id, now).await.unwrap();
        assert_eq!(row.invoice_number.as_str(), "1001");
        assert_eq!(row.audit_status, AuditStatus::Pending);
    }

    #[tokio::test]
    async fn test_duplicate_number_is_rejected_and_nothing_written() {
        let service = service();
        let now = at(date(2025, 6, 10));
        service.create(&clerk(), draft("1001", "2025-06-02"), now).await.unwrap();

        let result = service.create(&clerk(), draft("1001", "2025-06-03"), now).await;
        assert!(matches!(result, Err(InvoiceError::DuplicateKey(_))));
        assert_eq!(service.store().len(), 1);
    }

    #[tokio::test]
    async fn test_same_number_different_payer_is_a_different_key() {
        let service = service();
        let now = at(date(2025, 6, 10));
        service.create(&clerk(), draft("1001", "2025-06-02"), now).await.unwrap();

        let mut other = draft("1001", "2025-06-02");
        other.payer = "NUEVA EPS".to_string();
        service.create(&clerk(), other, now).await.unwrap();
        assert_eq!(service.store().len(), 2);
    }

    #[tokio::test]
    async fn test_soat_area_creates_sidecar() {
        let service = service();
        let now = at(date(2025, 6, 10));
        let mut soat = draft("1001", "2025-06-02");
        soat.service_area = ServiceArea::Soat;
        let id = service.create(&clerk(), soat, now).await.unwrap();

        let record = service.store().fetch(id).await.unwrap().unwrap();
        assert!(record.invoice.soat_detail.is_some());
    }

    #[tokio::test]
    async fn test_unknown_biller_is_rejected() {
        let service = service();
        let now = at(date(2025, 6, 10));
        let mut bad = draft("1001", "2025-06-02");
        bad.biller = "NOBODY".to_string();
        let result = service.create(&clerk(), bad, now).await;
        assert!(matches!(result, Err(InvoiceError::Validation(_))));
    }
}

mod audit_workflow {
    use super::*;

    #[tokio::test]
    async fn test_clerk_cannot_review() {
        let service = service();
        let now = at(date(2025, 6, 10));
        let id = service.create(&clerk(), draft("1001", "2025-06-02"), now).await.unwrap();

        let result = service
            .review(&clerk(), id, AuditStatus::ReadyToFile, None, None, now)
            .await;
        assert!(matches!(result, Err(InvoiceError::PermissionDenied(_))));

        // unchanged
        let row = service.fetch_projection(id, now).await.unwrap();
        assert_eq!(row.audit_status, AuditStatus::Pending);
    }

    #[tokio::test]
    async fn test_return_and_correct_cycle() {
        let service = service();
        let now = at(date(2025, 6, 10));
        let id = service.create(&clerk(), draft("1001", "2025-06-02"), now).await.unwrap();

        service
            .review(
                &auditor(),
                id,
                AuditStatus::ReturnedByAuditor,
                Some("missing folder".to_string()),
                Some(ErrorKind::MissingFolder),
                now,
            )
            .await
            .unwrap();

        // the auditor cannot mark the correction
        let result = service.mark_corrected(&auditor(), id, now).await;
        assert!(matches!(result, Err(InvoiceError::PermissionDenied(_))));

        service.mark_corrected(&clerk(), id, now).await.unwrap();
        let row = service.fetch_projection(id, now).await.unwrap();
        assert_eq!(row.audit_status, AuditStatus::CorrectedByBiller);
        assert_eq!(row.error_kind, Some(ErrorKind::MissingFolder));
        assert_eq!(row.audit_observation.as_deref(), Some("missing folder"));
    }

    #[tokio::test]
    async fn test_return_without_error_kind_fails() {
        let service = service();
        let now = at(date(2025, 6, 10));
        let id = service.create(&clerk(), draft("1001", "2025-06-02"), now).await.unwrap();

        let result = service
            .review(&auditor(), id, AuditStatus::ReturnedByAuditor, None, None, now)
            .await;
        assert!(matches!(result, Err(InvoiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_filing_toggle_round_trip() {
        let service = service();
        let now = at(date(2025, 6, 10));
        let id = service.create(&clerk(), draft("1001", "2025-06-02"), now).await.unwrap();

        service
            .review(&auditor(), id, AuditStatus::ReadyToFile, None, None, now)
            .await
            .unwrap();
        service.set_filing_delivered(&auditor(), id, true, now).await.unwrap();
        let row = service.fetch_projection(id, now).await.unwrap();
        assert_eq!(row.audit_status, AuditStatus::InFiler);
        assert!(row.filing_delivered_at.is_some());

        service.set_filing_delivered(&auditor(), id, false, now).await.unwrap();
        let row = service.fetch_projection(id, now).await.unwrap();
        assert_eq!(row.audit_status, AuditStatus::ReadyToFile);
        assert!(row.filing_delivered_at.is_none());
    }
}

mod reissue {
    use super::*;

    #[tokio::test]
    async fn test_reissue_spawns_linked_row() {
        let service = service();
        let created = at(date(2025, 4, 1));
        let id = service.create(&clerk(), draft("1001", "2025-04-01"), created).await.unwrap();

        let now = at(date(2025, 6, 10));
        let new_id = service
            .reissue(&clerk(), id, "2001", "2025-06-10", now)
            .await
            .unwrap();

        let tombstone = service.store().fetch(id).await.unwrap().unwrap().invoice;
        assert_eq!(tombstone.replaced_by_number.as_ref().map(|n| n.as_str()), Some("2001"));
        assert_eq!(tombstone.replacement_date, Some(date(2025, 6, 10)));

        let replacement = service.store().fetch(new_id).await.unwrap().unwrap();
        assert_eq!(replacement.invoice.original_invoice_id, Some(id));
        assert_eq!(replacement.invoice.audit_status, AuditStatus::Pending);
        // the chain context joins back to the original
        assert_eq!(
            replacement.chain.original_number.as_ref().map(|n| n.as_str()),
            Some("1001")
        );

        // the replacement's clock is fresh
        let row = service.fetch_projection(new_id, now).await.unwrap();
        assert!(matches!(row.remaining, RemainingDisplay::Days(d) if d > 0));
    }

    #[tokio::test]
    async fn test_reissue_requires_overdue_flag() {
        let service = service();
        let now = at(date(2025, 6, 10));
        let id = service.create(&clerk(), draft("1001", "2025-06-02"), now).await.unwrap();

        let result = service.reissue(&clerk(), id, "2001", "2025-06-10", now).await;
        assert!(matches!(result, Err(InvoiceError::InvalidTransition(_))));

        // row unchanged
        let row = service.fetch_projection(id, now).await.unwrap();
        assert!(row.replacement_number.is_none());
        assert_eq!(service.store().len(), 1);
    }

    #[tokio::test]
    async fn test_reissue_rejects_colliding_number() {
        let service = service();
        let created = at(date(2025, 4, 1));
        let id = service.create(&clerk(), draft("1001", "2025-04-01"), created).await.unwrap();
        service.create(&clerk(), draft("2001", "2025-06-02"), at(date(2025, 6, 2))).await.unwrap();

        let now = at(date(2025, 6, 10));
        let result = service.reissue(&clerk(), id, "2001", "2025-06-10", now).await;
        assert!(matches!(result, Err(InvoiceError::DuplicateKey(_))));

        // the original is untouched
        let original = service.store().fetch(id).await.unwrap().unwrap().invoice;
        assert!(original.replaced_by_number.is_none());
        assert_eq!(service.store().len(), 2);
    }

    #[tokio::test]
    async fn test_reissue_rejects_future_date() {
        let service = service();
        let created = at(date(2025, 4, 1));
        let id = service.create(&clerk(), draft("1001", "2025-04-01"), created).await.unwrap();

        let now = at(date(2025, 6, 10));
        let result = service.reissue(&clerk(), id, "2001", "2025-06-11", now).await;
        assert!(matches!(result, Err(InvoiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_returned_invoice_cannot_be_reissued() {
        let service = service();
        let created = at(date(2025, 4, 1));
        let id = service.create(&clerk(), draft("1001", "2025-04-01"), created).await.unwrap();
        service
            .review(
                &auditor(),
                id,
                AuditStatus::ReturnedByAuditor,
                None,
                Some(ErrorKind::Tariff),
                created,
            )
            .await
            .unwrap();

        let now = at(date(2025, 6, 10));
        let result = service.reissue(&clerk(), id, "2001", "2025-06-10", now).await;
        assert!(matches!(result, Err(InvoiceError::InvalidTransition(_))));
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn test_two_phase_deletion() {
        let service = service();
        let now = at(date(2025, 6, 10));
        let id = service.create(&clerk(), draft("1001", "2025-06-02"), now).await.unwrap();

        service.request_deletion(&auditor(), id, now).await.unwrap();
        service.confirm_deletion(&auditor(), id, now).await.unwrap();
        assert!(service.store().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_without_mark_fails() {
        let service = service();
        let now = at(date(2025, 6, 10));
        let id = service.create(&clerk(), draft("1001", "2025-06-02"), now).await.unwrap();

        let result = service.confirm_deletion(&auditor(), id, now).await;
        assert!(matches!(result, Err(InvoiceError::InvalidTransition(_))));
        assert_eq!(service.store().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_clears_the_mark() {
        let service = service();
        let now = at(date(2025, 6, 10));
        let id = service.create(&clerk(), draft("1001", "2025-06-02"), now).await.unwrap();

        service.request_deletion(&auditor(), id, now).await.unwrap();
        service.cancel_deletion(id);
        let result = service.confirm_deletion(&auditor(), id, now).await;
        assert!(matches!(result, Err(InvoiceError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_clerk_cannot_delete() {
        let service = service();
        let now = at(date(2025, 6, 10));
        let id = service.create(&clerk(), draft("1001", "2025-06-02"), now).await.unwrap();

        let result = service.request_deletion(&clerk(), id, now).await;
        assert!(matches!(result, Err(InvoiceError::PermissionDenied(_))));
    }
}

mod bulk_intake {
    use super::*;

    fn defaults(service: &InvoiceService<MemoryInvoiceStore>) -> IntakeDefaults {
        IntakeDefaults {
            biller: service.catalog().biller("OSCAR MAYA").unwrap(),
            payer: service.catalog().payer("SURA").unwrap(),
            service_area: ServiceArea::Outpatient,
        }
    }

    fn row(number: &str, date: &str) -> IntakeRow {
        IntakeRow {
            invoice_number: number.to_string(),
            generation_date: date.to_string(),
        }
    }

    #[tokio::test]
    async fn test_batch_with_one_bad_row() {
        let service = service();
        let now = at(date(2025, 6, 10));
        let rows = vec![
            row("1001", "2025-06-02"),
            row("10X2", "2025-06-02"),
            row("1003", "03/06/2025"),
        ];

        let outcome = service
            .import_batch(&clerk(), &defaults(&service), rows, now)
            .await
            .unwrap();
        assert_eq!(outcome.total_rows, 3);
        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(service.store().len(), 2);
    }

    #[tokio::test]
    async fn test_batch_skips_duplicates_and_continues() {
        let service = service();
        let now = at(date(2025, 6, 10));
        service.create(&clerk(), draft("1001", "2025-06-02"), now).await.unwrap();

        let rows = vec![row("1001", "2025-06-02"), row("1002", "2025-06-02")];
        let outcome = service
            .import_batch(&clerk(), &defaults(&service), rows, now)
            .await
            .unwrap();
        assert_eq!(outcome.total_rows, 2);
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.skipped, 1);
    }

    #[tokio::test]
    async fn test_batch_rejects_future_dates() {
        let service = service();
        let now = at(date(2025, 6, 10));
        let rows = vec![row("1001", "2025-06-11")];
        let outcome = service
            .import_batch(&clerk(), &defaults(&service), rows, now)
            .await
            .unwrap();
        assert_eq!(outcome.inserted, 0);
        assert_eq!(outcome.skipped, 1);
    }

    #[tokio::test]
    async fn test_counts_always_reconcile() {
        let service = service();
        let now = at(date(2025, 6, 10));
        let rows = vec![
            row("1", "2025-06-02"),
            row("bad", "2025-06-02"),
            row("2", "not-a-date"),
            row("3", "2025-06-02"),
        ];
        let outcome = service
            .import_batch(&clerk(), &defaults(&service), rows, now)
            .await
            .unwrap();
        assert_eq!(outcome.total_rows, outcome.inserted + outcome.skipped);
    }
}

mod worklist {
    use super::*;

    #[tokio::test]
    async fn test_worklist_is_sorted_and_filtered() {
        let service = service();
        let now = at(date(2025, 6, 10));
        service.create(&clerk(), draft("1001", "2025-06-02"), now).await.unwrap();
        service.create(&clerk(), draft("1002", "2025-06-03"), now).await.unwrap();

        let all = service.worklist(&ListFilter::all(), now).await.unwrap();
        assert_eq!(all.len(), 2);
        // same bucket: newest generation date first
        assert_eq!(all[0].invoice_number.as_str(), "1002");

        let filtered = service
            .worklist(
                &ListFilter::matching(domain_invoicing::SearchField::InvoiceNumber, "1001"),
                now,
            )
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].invoice_number.as_str(), "1001");
    }

    #[tokio::test]
    async fn test_summary_counts() {
        let service = service();
        let now = at(date(2025, 6, 10));
        let id = service.create(&clerk(), draft("1001", "2025-06-02"), now).await.unwrap();
        service.create(&clerk(), draft("1002", "2025-06-02"), now).await.unwrap();
        service
            .review(
                &auditor(),
                id,
                AuditStatus::ReturnedByAuditor,
                None,
                Some(ErrorKind::Tariff),
                now,
            )
            .await
            .unwrap();

        let summary = service.summary().await.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.returned_or_corrected, 1);

        let groups = service.pending_groups().await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 1);
    }
}
