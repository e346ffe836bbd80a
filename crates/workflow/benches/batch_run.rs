use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use chrono::NaiveDate;

use billfix_auth::Actor;
use billfix_core::{ActorId, ClinicDetailStudyId, PaymentId, Protocol, Ticket};
use billfix_infra::{DocumentError, DocumentRef, DocumentRenderer, InMemoryStore, StoreSnapshot};
use billfix_invoicing::{Invoice, PaymentLineAggregator};
use billfix_payments::{Payment, PaymentStatus};
use billfix_workflow::{CorrectionOptions, CorrectionRequest, Governor, RunMode, RunRequest};

const OPERATOR: &str = "bench@example.com";

/// Renderer that never touches the filesystem.
struct NoDocuments;

impl DocumentRenderer for NoDocuments {
    fn render_invoice(&self, invoice: &Invoice, _notify: bool) -> Result<DocumentRef, DocumentError> {
        Ok(DocumentRef {
            invoice_number: invoice.invoice_number().clone(),
            location: Default::default(),
            rendered_at: chrono::Utc::now(),
        })
    }
}

fn protocol() -> Protocol {
    Protocol::parse("BENCH").unwrap()
}

fn seeded(size: usize) -> (Governor<Arc<InMemoryStore>, PaymentLineAggregator, NoDocuments>, RunRequest) {
    let cds = ClinicDetailStudyId::new();
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let payments: Vec<Payment> = (0..size)
        .map(|_| {
            Payment::new(PaymentId::new(), protocol(), cds, PaymentStatus::Approved, 100)
                .with_activity_date(start)
        })
        .collect();

    let requests = payments
        .iter()
        .map(|p| {
            CorrectionRequest::new(protocol(), p.id_typed().to_string(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
                .unwrap()
        })
        .collect();

    let snapshot = StoreSnapshot {
        actors: vec![Actor::new(ActorId::new(), OPERATOR)],
        payments,
        invoices: Vec::new(),
    };
    let governor = Governor::new(
        Arc::new(InMemoryStore::with_snapshot(snapshot)),
        PaymentLineAggregator,
        NoDocuments,
    );
    let request = RunRequest {
        mode: RunMode::Batch,
        actor_email: OPERATOR.to_string(),
        requests,
        options: CorrectionOptions::dry_run(Ticket::parse("BENCH-1").unwrap()),
    };
    (governor, request)
}

/// Dry runs leave the store untouched, so one seeded store serves every iteration.
fn bench_dry_run_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dry_run_batch");

    for size in [10usize, 100, 1_000] {
        let (governor, request) = seeded(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &request, |b, request| {
            b.iter(|| {
                let failure = governor.run(black_box(request)).unwrap_err();
                assert!(failure.is_dry_run());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_dry_run_batch);
criterion_main!(benches);
