//! Dry-run transaction governor.
//!
//! One run = one transaction + one actor activation. The batch executes
//! against the real store; afterwards the transaction is committed only when
//! the caller asked for it. Otherwise it is rolled back and the run ends with
//! [`CorrectionError::DryRunAbort`], so "nothing was saved" is never reported
//! as success.
//!
//! Invoice documents are rendered only once the commit has gone through.

use uuid::Uuid;

use billfix_auth::ActorContext;
use billfix_core::Ticket;
use billfix_infra::{DocumentRef, DocumentRenderer, UnitOfWork};
use billfix_invoicing::InvoiceAggregator;

use crate::error::CorrectionError;
use crate::orchestrator::{BatchAborted, BatchOutcome, Orchestrator};
use crate::record::{BatchRecord, Notice, NoticeKind};
use crate::request::{RunMode, RunRequest};

/// What a run did, committed or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: Uuid,
    pub mode: RunMode,
    pub ticket: Ticket,
    pub actor_email: String,
    /// One record per input request, in input order.
    pub records: Vec<BatchRecord>,
    pub notices: Vec<Notice>,
    /// Documents rendered after commit. Always empty for uncommitted runs.
    pub documents: Vec<DocumentRef>,
    pub committed: bool,
}

impl RunReport {
    fn new(run_id: Uuid, request: &RunRequest, outcome: BatchOutcome, committed: bool) -> Self {
        Self {
            run_id,
            mode: request.mode,
            ticket: request.options.ticket.clone(),
            actor_email: request.actor_email.clone(),
            records: outcome.records,
            notices: outcome.notices,
            documents: Vec::new(),
            committed,
        }
    }

    /// Report for a run that failed before any request was processed.
    fn untouched(run_id: Uuid, request: &RunRequest) -> Self {
        let outcome = BatchOutcome {
            records: request.requests.iter().map(BatchRecord::not_processed).collect(),
            ..BatchOutcome::default()
        };
        Self::new(run_id, request, outcome, false)
    }

    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.succeeded()
    }
}

/// A run that ended without committing.
///
/// The report is still returned so the receipt can be written.
#[derive(Debug)]
pub struct RunFailure {
    pub error: CorrectionError,
    pub report: RunReport,
}

impl RunFailure {
    pub fn is_dry_run(&self) -> bool {
        self.error.is_dry_run()
    }
}

impl core::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

pub struct Governor<S, A, D> {
    store: S,
    actors: ActorContext,
    orchestrator: Orchestrator<A>,
    renderer: D,
}

impl<S, A, D> Governor<S, A, D>
where
    S: UnitOfWork,
    A: InvoiceAggregator,
    D: DocumentRenderer,
{
    pub fn new(store: S, aggregator: A, renderer: D) -> Self {
        Self {
            store,
            actors: ActorContext::new(),
            orchestrator: Orchestrator::new(aggregator),
            renderer,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn actors(&self) -> &ActorContext {
        &self.actors
    }

    /// Execute one run. `Ok` only for a committed run.
    pub fn run(&self, request: &RunRequest) -> Result<RunReport, RunFailure> {
        let run_id = Uuid::now_v7();
        let span = tracing::info_span!(
            "correction_run",
            %run_id,
            mode = ?request.mode,
            commit = request.options.commit,
            force_update = request.options.force_update
        );
        let _entered = span.enter();

        let early = |error: CorrectionError| RunFailure {
            error,
            report: RunReport::untouched(run_id, request),
        };

        let mut tx = self.store.begin().map_err(|e| early(e.into()))?;

        let actor = match tx.find_actor_by_email(&request.actor_email) {
            Ok(Some(actor)) => actor,
            Ok(None) => return Err(early(CorrectionError::UnknownActor(request.actor_email.clone()))),
            Err(err) => return Err(early(err.into())),
        };

        let result = {
            let scope = self
                .actors
                .activate(actor, request.options.ticket.clone())
                .map_err(|e| early(e.into()))?;

            tracing::info!(requests = request.requests.len(), "run started");
            self.orchestrator
                .run(&mut *tx, &scope, &request.requests, &request.options)
        };

        match result {
            Err(BatchAborted { outcome, row, error }) => {
                tx.rollback();
                tracing::error!(row, error = %error, "run aborted; all changes rolled back");
                Err(RunFailure {
                    error,
                    report: RunReport::new(run_id, request, outcome, false),
                })
            }
            Ok(mut outcome) if request.options.commit => {
                if let Err(err) = tx.commit() {
                    tracing::error!(error = %err, "commit failed");
                    return Err(RunFailure {
                        error: err.into(),
                        report: RunReport::new(run_id, request, outcome, false),
                    });
                }
                let documents = self.render_documents(&mut outcome);
                let mut report = RunReport::new(run_id, request, outcome, true);
                report.documents = documents;
                tracing::info!(
                    succeeded = report.succeeded(),
                    failed = report.failed(),
                    "run committed"
                );
                Ok(report)
            }
            Ok(outcome) => {
                tx.rollback();
                let report = RunReport::new(run_id, request, outcome, false);
                tracing::warn!(
                    succeeded = report.succeeded(),
                    failed = report.failed(),
                    "dry run; changes not committed"
                );
                Err(RunFailure {
                    error: CorrectionError::DryRunAbort,
                    report,
                })
            }
        }
    }

    /// Render every queued invoice. Failures are reported as notices; the
    /// data they describe is already committed.
    fn render_documents(&self, outcome: &mut BatchOutcome) -> Vec<DocumentRef> {
        let mut rendered = Vec::with_capacity(outcome.documents.len());
        for invoice in outcome.documents.drain(..) {
            match self.renderer.render_invoice(&invoice, false) {
                Ok(document) => {
                    tracing::info!(
                        invoice_number = %document.invoice_number,
                        location = %document.location.display(),
                        "invoice document rendered"
                    );
                    rendered.push(document);
                }
                Err(err) => {
                    tracing::warn!(
                        invoice_number = %invoice.invoice_number(),
                        error = %err,
                        "document rendering failed"
                    );
                    outcome.notices.push(Notice::new(
                        NoticeKind::DocumentFailed,
                        format!(
                            "document for invoice {} not rendered: {err}",
                            invoice.invoice_number()
                        ),
                    ));
                }
            }
        }
        rendered
    }
}
