//! Batch orchestrator: drive each request through lookup, guard, mutation and
//! (optionally) invoice resubmission, strictly in input order.

use chrono::Utc;

use billfix_auth::ActorScope;
use billfix_infra::{InvoiceRepository, PaymentRepository};
use billfix_invoicing::{Invoice, InvoiceAggregator};
use billfix_payments::StatusGuard;

use crate::error::CorrectionError;
use crate::mutator::PaymentMutator;
use crate::record::{
    BatchRecord, MSG_DATE_UPDATED, MSG_INVOICE_NOT_FOUND, MSG_PAYMENT_NOT_FOUND, Notice, NoticeKind,
};
use crate::request::{CorrectionOptions, CorrectionRequest};
use crate::resubmit::InvoiceResubmission;

/// Records and notices collected while processing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub records: Vec<BatchRecord>,
    pub notices: Vec<Notice>,
    /// Resubmitted invoices whose documents are due once the run commits.
    /// Latest state per invoice number.
    pub documents: Vec<Invoice>,
}

impl BatchOutcome {
    fn queue_document(&mut self, invoice: Invoice) {
        match self
            .documents
            .iter_mut()
            .find(|queued| queued.invoice_number() == invoice.invoice_number())
        {
            Some(queued) => *queued = invoice,
            None => self.documents.push(invoice),
        }
    }
}

/// A fatal error stopped the batch.
///
/// `outcome` still holds one record per input row: processed rows as they
/// ended, the failing row as `failed`, and the rest as not processed.
#[derive(Debug)]
pub struct BatchAborted {
    pub outcome: BatchOutcome,
    /// 1-based row that raised `error`.
    pub row: usize,
    pub error: CorrectionError,
}

type RowResult = Result<BatchRecord, (BatchRecord, CorrectionError)>;

pub struct Orchestrator<A> {
    aggregator: A,
}

impl<A> Orchestrator<A>
where
    A: InvoiceAggregator,
{
    pub fn new(aggregator: A) -> Self {
        Self { aggregator }
    }

    /// Process `requests` in order against `repo`.
    ///
    /// Payment and invoice lookup misses are recorded and processing
    /// continues; every other error stops the batch and is returned for the
    /// caller to abort the transaction.
    pub fn run<R>(
        &self,
        repo: &mut R,
        scope: &ActorScope<'_>,
        requests: &[CorrectionRequest],
        options: &CorrectionOptions,
    ) -> Result<BatchOutcome, BatchAborted>
    where
        R: PaymentRepository + InvoiceRepository + ?Sized,
    {
        let mut outcome = BatchOutcome::default();

        for (idx, request) in requests.iter().enumerate() {
            let row = idx + 1;
            let span = tracing::info_span!(
                "record",
                row,
                gpid = %request.gpid,
                protocol = %request.protocol
            );
            let _entered = span.enter();

            match self.process(repo, scope, request, options, &mut outcome) {
                Ok(record) => outcome.records.push(record),
                Err((record, error)) => {
                    tracing::error!(error = %error, "record aborted the run");
                    outcome.records.push(record);
                    outcome
                        .records
                        .extend(requests[row..].iter().map(BatchRecord::not_processed));
                    return Err(BatchAborted { outcome, row, error });
                }
            }
        }

        Ok(outcome)
    }

    fn process<R>(
        &self,
        repo: &mut R,
        scope: &ActorScope<'_>,
        request: &CorrectionRequest,
        options: &CorrectionOptions,
        outcome: &mut BatchOutcome,
    ) -> RowResult
    where
        R: PaymentRepository + InvoiceRepository + ?Sized,
    {
        let mut record = BatchRecord::for_request(request);

        let payment = match repo.find_payment(&request.protocol, &request.gpid) {
            Ok(Some(payment)) => payment,
            Ok(None) => {
                tracing::warn!("payment not found");
                outcome.notices.push(Notice::new(
                    NoticeKind::PaymentMissing,
                    format!("Payment {} does not exist in protocol {}", request.gpid, request.protocol),
                ));
                return Ok(record.failed(MSG_PAYMENT_NOT_FOUND));
            }
            Err(err) => return Err(fail(record, err.into())),
        };

        record.original_activity_date = payment.activity_completion_date();

        if let Err(rejection) = StatusGuard::check(&payment) {
            return Err(fail(record, rejection.into()));
        }

        let note = scope.note(
            format!(
                "activity completion date corrected to {} (was {})",
                request.new_date,
                payment
                    .activity_completion_date()
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "unset".to_string())
            ),
            Utc::now(),
        );
        let mutation =
            match PaymentMutator::apply(repo, payment, request.new_date, note, &mut outcome.notices) {
                Ok(mutation) => mutation,
                Err(err) => return Err(fail(record, err)),
            };

        let Some(invoice_number) = mutation.invoice_number else {
            return Ok(record.succeeded(MSG_DATE_UPDATED));
        };

        if !options.force_update {
            let error = CorrectionError::UnauthorizedInvoiceUpdate {
                payment_id: mutation.payment.id_typed(),
                invoice_number,
            };
            outcome
                .notices
                .push(Notice::new(NoticeKind::ForceRequired, error.to_string()));
            // The payment change itself stands; the run is stopped by the caller.
            let message = error.to_string();
            return Err((record.succeeded(message), error));
        }

        let note = scope.note(
            format!(
                "resubmitted after activity date correction of payment {}",
                mutation.payment.id_typed()
            ),
            Utc::now(),
        );
        let resubmission = InvoiceResubmission::new(&self.aggregator);
        match resubmission.resubmit(repo, mutation.clinic_detail_study, &invoice_number, note) {
            Ok(invoice) => {
                outcome.notices.push(Notice::new(
                    NoticeKind::InvoiceUpdated,
                    format!("invoice {invoice_number} updated"),
                ));
                if options.generate_document {
                    outcome.queue_document(invoice);
                }
                Ok(record.succeeded(format!("Updated invoice {invoice_number}")))
            }
            Err(CorrectionError::NotFound { .. }) => {
                tracing::warn!(invoice_number = %invoice_number, "invoice not found");
                outcome.notices.push(Notice::new(
                    NoticeKind::InvoiceMissing,
                    format!(
                        "Invoice {invoice_number} for payment {} does not exist",
                        mutation.payment.id_typed()
                    ),
                ));
                Ok(record.failed(MSG_INVOICE_NOT_FOUND))
            }
            Err(err) => Err(fail(record, err)),
        }
    }
}

fn fail(record: BatchRecord, error: CorrectionError) -> (BatchRecord, CorrectionError) {
    (record.failed(error.to_string()), error)
}
