// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IPP operation dispatch.
//
// Maps decoded requests onto job-store actions and encodes the responses.
// Supported operations (RFC 8011 §4):
//
//   - Print-Job             (0x0002)
//   - Validate-Job          (0x0004)
//   - Cancel-Job            (0x0008)
//   - Get-Job-Attributes    (0x0009)
//   - Get-Jobs              (0x000A)
//   - Get-Printer-Attrs     (0x000B)
//
// Anything else gets a server-error-operation-not-supported response; no
// request ever takes the process down.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{debug, info, warn};

use papiertiger_core::config::PrinterConfig;
use papiertiger_core::error::PrinterError;
use papiertiger_core::types::{DocumentFormat, Job, JobId, JobState};

use crate::codec::{
    IppMessage, ResponseBuilder, OP_CANCEL_JOB, OP_GET_JOBS, OP_GET_JOB_ATTRIBUTES,
    OP_GET_PRINTER_ATTRIBUTES, OP_PRINT_JOB, OP_VALIDATE_JOB, STATUS_CLIENT_ERROR_BAD_REQUEST,
    STATUS_CLIENT_ERROR_DOCUMENT_FORMAT_NOT_SUPPORTED, STATUS_CLIENT_ERROR_NOT_FOUND,
    STATUS_CLIENT_ERROR_NOT_POSSIBLE, STATUS_OK, STATUS_SERVER_ERROR_INTERNAL,
    STATUS_SERVER_ERROR_OPERATION_NOT_SUPPORTED, TAG_JOB_ATTRIBUTES, TAG_OPERATION_ATTRIBUTES,
    TAG_PRINTER_ATTRIBUTES,
};
use crate::store::JobStore;

// ---------------------------------------------------------------------------
// IPP job-state values (RFC 8011 §5.3.7)
// ---------------------------------------------------------------------------

const JOB_STATE_PENDING: i32 = 3;
const JOB_STATE_PROCESSING: i32 = 5;
const JOB_STATE_CANCELED: i32 = 7;
const JOB_STATE_ABORTED: i32 = 8;
const JOB_STATE_COMPLETED: i32 = 9;

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// The operations this printer implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    PrintJob,
    ValidateJob,
    CancelJob,
    GetJobAttributes,
    GetJobs,
    GetPrinterAttributes,
}

impl Operation {
    /// Look up an operation by its wire code.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            OP_PRINT_JOB => Some(Self::PrintJob),
            OP_VALIDATE_JOB => Some(Self::ValidateJob),
            OP_CANCEL_JOB => Some(Self::CancelJob),
            OP_GET_JOB_ATTRIBUTES => Some(Self::GetJobAttributes),
            OP_GET_JOBS => Some(Self::GetJobs),
            OP_GET_PRINTER_ATTRIBUTES => Some(Self::GetPrinterAttributes),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Routes decoded IPP requests to the job store and builds responses.
pub struct Dispatcher {
    store: Arc<JobStore>,
    config: Arc<PrinterConfig>,
}

impl Dispatcher {
    pub fn new(store: Arc<JobStore>, config: Arc<PrinterConfig>) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Handle one decoded request and return the encoded response bytes.
    pub fn dispatch(&self, request: &IppMessage, peer: SocketAddr) -> Vec<u8> {
        let operation = match Operation::from_code(request.code) {
            Some(op) => op,
            None => {
                warn!(
                    operation = %format!("0x{:04X}", request.code),
                    peer = %peer,
                    "unsupported IPP operation"
                );
                return error_response(
                    STATUS_SERVER_ERROR_OPERATION_NOT_SUPPORTED,
                    request.request_id,
                    &format!("operation 0x{:04X} is not supported", request.code),
                );
            }
        };

        debug!(operation = ?operation, request_id = request.request_id, peer = %peer, "dispatching");

        match operation {
            Operation::PrintJob => self.on_print_job(request, peer),
            Operation::ValidateJob => self.on_validate_job(request),
            Operation::CancelJob => self.on_cancel_job(request),
            Operation::GetJobAttributes => self.on_get_job_attributes(request),
            Operation::GetJobs => self.on_get_jobs(request),
            Operation::GetPrinterAttributes => self.on_get_printer_attributes(request),
        }
    }

    // -- Print-Job (0x0002) -------------------------------------------------

    /// Create a job, append the document body, and finalize in one step.
    ///
    /// The response carries the final job state: `completed` on the happy
    /// path, since spooling happens synchronously before we answer.
    fn on_print_job(&self, request: &IppMessage, peer: SocketAddr) -> Vec<u8> {
        let op_attrs = request.operation_attributes();

        let name = op_attrs
            .and_then(|g| g.get_str("job-name"))
            .or_else(|| op_attrs.and_then(|g| g.get_str("document-name")))
            .unwrap_or_else(|| "Untitled Document".into());

        let format = op_attrs
            .and_then(|g| g.get_str("document-format"))
            .map(|mime| DocumentFormat::from_mime(&mime))
            .unwrap_or(DocumentFormat::PostScript);

        let id = self.store.create(name.clone(), format);

        if let Err(e) = self.store.append(id, &request.data) {
            // Fresh job, cannot normally fail; treat as internal.
            return error_response(
                STATUS_SERVER_ERROR_INTERNAL,
                request.request_id,
                &format!("failed to accept document data: {e}"),
            );
        }

        match self.store.finalize(id) {
            Ok(state) => {
                info!(
                    job_id = %id,
                    peer = %peer,
                    doc_name = %name,
                    doc_bytes = request.data.len(),
                    "Print-Job accepted"
                );
                self.job_response(STATUS_OK, request.request_id, id, state)
            }
            Err(e) => {
                warn!(job_id = %id, error = %e, "Print-Job spooling failed");
                self.job_response(
                    STATUS_SERVER_ERROR_INTERNAL,
                    request.request_id,
                    id,
                    JobState::Aborted,
                )
            }
        }
    }

    // -- Validate-Job (0x0004) ----------------------------------------------

    /// Check the requested attributes against advertised capabilities
    /// without creating any state.
    fn on_validate_job(&self, request: &IppMessage) -> Vec<u8> {
        if let Some(mime) = request
            .operation_attributes()
            .and_then(|g| g.get_str("document-format"))
        {
            if !self.config.capabilities.supports_mime(&mime) {
                debug!(format = %mime, "Validate-Job: unsupported document format");
                let e = PrinterError::UnsupportedAttribute(format!("document-format {mime}"));
                return status_from_error(&e, request.request_id);
            }
        }

        ok_response(request.request_id)
    }

    // -- Cancel-Job (0x0008) ------------------------------------------------

    fn on_cancel_job(&self, request: &IppMessage) -> Vec<u8> {
        let id = match required_job_id(request) {
            Ok(id) => id,
            Err(resp) => return resp,
        };

        match self.store.cancel(id) {
            Ok(()) => {
                info!(job_id = %id, "Cancel-Job: job cancelled");
                ok_response(request.request_id)
            }
            Err(e) => status_from_error(&e, request.request_id),
        }
    }

    // -- Get-Job-Attributes (0x0009) ----------------------------------------

    fn on_get_job_attributes(&self, request: &IppMessage) -> Vec<u8> {
        let id = match required_job_id(request) {
            Ok(id) => id,
            Err(resp) => return resp,
        };

        match self.store.get(id) {
            Ok(job) => {
                let mut resp = ResponseBuilder::new(STATUS_OK, request.request_id);
                begin_ok(&mut resp);
                resp.text("status-message", "successful-ok");
                self.write_job_group(&mut resp, &job);
                resp.build()
            }
            Err(e) => status_from_error(&e, request.request_id),
        }
    }

    // -- Get-Jobs (0x000A) --------------------------------------------------

    fn on_get_jobs(&self, request: &IppMessage) -> Vec<u8> {
        let jobs = self.store.jobs();

        let mut resp = ResponseBuilder::new(STATUS_OK, request.request_id);
        begin_ok(&mut resp);
        resp.text("status-message", "successful-ok");
        for job in &jobs {
            self.write_job_group(&mut resp, job);
        }

        debug!(count = jobs.len(), "Get-Jobs: returning job list");
        resp.build()
    }

    // -- Get-Printer-Attributes (0x000B) ------------------------------------

    fn on_get_printer_attributes(&self, request: &IppMessage) -> Vec<u8> {
        let config = &self.config;
        let caps = &config.capabilities;
        let printer_uri = config.printer_uri("localhost");
        let status = self.store.printer_status();

        let mut resp = ResponseBuilder::new(STATUS_OK, request.request_id);
        begin_ok(&mut resp);
        resp.text("status-message", "successful-ok");

        let group = resp.begin_group(TAG_PRINTER_ATTRIBUTES);
        group
            // Identification
            .uri("printer-uri-supported", &printer_uri)
            .name_attr("printer-name", &config.printer_name)
            .text("printer-info", &config.printer_name)
            .text(
                "printer-make-and-model",
                &format!("{} {}", config.manufacturer, config.model),
            )
            .uri(
                "printer-uuid",
                &format!("urn:uuid:{}", config.uuid),
            )
            // State
            .enum_attr("printer-state", status.ipp_value())
            .keyword("printer-state-reasons", "none")
            .boolean("printer-is-accepting-jobs", true)
            .integer("queued-job-count", self.store.queued_jobs() as i32)
            // Protocol
            .keyword("ipp-versions-supported", "1.1")
            .keyword("operations-supported", "Print-Job")
            .keyword_additional("Validate-Job")
            .keyword_additional("Cancel-Job")
            .keyword_additional("Get-Job-Attributes")
            .keyword_additional("Get-Jobs")
            .keyword_additional("Get-Printer-Attributes");

        // Supported document formats from the capability set.
        let mut formats = caps.formats.iter();
        if let Some(first) = formats.next() {
            group.keyword("document-format-supported", first.mime_type());
            for fmt in formats {
                group.keyword_additional(fmt.mime_type());
            }
            group.keyword("document-format-default", caps.formats[0].mime_type());
        }

        group
            // Finishing
            .boolean("color-supported", caps.color)
            .keyword("sides-supported", "one-sided");
        if caps.duplex {
            group
                .keyword_additional("two-sided-long-edge")
                .keyword_additional("two-sided-short-edge");
        }
        group
            .keyword("sides-default", "one-sided")
            // Charset/language
            .charset("charset-configured", "utf-8")
            .charset("charset-supported", "utf-8")
            .natural_language("natural-language-configured", "en")
            .natural_language("generated-natural-language-supported", "en")
            // URI security and auth
            .keyword("uri-security-supported", "none")
            .keyword("uri-authentication-supported", "none")
            .keyword("compression-supported", "none")
            .keyword("pdl-override-supported", "not-attempted");

        debug!("Get-Printer-Attributes: returning capabilities");
        resp.build()
    }

    // -- shared response pieces ---------------------------------------------

    /// Append the job-attributes group for one job.
    fn write_job_group(&self, resp: &mut ResponseBuilder, job: &Job) {
        let printer_uri = self.config.printer_uri("localhost");
        resp.begin_group(TAG_JOB_ATTRIBUTES)
            .integer("job-id", job.id.0 as i32)
            .uri("job-uri", &format!("{printer_uri}/jobs/{}", job.id))
            .name_attr("job-name", &job.name)
            .enum_attr("job-state", job_state_to_ipp(job.state))
            .keyword("job-state-reasons", job_state_reason(job.state))
            .integer("job-k-octets", job.data.len().div_ceil(1024) as i32);
    }

    /// Build a response with status, operation attributes, and one job group.
    fn job_response(&self, status: u16, request_id: u32, id: JobId, state: JobState) -> Vec<u8> {
        match self.store.get(id) {
            Ok(job) => {
                let mut resp = ResponseBuilder::new(status, request_id);
                begin_ok(&mut resp);
                self.write_job_group(&mut resp, &job);
                resp.build()
            }
            // Purged between finalize and response build; degrade to a
            // minimal group with just id and state.
            Err(_) => {
                let mut resp = ResponseBuilder::new(status, request_id);
                begin_ok(&mut resp);
                resp.begin_group(TAG_JOB_ATTRIBUTES)
                    .integer("job-id", id.0 as i32)
                    .enum_attr("job-state", job_state_to_ipp(state));
                resp.build()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Standard operation-attributes prologue for every response.
fn begin_ok(resp: &mut ResponseBuilder) {
    resp.begin_group(TAG_OPERATION_ATTRIBUTES)
        .charset("attributes-charset", "utf-8")
        .natural_language("attributes-natural-language", "en");
}

/// Build a minimal success response.
fn ok_response(request_id: u32) -> Vec<u8> {
    let mut resp = ResponseBuilder::new(STATUS_OK, request_id);
    begin_ok(&mut resp);
    resp.text("status-message", "successful-ok");
    resp.build()
}

/// Build a minimal error response with the given status code.
pub(crate) fn error_response(status: u16, request_id: u32, message: &str) -> Vec<u8> {
    let mut resp = ResponseBuilder::new(status, request_id);
    begin_ok(&mut resp);
    resp.text("status-message", message);
    resp.build()
}

/// Extract the required `job-id` operation attribute.
fn required_job_id(request: &IppMessage) -> std::result::Result<JobId, Vec<u8>> {
    request
        .operation_attributes()
        .and_then(|g| g.get_i32("job-id"))
        .filter(|&id| id > 0)
        .map(|id| JobId(id as u32))
        .ok_or_else(|| {
            warn!("missing or invalid job-id attribute");
            error_response(
                STATUS_CLIENT_ERROR_BAD_REQUEST,
                request.request_id,
                "missing required job-id attribute",
            )
        })
}

/// Map a store error to the corresponding IPP status response.
fn status_from_error(error: &PrinterError, request_id: u32) -> Vec<u8> {
    let status = match error {
        PrinterError::UnknownJob(_) => STATUS_CLIENT_ERROR_NOT_FOUND,
        PrinterError::InvalidState { .. } => STATUS_CLIENT_ERROR_NOT_POSSIBLE,
        PrinterError::UnsupportedAttribute(_) => {
            STATUS_CLIENT_ERROR_DOCUMENT_FORMAT_NOT_SUPPORTED
        }
        PrinterError::MalformedMessage(_) => STATUS_CLIENT_ERROR_BAD_REQUEST,
        _ => STATUS_SERVER_ERROR_INTERNAL,
    };
    error_response(status, request_id, &error.to_string())
}

/// Map a job state to the IPP `job-state` enum value.
fn job_state_to_ipp(state: JobState) -> i32 {
    match state {
        JobState::Pending => JOB_STATE_PENDING,
        JobState::Processing => JOB_STATE_PROCESSING,
        JobState::Completed => JOB_STATE_COMPLETED,
        JobState::Aborted => JOB_STATE_ABORTED,
        JobState::Cancelled => JOB_STATE_CANCELED,
    }
}

/// Map a job state to the IPP `job-state-reasons` keyword.
fn job_state_reason(state: JobState) -> &'static str {
    match state {
        JobState::Pending => "none",
        JobState::Processing => "job-printing",
        JobState::Completed => "job-completed-successfully",
        JobState::Aborted => "aborted-by-system",
        JobState::Cancelled => "job-canceled-by-user",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
