// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Papiertiger virtual printer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a print job.
///
/// IPP job ids are small positive integers assigned sequentially by the
/// printer (RFC 8011 §5.3.2), so this is a `u32` counter, not a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(pub u32);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle states of a print job.
///
/// Transitions only move forward: a job never re-enters `Pending` once it
/// has left it, and terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    /// Created, document data still being received.
    Pending,
    /// Document fully received, handler running.
    Processing,
    /// Document handed off to the spool successfully.
    Completed,
    /// The document handler failed; received bytes are retained.
    Aborted,
    /// Cancelled by the client.
    Cancelled,
}

impl JobState {
    /// Whether this state admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::Cancelled)
    }
}

/// Supported input document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentFormat {
    Pdf,
    PostScript,
    Jpeg,
    Png,
    PlainText,
    /// Unrecognised MIME type — spooled verbatim.
    Octet,
}

impl DocumentFormat {
    /// MIME type string as used in `document-format` and the mDNS `pdl` key.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::PostScript => "application/postscript",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::PlainText => "text/plain",
            Self::Octet => "application/octet-stream",
        }
    }

    /// File extension used when spooling a document of this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::PostScript => "ps",
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::PlainText => "txt",
            Self::Octet => "bin",
        }
    }

    /// Map a MIME type string to a format. Unknown types spool as `Octet`.
    pub fn from_mime(mime: &str) -> Self {
        match mime {
            "application/pdf" => Self::Pdf,
            "application/postscript" => Self::PostScript,
            "image/jpeg" => Self::Jpeg,
            "image/png" => Self::Png,
            "text/plain" => Self::PlainText,
            _ => Self::Octet,
        }
    }
}

/// A print job held by the store.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    /// Document name as supplied by the client (`job-name`/`document-name`).
    pub name: String,
    pub format: DocumentFormat,
    pub state: JobState,
    /// Document bytes. Owned exclusively by the store; immutable once the
    /// job leaves `Pending`.
    pub data: Vec<u8>,
    /// SHA-256 hex digest of `data`, stamped at finalize.
    pub sha256: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set when the job reaches a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Overall printer status derived from the job registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrinterStatus {
    Idle,
    Processing,
    Stopped,
}

impl PrinterStatus {
    /// IPP `printer-state` enum value (RFC 8011 §5.4.11).
    pub fn ipp_value(&self) -> i32 {
        match self {
            Self::Idle => 3,
            Self::Processing => 4,
            Self::Stopped => 5,
        }
    }
}

/// Advertised printer capabilities, fixed at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    pub color: bool,
    pub duplex: bool,
    pub staple: bool,
    pub copies: bool,
    /// Document formats this printer accepts (`document-format-supported`).
    pub formats: Vec<DocumentFormat>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            color: true,
            duplex: false,
            staple: false,
            copies: true,
            formats: vec![DocumentFormat::Pdf, DocumentFormat::PostScript],
        }
    }
}

impl Capabilities {
    /// Whether a MIME type is in the advertised format set.
    pub fn supports_mime(&self, mime: &str) -> bool {
        self.formats.iter().any(|f| f.mime_type() == mime)
    }

    /// Comma-joined MIME list for the mDNS `pdl` TXT key.
    pub fn pdl(&self) -> String {
        self.formats
            .iter()
            .map(|f| f.mime_type())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Status of the embedded IPP print server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerStatus {
    Stopped,
    Starting,
    Running,
    Error,
}

/// Receives each fully-assembled document at finalize time.
///
/// The store invokes this synchronously while the job is `Processing`;
/// implementations must not block on anything slower than a local file
/// write (conversion and the like belong on a background task).
pub trait DocumentHandler: Send + Sync {
    fn document_received(&self, job: &Job) -> crate::error::Result<()>;
}
