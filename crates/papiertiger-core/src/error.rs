// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Papiertiger.

use thiserror::Error;

use crate::types::{JobId, JobState};

/// Top-level error type for all Papiertiger operations.
#[derive(Debug, Error)]
pub enum PrinterError {
    // -- Protocol errors --
    #[error("malformed IPP message: {0}")]
    MalformedMessage(String),

    #[error("job {0} not found")]
    UnknownJob(JobId),

    #[error("job {id} is {state:?}; operation not possible")]
    InvalidState { id: JobId, state: JobState },

    #[error("unsupported attribute: {0}")]
    UnsupportedAttribute(String),

    // -- Transport errors --
    #[error("malformed chunked body: {0}")]
    TransportFraming(String),

    #[error("print server error: {0}")]
    Server(String),

    // -- Discovery --
    #[error("service advertisement failed: {0}")]
    Advertise(String),

    // -- Spool / conversion --
    #[error("document conversion failed: {0}")]
    ConversionFailure(String),

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PrinterError>;
