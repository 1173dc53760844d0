// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Papiertiger Spool — writes received documents to disk and optionally
// converts them to PDF via Ghostscript.

pub mod convert;
pub mod sink;

pub use convert::{Convert, Ghostscript};
pub use sink::FileSpool;
