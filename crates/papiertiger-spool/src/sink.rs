// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File spool — the document handler wired into the job store.
//
// Each finalized job is written to the spool directory as
// `job-<id>.<ext>`, where the extension comes from the submitted document
// format.  When a converter is configured, a PDF is produced alongside the
// original.  The conversion must not delay the protocol response, so it
// runs on a blocking thread and its failures are logged, never propagated:
// the original artifact is the deliverable, the PDF is a convenience.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use papiertiger_core::error::Result;
use papiertiger_core::types::{DocumentFormat, DocumentHandler, Job};

use crate::convert::Convert;

/// Writes finalized jobs into a spool directory.
pub struct FileSpool {
    dir: PathBuf,
    converter: Option<Arc<dyn Convert>>,
}

impl FileSpool {
    /// Create the spool, making the directory if needed.
    pub fn new(dir: impl Into<PathBuf>, converter: Option<Arc<dyn Convert>>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, converter })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the artifact for a given job.
    fn artifact_path(&self, job: &Job) -> PathBuf {
        self.dir
            .join(format!("job-{}.{}", job.id, job.format.extension()))
    }

    /// Run the configured converter on a spooled artifact.
    ///
    /// Failure leaves the original in place; there is nothing to roll back.
    fn convert_artifact(converter: &dyn Convert, path: &Path) {
        match converter.convert(path) {
            Ok(output) => info!(
                original = %path.display(),
                converted = %output.display(),
                "artifact converted"
            ),
            Err(e) => warn!(
                original = %path.display(),
                error = %e,
                "conversion failed; original artifact retained"
            ),
        }
    }

    /// Kick off conversion without blocking the caller.
    ///
    /// On a Tokio runtime the work moves to a blocking thread so the
    /// protocol response returns immediately; without a runtime (plain
    /// synchronous callers, tests) it runs inline.
    fn schedule_conversion(&self, path: PathBuf) {
        let Some(converter) = self.converter.clone() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || {
                    Self::convert_artifact(converter.as_ref(), &path);
                });
            }
            Err(_) => Self::convert_artifact(converter.as_ref(), &path),
        }
    }
}

impl DocumentHandler for FileSpool {
    fn document_received(&self, job: &Job) -> Result<()> {
        let path = self.artifact_path(job);
        std::fs::write(&path, &job.data)?;

        info!(
            job_id = %job.id,
            path = %path.display(),
            bytes = job.data.len(),
            "document spooled"
        );

        // Already a PDF — nothing to convert.
        if job.format != DocumentFormat::Pdf {
            self.schedule_conversion(path);
        }

        Ok(())
    }
}
