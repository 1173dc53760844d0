// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::{PrinterError, Result};
use crate::types::Capabilities;

/// Persistent printer settings.
///
/// Defaults impersonate an HP LaserJet Pro M404dn, which is what most
/// print clients expect a small office mono laser to look like.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterConfig {
    /// Human-readable printer name, used as the mDNS instance name.
    pub printer_name: String,
    /// Vendor identifier advertised via `usb_MFG`.
    pub manufacturer: String,
    /// Model identifier advertised via `usb_MDL`.
    pub model: String,
    /// TCP port for the IPP server.
    pub port: u16,
    /// Directory where received documents are written.
    pub spool_dir: PathBuf,
    /// IPP resource path, advertised as the mDNS `rp` key.
    pub queue_path: String,
    /// Stable device UUID advertised in TXT records.
    pub uuid: Uuid,
    /// Convert spooled documents to PDF via Ghostscript.
    pub convert_to_pdf: bool,
    /// Kill the converter if it runs longer than this.
    pub convert_timeout_secs: u64,
    /// Terminal jobs older than this are purged from the registry.
    pub retention_secs: u64,
    /// Emit the extra TXT records (URF, usb_MFG/usb_MDL) that iOS/macOS
    /// discovery requires.
    pub airprint: bool,
    pub capabilities: Capabilities,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            printer_name: "HP LaserJet Pro M404dn".into(),
            manufacturer: "HP".into(),
            model: "LaserJet Pro M404dn".into(),
            port: 6310,
            spool_dir: PathBuf::from("./print_jobs"),
            queue_path: "printers/papiertiger".into(),
            uuid: Uuid::new_v4(),
            convert_to_pdf: true,
            convert_timeout_secs: 30,
            retention_secs: 3600,
            airprint: true,
            capabilities: Capabilities::default(),
        }
    }
}

impl PrinterConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| PrinterError::Config(format!("read {}: {e}", path.display())))?;
        let config = serde_json::from_str(&data)?;
        Ok(config)
    }

    /// Load from a file if one is given, falling back to defaults on any
    /// failure (logged, not fatal — a misconfigured printer should still
    /// come up as *a* printer).
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(p) => match Self::load(p) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %p.display(), error = %e, "config load failed; using defaults");
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }

    /// The advertised printer URI for a given hostname.
    pub fn printer_uri(&self, host: &str) -> String {
        format!("ipp://{host}:{}/{}", self.port, self.queue_path)
    }
}
