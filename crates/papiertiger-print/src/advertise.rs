// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// mDNS service advertisement for the virtual printer.
//
// Registers `_ipp._tcp.local.` via mDNS-SD so clients on the LAN discover
// the printer without configuration.  The TXT record set is what real IPP
// printers publish; iOS/macOS additionally require the URF raster key and
// the usb_MFG/usb_MDL identifiers before they will list a printer at all,
// so those are emitted when `airprint` is enabled.

use mdns_sd::{ServiceDaemon, ServiceInfo};
use tracing::{debug, info, warn};

use papiertiger_core::config::PrinterConfig;
use papiertiger_core::error::{PrinterError, Result};
use papiertiger_core::types::PrinterStatus;

use crate::hostname::{advertised_hostname, machine_hostname};

/// mDNS service type for plain IPP.
const IPP_SERVICE_TYPE: &str = "_ipp._tcp.local.";

/// URF raster capability string advertised to AirPrint clients.
const URF_CAPABILITIES: &str = "W8,SRGB24,CP1,RS600";

/// Advertises the printer on the local network.
///
/// Owns the mDNS daemon for the process lifetime: [`register`] at startup,
/// [`unregister`] on shutdown, both off every request's critical path.
///
/// [`register`]: PrinterAdvertiser::register
/// [`unregister`]: PrinterAdvertiser::unregister
pub struct PrinterAdvertiser {
    daemon: ServiceDaemon,
    /// The mDNS service fullname, kept for unregistration.
    fullname: Option<String>,
}

impl PrinterAdvertiser {
    /// Spin up the mDNS daemon.
    pub fn new() -> Result<Self> {
        let daemon = ServiceDaemon::new()
            .map_err(|e| PrinterError::Advertise(format!("failed to start mDNS daemon: {e}")))?;
        Ok(Self {
            daemon,
            fullname: None,
        })
    }

    /// Register the printer service.
    ///
    /// # Errors
    ///
    /// Registration failure is an error, not a warning: an unadvertised
    /// virtual printer cannot be found by anything, so the caller treats
    /// this as fatal at startup.
    pub fn register(&mut self, config: &PrinterConfig) -> Result<()> {
        let hostname = advertised_hostname(&machine_hostname());
        let properties = txt_properties(config, &hostname);
        let prop_refs: Vec<(&str, &str)> = properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let service_info = ServiceInfo::new(
            IPP_SERVICE_TYPE,
            &config.printer_name,
            &hostname,
            "", // empty = auto-detect IP
            config.port,
            &prop_refs[..],
        )
        .map_err(|e| PrinterError::Advertise(format!("build service info: {e}")))?;

        let fullname = service_info.get_fullname().to_owned();
        self.daemon
            .register(service_info)
            .map_err(|e| PrinterError::Advertise(format!("register {fullname}: {e}")))?;

        info!(
            service_type = IPP_SERVICE_TYPE,
            name = %config.printer_name,
            host = %hostname,
            port = config.port,
            "mDNS service registered"
        );
        self.fullname = Some(fullname);
        Ok(())
    }

    /// Unregister the service. Failures are logged, not propagated — we
    /// are shutting down either way.
    pub fn unregister(&mut self) {
        if let Some(fullname) = self.fullname.take() {
            match self.daemon.unregister(&fullname) {
                Ok(_) => info!(name = %fullname, "mDNS service unregistered"),
                Err(e) => warn!(error = %e, "failed to unregister mDNS service"),
            }
        }
    }

    /// Shut down the daemon entirely. Consumes the advertiser.
    pub fn shutdown(mut self) {
        self.unregister();
        if let Err(e) = self.daemon.shutdown() {
            warn!(error = %e, "failed to shut down mDNS daemon");
        } else {
            debug!("mDNS daemon shut down");
        }
    }
}

/// Build the TXT record set for the printer.
///
/// Keys follow the Bonjour Printing spec; capability flags use the
/// T/F convention.
fn txt_properties(config: &PrinterConfig, hostname: &str) -> Vec<(String, String)> {
    let caps = &config.capabilities;
    let host = hostname.trim_end_matches('.');
    let flag = |b: bool| if b { "T" } else { "F" }.to_string();

    let mut props = vec![
        ("txtvers".into(), "1".into()),
        ("qtotal".into(), "1".into()),
        ("rp".into(), config.queue_path.clone()),
        ("ty".into(), config.printer_name.clone()),
        (
            "adminurl".into(),
            format!("http://{host}:{}/", config.port),
        ),
        ("note".into(), config.printer_name.clone()),
        ("pdl".into(), caps.pdl()),
        ("UUID".into(), config.uuid.to_string()),
        ("Color".into(), flag(caps.color)),
        ("Duplex".into(), flag(caps.duplex)),
        ("Staple".into(), flag(caps.staple)),
        ("Copies".into(), flag(caps.copies)),
        (
            "printer-state".into(),
            PrinterStatus::Idle.ipp_value().to_string(),
        ),
        ("printer-type".into(), "0x0".into()),
    ];

    if config.airprint {
        props.push(("URF".into(), URF_CAPABILITIES.into()));
        props.push(("usb_MFG".into(), config.manufacturer.clone()));
        props.push(("usb_MDL".into(), config.model.clone()));
    }

    props
}
