// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DNS-label hostname sanitation for mDNS advertisement.
//
// mDNS resolvers reject hostnames that are not valid DNS labels, and
// machine hostnames in the wild contain spaces, punctuation, and stray
// `.local` suffixes.  The advertised label must be: alphanumerics and
// hyphens only, no leading/trailing hyphen, lower-cased.

/// Label advertised when the machine hostname yields nothing usable.
pub const DEFAULT_LABEL: &str = "papiertiger";

/// Sanitize a raw hostname into a DNS label.
///
/// Strips trailing dots and a `.local` suffix, lower-cases, collapses each
/// run of non-alphanumeric characters into a single hyphen, and trims
/// leading/trailing hyphens.  An input with nothing salvageable falls back
/// to [`DEFAULT_LABEL`].
pub fn sanitize_label(raw: &str) -> String {
    let trimmed = raw.trim_end_matches('.');
    // ".local" is ASCII, so the byte offset is a valid char boundary.
    let trimmed = if trimmed.to_ascii_lowercase().ends_with(".local") {
        &trimmed[..trimmed.len() - ".local".len()]
    } else {
        trimmed
    };

    let mut label = String::with_capacity(trimmed.len());
    let mut pending_hyphen = false;
    for c in trimmed.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !label.is_empty() {
                label.push('-');
            }
            pending_hyphen = false;
            label.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if label.is_empty() {
        DEFAULT_LABEL.to_string()
    } else {
        label
    }
}

/// The fully-qualified hostname to advertise: sanitized label plus the
/// `.local.` suffix mDNS expects.
pub fn advertised_hostname(raw: &str) -> String {
    format!("{}.local.", sanitize_label(raw))
}

/// Raw machine hostname, from the environment.
pub fn machine_hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| DEFAULT_LABEL.into())
}
