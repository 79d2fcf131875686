//! Diagnostic report: the plain-text dump returned for ordinary requests.
//!
//! The dispatcher only knows the [`DiagnosticReporter`] trait.  The production
//! implementation (`infrastructure::host::SystemReporter`) gathers
//! [`HostFacts`] from the running machine and hands them to
//! [`render_report`], which is pure so its layout can be tested without
//! touching the real environment.

use std::fmt::{self, Write as _};

use chrono::{DateTime, Utc};

use crate::domain::{ConnectionInfo, DEMO_PAGE_PATH};

/// Content type of every diagnostic report.
pub const REPORT_CONTENT_TYPE: &str = "text/plain";

/// A framework-independent copy of one inbound HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSnapshot {
    pub method: String,
    /// Path and query as sent by the client.
    pub uri: String,
    /// e.g. `HTTP/1.1`
    pub version: String,
    pub host: Option<String>,
    /// All headers except `Host`, in arrival order.
    pub headers: Vec<(String, String)>,
    pub connection: ConnectionInfo,
    pub body: Vec<u8>,
}

/// A complete response produced by a reporter.  The status is always 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticReport {
    /// Response headers, `content-type` included.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Produces the response for requests that are neither WebSocket upgrades nor
/// for the demo page.
#[cfg_attr(test, mockall::automock)]
pub trait DiagnosticReporter: Send + Sync {
    fn report(&self, request: &RequestSnapshot) -> DiagnosticReport;
}

/// Everything the report says about the machine serving the request.
///
/// Failures are kept as their error text; a missing `/etc/hosts` is part of
/// the report, not a reason to fail the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFacts {
    pub hostname: Result<String, String>,
    pub pod_name: Option<String>,
    pub pod_namespace: Option<String>,
    pub pod_ip: Option<String>,
    /// `(key, value)` pairs of the process environment.
    pub environment: Vec<(String, String)>,
    pub resolv_conf: Result<String, String>,
    pub hosts: Result<String, String>,
    pub generated_at: DateTime<Utc>,
}

/// Builds the full report response: configured headers plus the content type,
/// and a body of the rendered text followed by the request body.
pub fn build_report(
    facts: &HostFacts,
    request: &RequestSnapshot,
    extra_headers: &[(String, String)],
) -> DiagnosticReport {
    let mut headers = extra_headers.to_vec();
    headers.push(("content-type".to_string(), REPORT_CONTENT_TYPE.to_string()));

    let mut body = render_report(facts, request, &headers).into_bytes();
    body.extend_from_slice(&request.body);

    DiagnosticReport { headers, body }
}

/// Renders the text part of the report.
///
/// `response_headers` are listed in the report exactly as they will be sent.
pub fn render_report(
    facts: &HostFacts,
    request: &RequestSnapshot,
    response_headers: &[(String, String)],
) -> String {
    let mut out = String::with_capacity(4096);
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, facts, request, response_headers);
    out
}

fn write_report(
    out: &mut String,
    facts: &HostFacts,
    request: &RequestSnapshot,
    response_headers: &[(String, String)],
) -> fmt::Result {
    writeln!(out, "Welcome to echo-server!  Here's what I know.")?;
    writeln!(
        out,
        "  > Head to {DEMO_PAGE_PATH} for interactive websocket echo!\n"
    )?;

    match &facts.hostname {
        Ok(host) => writeln!(out, "-> My hostname is: {host}\n")?,
        Err(e) => writeln!(out, "-> Server hostname unknown: {e}\n")?,
    }

    let pod_lines = [
        ("Pod Name", &facts.pod_name),
        ("Pod Namespace", &facts.pod_namespace),
        ("Pod IP", &facts.pod_ip),
    ];
    let mut any_pod_line = false;
    for (label, value) in pod_lines {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            writeln!(out, "-> My {label} is: {value}")?;
            any_pod_line = true;
        }
    }
    if any_pod_line {
        writeln!(out)?;
    }

    writeln!(
        out,
        "-> Requesting IP: {}\n",
        request.connection.remote_addr
    )?;

    if let Some(tls) = request.connection.tls_summary() {
        writeln!(out, "-> TLS Connection Info | \n")?;
        writeln!(out, "{tls}\n")?;
    }

    writeln!(out, "-> Request Headers | \n")?;
    writeln!(
        out,
        "  {} {} {}\n",
        request.version, request.method, request.uri
    )?;
    writeln!(out, "  Host: {}", request.host.as_deref().unwrap_or(""))?;
    for line in sorted_lines(&request.headers, ": ") {
        writeln!(out, "  {line}")?;
    }

    writeln!(out, "\n")?;
    writeln!(out, "-> Response Headers | \n")?;
    for line in sorted_lines(response_headers, ": ") {
        writeln!(out, "  {line}")?;
    }
    writeln!(
        out,
        "\n  > Note that you may also see \"Transfer-Encoding\" and \"Date\"!"
    )?;

    writeln!(out, "\n")?;
    writeln!(out, "-> My environment |")?;
    for line in sorted_lines(&facts.environment, "=") {
        writeln!(out, "  {line}")?;
    }

    writeln!(out, "\n")?;
    writeln!(
        out,
        "-> Contents of /etc/resolv.conf | \n{}",
        either_text(&facts.resolv_conf)
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "-> Contents of /etc/hosts | \n{}\n",
        either_text(&facts.hosts)
    )?;

    writeln!(out)?;
    writeln!(
        out,
        "-> And that's the way it is {}",
        facts.generated_at.format("%Y-%m-%d %H:%M:%S%.f +0000 UTC")
    )?;
    writeln!(out, "\n// Thanks for using echo-server.")
}

fn sorted_lines(pairs: &[(String, String)], separator: &str) -> Vec<String> {
    let mut lines: Vec<String> = pairs
        .iter()
        .map(|(k, v)| format!("{k}{separator}{v}"))
        .collect();
    lines.sort();
    lines
}

fn either_text(result: &Result<String, String>) -> &str {
    match result {
        Ok(text) | Err(text) => text,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
