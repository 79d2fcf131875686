//! Facts about the machine the server runs on.
//!
//! Everything here is read fresh on every call: pods get rescheduled and
//! `/etc/resolv.conf` gets rewritten, and the report should show what is true
//! at the moment the request is served.

use std::path::Path;

use chrono::Utc;

use crate::application::{
    build_report, DiagnosticReport, DiagnosticReporter, HostFacts, RequestSnapshot,
};

const RESOLV_CONF_PATH: &str = "/etc/resolv.conf";
const HOSTS_PATH: &str = "/etc/hosts";

/// Resolves the server's hostname.
pub fn server_hostname() -> std::io::Result<String> {
    hostname::get().map(|name| name.to_string_lossy().into_owned())
}

/// Collects the current [`HostFacts`].
///
/// Performs blocking file reads; call it from a blocking context.
pub fn gather_host_facts() -> HostFacts {
    HostFacts {
        hostname: server_hostname().map_err(|e| e.to_string()),
        pod_name: non_empty_var("POD_NAME"),
        pod_namespace: non_empty_var("POD_NAMESPACE"),
        pod_ip: non_empty_var("POD_IP"),
        environment: std::env::vars_os()
            .map(|(key, value)| {
                (
                    key.to_string_lossy().into_owned(),
                    value.to_string_lossy().into_owned(),
                )
            })
            .collect(),
        resolv_conf: read_text(Path::new(RESOLV_CONF_PATH)),
        hosts: read_text(Path::new(HOSTS_PATH)),
        generated_at: Utc::now(),
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn read_text(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| e.to_string())
}

/// The production [`DiagnosticReporter`]: live host facts plus the
/// configured extra response headers.
#[derive(Debug, Clone, Default)]
pub struct SystemReporter {
    extra_headers: Vec<(String, String)>,
}

impl SystemReporter {
    pub fn new(extra_headers: Vec<(String, String)>) -> Self {
        Self { extra_headers }
    }
}

impl DiagnosticReporter for SystemReporter {
    fn report(&self, request: &RequestSnapshot) -> DiagnosticReport {
        build_report(&gather_host_facts(), request, &self.extra_headers)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConnectionInfo;

    #[test]
    fn test_read_text_missing_file_reports_error_text() {
        let result = read_text(Path::new("/nonexistent/echo-server/hosts"));
        let err = result.unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn test_gathered_environment_matches_process_env() {
        let facts = gather_host_facts();
        let expected = std::env::vars_os().count();
        assert_eq!(facts.environment.len(), expected);
    }

    #[test]
    fn test_gathered_hostname_matches_resolver() {
        let facts = gather_host_facts();
        assert_eq!(facts.hostname.is_ok(), server_hostname().is_ok());
    }

    #[test]
    fn test_system_reporter_sends_extra_headers_and_text_plain() {
        let reporter = SystemReporter::new(vec![("x-probe".to_string(), "1".to_string())]);
        let request = RequestSnapshot {
            method: "GET".to_string(),
            uri: "/".to_string(),
            version: "HTTP/1.1".to_string(),
            host: Some("localhost".to_string()),
            headers: Vec::new(),
            connection: ConnectionInfo::plain("127.0.0.1:9".parse().unwrap()),
            body: Vec::new(),
        };

        let report = reporter.report(&request);

        assert!(report.headers.contains(&("x-probe".to_string(), "1".to_string())));
        assert!(report
            .headers
            .contains(&("content-type".to_string(), "text/plain".to_string())));
        let text = String::from_utf8(report.body).unwrap();
        assert!(text.contains("-> Requesting IP: 127.0.0.1:9"));
    }
}
