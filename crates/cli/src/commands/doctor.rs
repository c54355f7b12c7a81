use anyhow::Context;
use kodi_voice_core::config::{AppConfig, LoadOptions};
use kodi_voice_core::MediaGateway;
use kodi_voice_gateway::KodiRpcClient;
use serde::Serialize;

const CONFIG_CHECK: &str = "config_validation";
const CONNECTIVITY_CHECK: &str = "media_center_connectivity";
const CINEMAVISION_CHECK: &str = "cinemavision_addon";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    fn from_checks(checks: Vec<DoctorCheck>) -> Self {
        let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
        let (overall_status, summary) = if all_pass {
            (CheckStatus::Pass, "doctor: all readiness checks passed")
        } else {
            (CheckStatus::Fail, "doctor: one or more readiness checks failed")
        };
        Self { overall_status, summary: summary.to_string(), checks }
    }
}

pub fn run(options: &LoadOptions, json_output: bool) -> String {
    let report = build_report(options);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            serde_json::json!({
                "overall_status": "fail",
                "summary": "doctor serialization failed",
                "error": error.to_string(),
            })
            .to_string()
        });
    }

    render_human(&report)
}

fn build_report(options: &LoadOptions) -> DoctorReport {
    let checks = match AppConfig::load(options.clone()) {
        Ok(config) => {
            let mut checks =
                vec![DoctorCheck::pass(CONFIG_CHECK, "configuration loaded and validated")];
            checks.extend(check_media_center(&config));
            checks
        }
        Err(error) => vec![
            DoctorCheck::fail(CONFIG_CHECK, error.to_string()),
            DoctorCheck::skipped(CONNECTIVITY_CHECK, "configuration did not load"),
            DoctorCheck::skipped(CINEMAVISION_CHECK, "configuration did not load"),
        ],
    };

    DoctorReport::from_checks(checks)
}

fn check_media_center(config: &AppConfig) -> Vec<DoctorCheck> {
    let gateway = match KodiRpcClient::new(&config.kodi) {
        Ok(gateway) => gateway,
        Err(error) => {
            return vec![
                DoctorCheck::fail(CONNECTIVITY_CHECK, format!("could not build client: {error}")),
                DoctorCheck::skipped(CINEMAVISION_CHECK, "the media center is unreachable"),
            ];
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck::fail(
                    CONNECTIVITY_CHECK,
                    format!("failed to initialize async runtime: {error}"),
                ),
                DoctorCheck::skipped(CINEMAVISION_CHECK, "the media center is unreachable"),
            ];
        }
    };

    runtime.block_on(check_endpoint(&gateway, gateway.endpoint(), &config.dialog.cinemavision_addon_id))
}

async fn check_endpoint<G: MediaGateway>(gateway: &G, endpoint: &str, addon_id: &str) -> Vec<DoctorCheck> {
    let pinged =
        gateway.ping().await.with_context(|| format!("no JSON-RPC answer from `{endpoint}`"));
    if let Err(error) = pinged {
        return vec![
            DoctorCheck::fail(CONNECTIVITY_CHECK, format!("{error:#}")),
            DoctorCheck::skipped(CINEMAVISION_CHECK, "the media center is unreachable"),
        ];
    }

    let cinemavision = match gateway.cinemavision_available(addon_id).await {
        Ok(true) => DoctorCheck::pass(CINEMAVISION_CHECK, format!("`{addon_id}` is installed")),
        Ok(false) => DoctorCheck::pass(
            CINEMAVISION_CHECK,
            format!("`{addon_id}` is not installed; movies will play directly"),
        ),
        Err(error) => DoctorCheck::fail(CINEMAVISION_CHECK, error.to_string()),
    };

    vec![DoctorCheck::pass(CONNECTIVITY_CHECK, format!("`{endpoint}` answered ping")), cinemavision]
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
