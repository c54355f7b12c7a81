use kodi_voice_core::audit::AuditSink;
use kodi_voice_core::config::{AppConfig, LoadOptions};
use kodi_voice_core::MediaGateway;
use kodi_voice_gateway::KodiRpcClient;
use kodi_voice_skill::{KodiSkill, SkillRequest, SkillResponse, SkillSettings};
use serde::Serialize;
use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use super::{CommandResult, EXIT_CONFIG, EXIT_GATEWAY, EXIT_IO};
use crate::logging::init_logging;

/// One line of the response stream.
#[derive(Debug, Serialize)]
struct ListenReply<'a> {
    #[serde(flatten)]
    response: &'a SkillResponse,
    text: String,
}

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "listen",
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            );
        }
    };
    init_logging(&config);

    let gateway = match KodiRpcClient::new(&config.kodi) {
        Ok(gateway) => gateway,
        Err(error) => {
            return CommandResult::failure(
                "listen",
                "gateway_init",
                error.to_string(),
                EXIT_GATEWAY,
            );
        }
    };
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "listen",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                EXIT_IO,
            );
        }
    };

    let mut skill = KodiSkill::new(gateway, SkillSettings::from(&config));
    info!(
        event_name = "cli.listen_started",
        endpoint = skill.gateway().endpoint(),
        session_id = %skill.session().id,
        "reading skill requests from stdin"
    );

    let served = runtime.block_on(async {
        let mut stdout = tokio::io::stdout();
        serve(&mut skill, BufReader::new(tokio::io::stdin()), &mut stdout).await
    });

    match served {
        Ok(answered) => {
            info!(event_name = "cli.listen_finished", answered, "input closed");
            CommandResult::success("listen", format!("answered {answered} requests"))
        }
        Err(error) => CommandResult::failure("listen", "io", error.to_string(), EXIT_IO),
    }
}

/// Answers each non-blank input line with exactly one output line. Returns the number of
/// answered lines.
pub async fn serve<G, S, R, W>(
    skill: &mut KodiSkill<G, S>,
    mut input: R,
    output: &mut W,
) -> std::io::Result<usize>
where
    G: MediaGateway,
    S: AuditSink,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = Vec::new();
    let mut answered = 0;

    loop {
        buffer.clear();
        if input.read_until(b'\n', &mut buffer).await? == 0 {
            break;
        }
        let reply = match std::str::from_utf8(&buffer) {
            Ok(line) => answer_line(skill, line).await,
            Err(error) => Some(rejected(&error)),
        };
        let Some(reply) = reply else {
            continue;
        };
        output.write_all(reply.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
        answered += 1;
    }

    Ok(answered)
}

/// A malformed line yields an error object and leaves the session untouched.
pub async fn answer_line<G, S>(skill: &mut KodiSkill<G, S>, line: &str) -> Option<String>
where
    G: MediaGateway,
    S: AuditSink,
{
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let request = match serde_json::from_str::<SkillRequest>(line) {
        Ok(request) => request,
        Err(error) => return Some(rejected(&error)),
    };

    let response = skill.handle(request).await;
    let reply = ListenReply { text: response.text(), response: &response };
    Some(serde_json::to_string(&reply).unwrap_or_else(|error| {
        json!({ "error": "serialization", "message": error.to_string() }).to_string()
    }))
}

fn rejected(error: &dyn std::fmt::Display) -> String {
    warn!(event_name = "cli.request_rejected", error = %error, "malformed request line");
    json!({ "error": "invalid_request", "message": error.to_string() }).to_string()
}
