pub mod config;
pub mod doctor;
pub mod listen;

use serde::Serialize;

pub const EXIT_IO: u8 = 1;
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_GATEWAY: u8 = 3;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome<'a> {
    command: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<&'a str>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload =
            CommandOutcome { command, status: "ok", error_class: None, message: message.into() };
        Self { exit_code: 0, output: render(&payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command,
            status: "error",
            error_class: Some(error_class),
            message: message.into(),
        };
        Self { exit_code, output: render(&payload) }
    }
}

fn render(payload: &CommandOutcome<'_>) -> String {
    serde_json::to_string(payload).unwrap_or_else(|error| {
        serde_json::json!({
            "command": payload.command,
            "status": "error",
            "error_class": "serialization",
            "message": error.to_string(),
        })
        .to_string()
    })
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::{CommandResult, EXIT_CONFIG};

    #[test]
    fn failure_carries_error_class_and_exit_code() {
        let result = CommandResult::failure("listen", "config_validation", "bad port", EXIT_CONFIG);
        let payload: Value = serde_json::from_str(&result.output).expect("json output");

        assert_eq!(result.exit_code, 2);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    }

    #[test]
    fn success_omits_error_class() {
        let result = CommandResult::success("listen", "handled 3 requests");
        let payload: Value = serde_json::from_str(&result.output).expect("json output");

        assert_eq!(result.exit_code, 0);
        assert!(payload.get("error_class").is_none());
        assert_eq!(payload["message"], "handled 3 requests");
    }
}
