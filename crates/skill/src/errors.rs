use kodi_voice_core::{DialogState, DialogTransitionError, GatewayError};
use thiserror::Error;

use crate::responses::SkillResponse;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SkillError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Dialog(#[from] DialogTransitionError),
    #[error("volume {requested} is outside 0..={ceiling}")]
    VolumeOutOfRange { requested: i64, ceiling: u8 },
    #[error("required slot `{0}` is missing")]
    MissingSlot(&'static str),
}

impl SkillError {
    /// What the user hears instead of the normal answer.
    pub fn response(&self) -> SkillResponse {
        match self {
            Self::Gateway(_) => SkillResponse::media_center_unreachable(),
            Self::Dialog(DialogTransitionError::InvalidTransition { state, .. }) => {
                pending_reminder(*state)
            }
            Self::VolumeOutOfRange { ceiling, .. } => {
                SkillResponse::new("volume.out_of_range").with("ceiling", ceiling)
            }
            Self::MissingSlot(slot) => SkillResponse::new("missing.slot").with("slot", slot),
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Gateway(error) => error.error_class(),
            Self::Dialog(_) => "stale_follow_up",
            Self::VolumeOutOfRange { .. } | Self::MissingSlot(_) => "invalid_input",
        }
    }
}

/// A reply that does not fit the pending question repeats the question.
fn pending_reminder(state: DialogState) -> SkillResponse {
    let question = match state {
        DialogState::Idle => return SkillResponse::nothing_pending(),
        DialogState::AwaitingListDecision => "list",
        DialogState::BrowsingList => "browsing",
        DialogState::AwaitingCinemavisionDecision => "cinemavision",
        DialogState::AwaitingPlaylistTypeDecision => "playlist",
    };
    SkillResponse::question("pending.reminder").with("question", question)
}

#[cfg(test)]
mod tests {
    use kodi_voice_core::{DialogState, DialogTransitionError, GatewayError, Signal};

    use super::SkillError;

    #[test]
    fn each_error_class_maps_to_a_distinct_dialog() {
        let unreachable = SkillError::from(GatewayError::Transport("refused".to_owned()));
        let stale = SkillError::from(DialogTransitionError::InvalidTransition {
            state: DialogState::Idle,
            signal: Signal::Next,
        });
        let volume = SkillError::VolumeOutOfRange { requested: 150, ceiling: 100 };

        assert_eq!(unreachable.response().dialog, "media_center.unreachable");
        assert_eq!(stale.response().dialog, "nothing.pending");
        assert_eq!(volume.response().dialog, "volume.out_of_range");
        assert_eq!(volume.response().data.get("ceiling").map(String::as_str), Some("100"));
        assert_eq!(stale.error_class(), "stale_follow_up");
    }

    #[test]
    fn mismatched_reply_repeats_the_pending_question() {
        let error = SkillError::from(DialogTransitionError::InvalidTransition {
            state: DialogState::AwaitingListDecision,
            signal: Signal::Play,
        });

        let response = error.response();

        assert_eq!(response.dialog, "pending.reminder");
        assert!(response.expect_response);
        assert_eq!(response.data.get("question").map(String::as_str), Some("list"));
        assert_eq!(response.text(), "Should I read the results to you? Say yes or no.");
    }
}
