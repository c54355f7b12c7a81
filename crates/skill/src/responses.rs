use std::collections::BTreeMap;

use kodi_voice_core::Prompt;
use serde::{Deserialize, Serialize};

/// A dialog key plus template data, rendered to speech by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillResponse {
    pub dialog: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
    /// The skill is waiting for a follow-up reply.
    #[serde(default)]
    pub expect_response: bool,
}

impl SkillResponse {
    pub fn new(dialog: impl Into<String>) -> Self {
        Self { dialog: dialog.into(), data: BTreeMap::new(), expect_response: false }
    }

    pub fn question(dialog: impl Into<String>) -> Self {
        Self { expect_response: true, ..Self::new(dialog) }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.data.insert(key.into(), value.to_string());
        self
    }

    pub fn from_prompt(prompt: &Prompt) -> Self {
        match prompt {
            Prompt::ResultsFound { count } => Self::question("results.found").with("count", count),
            Prompt::NoResults => Self::new("results.none"),
            Prompt::ItemLabel { label, position, total } => Self::question("list.item")
                .with("label", label)
                .with("position", position)
                .with("total", total),
            Prompt::ListEnd => Self::new("list.end"),
            Prompt::Cancelled => Self::new("cancelled"),
            Prompt::CinemavisionQuestion { label } => {
                Self::question("cinemavision.ask").with("label", label)
            }
            Prompt::PlaylistQuestion => Self::question("playlist.ask"),
        }
    }

    pub fn playing(label: &str) -> Self {
        Self::new("playing").with("label", label)
    }

    pub fn media_center_unreachable() -> Self {
        Self::new("media_center.unreachable")
    }

    pub fn nothing_pending() -> Self {
        Self::new("nothing.pending")
    }

    pub fn nothing_playing() -> Self {
        Self::new("nothing.playing")
    }

    pub fn not_understood(intent: &str) -> Self {
        Self::new("not.understood").with("intent", intent)
    }

    fn value(&self, key: &str) -> &str {
        self.data.get(key).map(String::as_str).unwrap_or_default()
    }

    /// English rendering used for on-screen notifications and the console host.
    pub fn text(&self) -> String {
        match self.dialog.as_str() {
            "results.found" => {
                format!("I found {} results. Would you like to hear them?", self.value("count"))
            }
            "results.none" => "I could not find anything matching that.".to_owned(),
            "list.item" => format!("{}. Play it, or next?", self.value("label")),
            "list.end" => "That was the last one.".to_owned(),
            "cancelled" => "Okay, cancelled.".to_owned(),
            "cinemavision.ask" => {
                format!("Play {} with CinemaVision?", self.value("label"))
            }
            "playlist.ask" => "Play the whole playlist?".to_owned(),
            "playing" => format!("Playing {}.", self.value("label")),
            "playing.collection" => {
                let source = if self.value("category") == "album" { "from" } else { "by" };
                format!("Playing {} songs {source} {}.", self.value("count"), self.value("name"))
            }
            "media_center.unreachable" => "I could not reach the media center.".to_owned(),
            "volume.out_of_range" => {
                format!("Volume must be between 0 and {}.", self.value("ceiling"))
            }
            "volume.set" => format!("Volume set to {}.", self.value("level")),
            "muted" => "Muted.".to_owned(),
            "unmuted" => "Sound is back on.".to_owned(),
            "nothing.pending" => "There is nothing to answer right now.".to_owned(),
            "pending.reminder" => match self.value("question") {
                "list" => "Should I read the results to you? Say yes or no.".to_owned(),
                "browsing" => "Say next, play, or stop.".to_owned(),
                "cinemavision" => "Should I use CinemaVision? Say yes or no.".to_owned(),
                _ => "Should I play the whole playlist? Say yes or no.".to_owned(),
            },
            "nothing.playing" => "Nothing is playing.".to_owned(),
            "missing.slot" => format!("I did not catch the {}.", self.value("slot")),
            "paused" => "Paused.".to_owned(),
            "resumed" => "Resuming.".to_owned(),
            "stopped" => "Stopped.".to_owned(),
            "subtitles.on" => "Subtitles on.".to_owned(),
            "subtitles.off" => "Subtitles off.".to_owned(),
            "seeked" => "Done.".to_owned(),
            "navigated" => "Okay.".to_owned(),
            "notifications.on" => "Notifications on.".to_owned(),
            "notifications.off" => "Notifications off.".to_owned(),
            "not.understood" => "Sorry, I did not understand that.".to_owned(),
            other => other.to_owned(),
        }
    }
}
