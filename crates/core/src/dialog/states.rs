use serde::{Deserialize, Serialize};

use crate::domain::catalog::{MatchSet, MediaKind};
use crate::domain::youtube::YoutubeLinks;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogState {
    Idle,
    AwaitingListDecision,
    BrowsingList,
    AwaitingCinemavisionDecision,
    AwaitingPlaylistTypeDecision,
}

/// A classified follow-up reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Yes,
    No,
    Next,
    Stop,
    Play,
    Cancel,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Next => "next",
            Self::Stop => "stop",
            Self::Play => "play",
            Self::Cancel => "cancel",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogEvent {
    /// A resolution finished. `cinemavision_available` only matters for a single movie.
    Resolved { matches: MatchSet, cinemavision_available: bool },
    PlaylistOffered { links: YoutubeLinks },
    Signal(Signal),
}

impl DialogEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Resolved { .. } => "resolved",
            Self::PlaylistOffered { .. } => "playlist_offered",
            Self::Signal(signal) => signal.as_str(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListPhase {
    /// "N results found" was spoken; waiting for yes/no.
    Offered,
    Browsing,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingContext {
    #[default]
    None,
    NavigateList { items: MatchSet, cursor: usize, phase: ListPhase },
    CinemavisionChoice { movie_id: i64, label: String },
    PlaylistChoice { links: YoutubeLinks },
}

impl PendingContext {
    pub fn state(&self) -> DialogState {
        match self {
            Self::None => DialogState::Idle,
            Self::NavigateList { phase: ListPhase::Offered, .. } => {
                DialogState::AwaitingListDecision
            }
            Self::NavigateList { phase: ListPhase::Browsing, .. } => DialogState::BrowsingList,
            Self::CinemavisionChoice { .. } => DialogState::AwaitingCinemavisionDecision,
            Self::PlaylistChoice { .. } => DialogState::AwaitingPlaylistTypeDecision,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// What to say; rendering belongs to the dialog layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "prompt", rename_all = "snake_case")]
pub enum Prompt {
    ResultsFound { count: usize },
    NoResults,
    ItemLabel { label: String, position: usize, total: usize },
    ListEnd,
    Cancelled,
    CinemavisionQuestion { label: String },
    PlaylistQuestion,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogAction {
    Speak(Prompt),
    PlayEntry { id: i64, kind: MediaKind, label: String },
    PlayCinemavision { movie_id: i64, label: String },
    PlayUrl { url: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: DialogState,
    pub to: DialogState,
    pub event: DialogEvent,
    pub actions: Vec<DialogAction>,
}

impl TransitionOutcome {
    pub fn prompts(&self) -> impl Iterator<Item = &Prompt> {
        self.actions.iter().filter_map(|action| match action {
            DialogAction::Speak(prompt) => Some(prompt),
            _ => None,
        })
    }
}
