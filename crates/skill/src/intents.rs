use std::collections::BTreeMap;

use kodi_voice_core::{NavigationKey, Query, QueryCategory, SeekStep, Signal};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One recognized utterance as delivered by the speech framework.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillRequest {
    pub intent: String,
    #[serde(default)]
    pub slots: BTreeMap<String, Value>,
    #[serde(default)]
    pub utterance: String,
}

impl SkillRequest {
    pub fn new(intent: impl Into<String>, utterance: impl Into<String>) -> Self {
        Self { intent: intent.into(), slots: BTreeMap::new(), utterance: utterance.into() }
    }

    pub fn slot(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.slots.insert(key.into(), value.into());
        self
    }

    /// A keyword flag counts as present unless it is null, false or an empty string.
    pub fn has_keyword(&self, key: &str) -> bool {
        match self.slots.get(key) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(text)) => !text.trim().is_empty(),
            Some(_) => true,
        }
    }

    pub fn text_slot(&self, key: &str) -> Option<String> {
        match self.slots.get(key)? {
            Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        }
    }

    /// Numeric slots arrive either as JSON numbers or as spoken digits in a string.
    pub fn number_slot(&self, key: &str) -> Option<i64> {
        match self.slots.get(key)? {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkillIntent {
    PlayMovie { title: Option<String> },
    PlayMusic { query: Option<Query> },
    PlayYoutube { video_id: Option<String>, playlist_id: Option<String> },
    FollowUp(Signal),
    /// "stop" cancels a pending question, otherwise stops playback.
    Stop,
    Pause,
    Resume,
    Subtitles { enabled: bool },
    SetVolume { level: Option<i64> },
    Mute { muted: bool },
    Seek(SeekStep),
    Navigate { key: NavigationKey, times: u32 },
    Notifications { enabled: bool },
    Unknown { intent: String },
}

impl SkillIntent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlayMovie { .. } => "play_movie",
            Self::PlayMusic { .. } => "play_music",
            Self::PlayYoutube { .. } => "play_youtube",
            Self::FollowUp(_) => "follow_up",
            Self::Stop => "stop",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Subtitles { .. } => "subtitles",
            Self::SetVolume { .. } => "set_volume",
            Self::Mute { .. } => "mute",
            Self::Seek(_) => "seek",
            Self::Navigate { .. } => "navigate",
            Self::Notifications { .. } => "notifications",
            Self::Unknown { .. } => "unknown",
        }
    }
}

const MEDIA_KEYWORDS: [&str; 4] = ["FilmKeyword", "KodiKeyword", "YoutubeKeyword", "MusicKeyword"];

pub fn classify(request: &SkillRequest) -> SkillIntent {
    match request.intent.as_str() {
        "PlayFilmIntent" | "PlayMovieIntent" => {
            SkillIntent::PlayMovie { title: title_of(request, "title") }
        }
        "PlayMusicIntent" | "PlaySongIntent" => {
            SkillIntent::PlayMusic { query: music_query(request) }
        }
        "PlayYoutubeIntent" => SkillIntent::PlayYoutube {
            video_id: request.text_slot("video_id"),
            playlist_id: request.text_slot("playlist_id"),
        },
        "YesIntent" => SkillIntent::FollowUp(Signal::Yes),
        "NoIntent" => SkillIntent::FollowUp(Signal::No),
        "NextIntent" => SkillIntent::FollowUp(Signal::Next),
        "PlayIntent" => SkillIntent::FollowUp(Signal::Play),
        "CancelIntent" => SkillIntent::FollowUp(Signal::Cancel),
        "StopIntent" => SkillIntent::Stop,
        "PauseIntent" => {
            let targets_media = MEDIA_KEYWORDS.iter().any(|keyword| request.has_keyword(keyword));
            if request.has_keyword("PauseKeyword") && targets_media {
                SkillIntent::Pause
            } else {
                unknown(request)
            }
        }
        "ResumeIntent" => SkillIntent::Resume,
        "SubtitlesOnIntent" => SkillIntent::Subtitles { enabled: true },
        "SubtitlesOffIntent" => SkillIntent::Subtitles { enabled: false },
        "SubtitlesIntent" => {
            match (request.has_keyword("OnKeyword"), request.has_keyword("OffKeyword")) {
                (true, false) => SkillIntent::Subtitles { enabled: true },
                (false, true) => SkillIntent::Subtitles { enabled: false },
                _ => unknown(request),
            }
        }
        "SetVolumeIntent" => SkillIntent::SetVolume { level: request.number_slot("volume") },
        "MuteIntent" => SkillIntent::Mute { muted: true },
        "UnmuteIntent" => SkillIntent::Mute { muted: false },
        "SeekIntent" => SkillIntent::Seek(seek_step(request)),
        "NavigateIntent" => {
            match request.text_slot("direction").as_deref().and_then(navigation_key) {
                Some(key) => SkillIntent::Navigate { key, times: repeat_count(request) },
                None => unknown(request),
            }
        }
        "NotificationsOnIntent" => SkillIntent::Notifications { enabled: true },
        "NotificationsOffIntent" => SkillIntent::Notifications { enabled: false },
        _ => unknown(request),
    }
}

fn unknown(request: &SkillRequest) -> SkillIntent {
    SkillIntent::Unknown { intent: request.intent.clone() }
}

fn music_query(request: &SkillRequest) -> Option<Query> {
    if let Some(artist) = request.text_slot("artist") {
        return Some(Query::new(artist, QueryCategory::Artist));
    }
    if let Some(album) = request.text_slot("album") {
        return Some(Query::new(album, QueryCategory::Album));
    }
    let title = title_of(request, "title")?;
    let category =
        if request.has_keyword("SongKeyword") { QueryCategory::Label } else { QueryCategory::Any };
    Some(Query::new(title, category))
}

fn seek_step(request: &SkillRequest) -> SeekStep {
    if let Some(step) = request.text_slot("step") {
        match step.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "small_backward" => return SeekStep::SmallBackward,
            "big_forward" => return SeekStep::BigForward,
            "big_backward" => return SeekStep::BigBackward,
            "small_forward" => return SeekStep::SmallForward,
            _ => {}
        }
    }
    let backward = request.has_keyword("BackwardKeyword");
    let big = request.has_keyword("BigKeyword");
    match (backward, big) {
        (false, false) => SeekStep::SmallForward,
        (true, false) => SeekStep::SmallBackward,
        (false, true) => SeekStep::BigForward,
        (true, true) => SeekStep::BigBackward,
    }
}

fn navigation_key(direction: &str) -> Option<NavigationKey> {
    let key = match direction.trim().to_ascii_lowercase().as_str() {
        "up" => NavigationKey::Up,
        "down" => NavigationKey::Down,
        "left" => NavigationKey::Left,
        "right" => NavigationKey::Right,
        "select" | "ok" | "enter" => NavigationKey::Select,
        "back" => NavigationKey::Back,
        "home" => NavigationKey::Home,
        "info" => NavigationKey::Info,
        "context" | "menu" | "context menu" | "context_menu" => NavigationKey::ContextMenu,
        _ => return None,
    };
    Some(key)
}

/// Missing, zero or negative counts mean a single press.
fn repeat_count(request: &SkillRequest) -> u32 {
    request
        .number_slot("times")
        .and_then(|times| u32::try_from(times).ok())
        .filter(|times| *times > 0)
        .unwrap_or(1)
}

const LEADING_FILLER: [&str; 14] = [
    "play", "start", "put", "on", "watch", "listen", "to", "the", "movie", "film", "song",
    "track", "music", "some",
];
const TRAILING_FILLER: [&str; 4] = ["please", "kodi", "on", "now"];

fn title_of(request: &SkillRequest, slot: &str) -> Option<String> {
    request.text_slot(slot).or_else(|| extract_title(&request.utterance))
}

/// Strips command words around the title: "play the movie iron man please" gives "iron man".
pub fn extract_title(utterance: &str) -> Option<String> {
    let words: Vec<&str> = utterance.split_whitespace().collect();
    let is_filler =
        |word: &str, list: &[&str]| list.iter().any(|filler| filler.eq_ignore_ascii_case(word));

    let start = words.iter().position(|word| !is_filler(word, &LEADING_FILLER))?;
    let end = words
        .iter()
        .rposition(|word| !is_filler(word, &TRAILING_FILLER))
        .map(|index| index + 1)
        .unwrap_or(start);
    if start >= end {
        return None;
    }
    Some(words[start..end].join(" "))
}
