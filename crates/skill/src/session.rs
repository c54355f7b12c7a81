use kodi_voice_core::{CatalogEntry, DialogEngine, DialogState};
use uuid::Uuid;

/// Everything the skill remembers between utterances of one conversation.
#[derive(Clone, Debug)]
pub struct Session {
    pub id: String,
    pub dialog: DialogEngine,
    pub notifications_enabled: bool,
    music_catalog: Option<Vec<CatalogEntry>>,
}

impl Session {
    pub fn new(notifications_enabled: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            dialog: DialogEngine::new(),
            notifications_enabled,
            music_catalog: None,
        }
    }

    pub fn state(&self) -> DialogState {
        self.dialog.state()
    }

    pub fn cached_songs(&self) -> Option<&[CatalogEntry]> {
        self.music_catalog.as_deref()
    }

    pub fn cache_songs(&mut self, songs: Vec<CatalogEntry>) -> &[CatalogEntry] {
        self.music_catalog.insert(songs).as_slice()
    }

    pub fn invalidate_music_cache(&mut self) {
        self.music_catalog = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(false)
    }
}
