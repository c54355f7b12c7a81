use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Song,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryExtra {
    /// Kodi reports artists as a list; only the first one takes part in matching.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artist: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub label: String,
    pub kind: MediaKind,
    #[serde(default)]
    pub extra: EntryExtra,
}

impl CatalogEntry {
    pub fn movie(id: i64, label: impl Into<String>) -> Self {
        Self { id, label: label.into(), kind: MediaKind::Movie, extra: EntryExtra::default() }
    }

    pub fn song(
        id: i64,
        label: impl Into<String>,
        artist: Vec<String>,
        album: Option<String>,
    ) -> Self {
        Self { id, label: label.into(), kind: MediaKind::Song, extra: EntryExtra { artist, album } }
    }

    pub fn first_artist(&self) -> Option<&str> {
        self.extra.artist.first().map(String::as_str)
    }

    pub fn album(&self) -> Option<&str> {
        self.extra.album.as_deref()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryCategory {
    Label,
    Artist,
    Album,
    Any,
}

impl QueryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Artist => "artist",
            Self::Album => "album",
            Self::Any => "any",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub raw_text: String,
    pub category: QueryCategory,
}

impl Query {
    pub fn new(raw_text: impl Into<String>, category: QueryCategory) -> Self {
        Self { raw_text: raw_text.into(), category }
    }

    pub fn label(raw_text: impl Into<String>) -> Self {
        Self::new(raw_text, QueryCategory::Label)
    }
}

/// Ordered, deduplicated resolver output. Order follows the catalog, not relevance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSet {
    entries: Vec<CatalogEntry>,
}

impl MatchSet {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn first(&self) -> Option<&CatalogEntry> {
        self.entries.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.label.as_str()).collect()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.entries.iter().map(|entry| entry.id).collect()
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a CatalogEntry;
    type IntoIter = std::slice::Iter<'a, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogEntry, MatchSet, MediaKind};

    #[test]
    fn song_constructor_keeps_artist_order() {
        let song = CatalogEntry::song(
            7,
            "Under Pressure",
            vec!["Queen".to_owned(), "David Bowie".to_owned()],
            Some("Hot Space".to_owned()),
        );

        assert_eq!(song.kind, MediaKind::Song);
        assert_eq!(song.first_artist(), Some("Queen"));
        assert_eq!(song.album(), Some("Hot Space"));
    }

    #[test]
    fn match_set_exposes_labels_in_insertion_order() {
        let set = MatchSet::new(vec![
            CatalogEntry::movie(2, "Iron Man 2"),
            CatalogEntry::movie(1, "Iron Man"),
        ]);

        assert_eq!(set.labels(), vec!["Iron Man 2", "Iron Man"]);
        assert_eq!(set.ids(), vec![2, 1]);
        assert_eq!(set.get(1).map(|entry| entry.id), Some(1));
        assert!(set.get(2).is_none());
    }
}
