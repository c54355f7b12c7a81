use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::catalog::{CatalogEntry, MatchSet, Query, QueryCategory};
use crate::normalize::{normalize, tokens};

const FALLBACK_ORDER: [QueryCategory; 3] =
    [QueryCategory::Label, QueryCategory::Artist, QueryCategory::Album];

/// How repeated labels in a match list are collapsed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Drop an entry whose normalized label equals one already kept.
    #[default]
    Normalized,
    /// Drop an entry only when its raw label string is identical to one already kept.
    Exact,
}

impl std::str::FromStr for DedupPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normalized" => Ok(Self::Normalized),
            "exact" => Ok(Self::Exact),
            other => Err(format!("unsupported dedup policy `{other}` (expected normalized|exact)")),
        }
    }
}

/// Matches and the category that produced them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub category: QueryCategory,
    pub matches: MatchSet,
}

#[derive(Clone, Debug, Default)]
pub struct EntityResolver {
    dedup: DedupPolicy,
}

impl EntityResolver {
    pub fn new(dedup: DedupPolicy) -> Self {
        Self { dedup }
    }

    pub fn resolve(&self, query: &Query, catalog: &[CatalogEntry]) -> MatchSet {
        self.resolve_detailed(query, catalog).matches
    }

    /// Resolves `query`; `QueryCategory::Any` tries label, artist, then album and stops
    /// at the first non-empty result.
    pub fn resolve_detailed(&self, query: &Query, catalog: &[CatalogEntry]) -> Resolution {
        let query_tokens = tokens(&query.raw_text);

        let resolution = match query.category {
            QueryCategory::Any => FALLBACK_ORDER
                .iter()
                .map(|category| Resolution {
                    category: *category,
                    matches: self.match_category(&query_tokens, *category, catalog),
                })
                .find(|resolution| !resolution.matches.is_empty())
                .unwrap_or(Resolution {
                    category: QueryCategory::Any,
                    matches: MatchSet::default(),
                }),
            category => Resolution {
                category,
                matches: self.match_category(&query_tokens, category, catalog),
            },
        };

        debug!(
            event_name = "resolver.resolved",
            requested_category = query.category.as_str(),
            matched_category = resolution.category.as_str(),
            catalog_size = catalog.len(),
            match_count = resolution.matches.len(),
            "query resolved against catalog"
        );
        resolution
    }

    fn match_category(
        &self,
        query_tokens: &[String],
        category: QueryCategory,
        catalog: &[CatalogEntry],
    ) -> MatchSet {
        if query_tokens.is_empty() {
            return MatchSet::default();
        }

        let matched = catalog.iter().filter(|entry| {
            comparison_field(entry, category)
                .map(|field| field_matches(&normalize(field), query_tokens))
                .unwrap_or(false)
        });

        self.dedup(matched)
    }

    fn dedup<'a>(&self, matched: impl Iterator<Item = &'a CatalogEntry>) -> MatchSet {
        let mut seen_labels = BTreeSet::new();
        let mut kept = Vec::new();
        for entry in matched {
            let key = match self.dedup {
                DedupPolicy::Normalized => normalize(&entry.label),
                DedupPolicy::Exact => entry.label.clone(),
            };
            if seen_labels.insert(key) {
                kept.push(entry.clone());
            }
        }
        MatchSet::new(kept)
    }
}

fn comparison_field(entry: &CatalogEntry, category: QueryCategory) -> Option<&str> {
    match category {
        QueryCategory::Label | QueryCategory::Any => Some(entry.label.as_str()),
        QueryCategory::Artist => entry.first_artist(),
        QueryCategory::Album => entry.album(),
    }
}

/// Every query token must start one of the field's words. A token may be a prefix of a
/// longer word ("man" matches "manual") but cannot begin mid-word ("man" does not match
/// "ironman").
fn field_matches(normalized_field: &str, query_tokens: &[String]) -> bool {
    query_tokens
        .iter()
        .all(|token| normalized_field.split(' ').any(|word| word.starts_with(token.as_str())))
}
