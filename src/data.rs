//! Document model for repository records.
//!
//! A [`Repo`] is the unit of indexing: a fixed set of searchable text fields
//! (name, description, owner, language, topics) plus non-textual attributes
//! (stars, forks, timestamps, flags) used for filtering and sorting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A repository record supplied by the caller for indexing.
///
/// Immutable once indexed; updates go through remove-then-reinsert
/// (`Engine::update_index`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repo {
    /// Opaque identifier, unique within the corpus.
    pub id: u64,
    /// Repository name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Owner login.
    #[serde(default)]
    pub owner: String,
    /// Primary language, if any.
    #[serde(default)]
    pub language: Option<String>,
    /// Topic strings.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Stargazer count.
    #[serde(default)]
    pub stars: u64,
    /// Fork count.
    #[serde(default)]
    pub forks: u64,
    /// Watcher count.
    #[serde(default)]
    pub watchers: u64,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Last push timestamp.
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    /// Whether the repository is archived.
    #[serde(default)]
    pub archived: bool,
    /// Whether the repository is itself a fork.
    #[serde(default)]
    pub fork: bool,
}

impl Repo {
    /// Create a minimal record with the given id and name.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Repo {
            id,
            name: name.into(),
            description: String::new(),
            owner: String::new(),
            language: None,
            topics: Vec::new(),
            stars: 0,
            forks: 0,
            watchers: 0,
            created_at: None,
            updated_at: None,
            pushed_at: None,
            archived: false,
            fork: false,
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the owner login.
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Set the primary language.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the topic list.
    pub fn topics(mut self, topics: Vec<String>) -> Self {
        self.topics = topics;
        self
    }

    /// Set the stargazer count.
    pub fn stars(mut self, stars: u64) -> Self {
        self.stars = stars;
        self
    }

    /// Set the fork count.
    pub fn forks(mut self, forks: u64) -> Self {
        self.forks = forks;
        self
    }

    /// Set the creation timestamp.
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Set the update timestamp.
    pub fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    /// Mark the record archived.
    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = archived;
        self
    }

    /// Mark the record as a fork.
    pub fn fork(mut self, fork: bool) -> Self {
        self.fork = fork;
        self
    }

    /// The text content of one searchable field.
    pub fn field_text(&self, field: SearchField) -> String {
        match field {
            SearchField::Name => self.name.clone(),
            SearchField::Description => self.description.clone(),
            SearchField::Owner => self.owner.clone(),
            SearchField::Language => self.language.clone().unwrap_or_default(),
            SearchField::Topics => self.topics.join(" "),
        }
    }

    /// All searchable text concatenated, used for whole-document term
    /// frequency in TF-IDF.
    pub fn concatenated_text(&self) -> String {
        let mut out = String::with_capacity(
            self.name.len() + self.description.len() + self.owner.len() + 32,
        );
        for field in SearchField::ALL {
            let text = self.field_text(field);
            if !text.is_empty() {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(&text);
            }
        }
        out
    }
}

/// The closed set of searchable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Name,
    Description,
    Owner,
    Language,
    Topics,
}

impl SearchField {
    /// All searchable fields, in indexing order.
    pub const ALL: [SearchField; 5] = [
        SearchField::Name,
        SearchField::Description,
        SearchField::Owner,
        SearchField::Language,
        SearchField::Topics,
    ];

    /// Canonical field name as used in `field:value` query clauses.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::Name => "name",
            SearchField::Description => "description",
            SearchField::Owner => "owner",
            SearchField::Language => "language",
            SearchField::Topics => "topics",
        }
    }

    /// Parse a field name, accepting common aliases.
    pub fn parse(name: &str) -> Option<SearchField> {
        match name.to_ascii_lowercase().as_str() {
            "name" => Some(SearchField::Name),
            "description" | "desc" => Some(SearchField::Description),
            "owner" | "user" | "login" => Some(SearchField::Owner),
            "language" | "lang" => Some(SearchField::Language),
            "topics" | "topic" => Some(SearchField::Topics),
            _ => None,
        }
    }

    /// Static scoring weight for this field.
    pub fn default_weight(&self) -> f64 {
        match self {
            SearchField::Name => 2.0,
            SearchField::Description => 1.5,
            SearchField::Owner => 1.2,
            SearchField::Language => 1.0,
            SearchField::Topics => 1.8,
        }
    }
}

impl std::fmt::Display for SearchField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_text_and_concatenation() {
        let repo = Repo::new(1, "react")
            .description("A JavaScript library for building user interfaces")
            .owner("facebook")
            .language("JavaScript")
            .topics(vec!["ui".to_string(), "frontend".to_string()]);

        assert_eq!(repo.field_text(SearchField::Name), "react");
        assert_eq!(repo.field_text(SearchField::Topics), "ui frontend");
        let all = repo.concatenated_text();
        assert!(all.contains("react"));
        assert!(all.contains("facebook"));
        assert!(all.contains("frontend"));
    }

    #[test]
    fn test_field_parse_aliases() {
        assert_eq!(SearchField::parse("owner"), Some(SearchField::Owner));
        assert_eq!(SearchField::parse("LANG"), Some(SearchField::Language));
        assert_eq!(SearchField::parse("topic"), Some(SearchField::Topics));
        assert_eq!(SearchField::parse("stars"), None);
    }
}
