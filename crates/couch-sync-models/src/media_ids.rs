use serde::{Deserialize, Serialize};

/// External identifiers for a movie, show, or episode.
///
/// Both sides of a sync attach whatever provider IDs they know about. Two
/// items refer to the same entity iff at least one provider key carries the
/// same non-empty value on both sides. Identifier sets are immutable once a
/// catalog is loaded; `merge` is only used on cloned update items.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaIds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tvdb: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trakt: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl MediaIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the two sets share at least one ID of the same provider.
    pub fn matches(&self, other: &MediaIds) -> bool {
        if let (Some(a), Some(b)) = (&self.imdb, &other.imdb) {
            if !a.is_empty() && a == b {
                return true;
            }
        }
        if let (Some(a), Some(b)) = (self.tmdb, other.tmdb) {
            if a == b {
                return true;
            }
        }
        if let (Some(a), Some(b)) = (self.tvdb, other.tvdb) {
            if a == b {
                return true;
            }
        }
        if let (Some(a), Some(b)) = (self.trakt, other.trakt) {
            if a == b {
                return true;
            }
        }
        if let (Some(a), Some(b)) = (&self.slug, &other.slug) {
            if !a.is_empty() && a == b {
                return true;
            }
        }
        false
    }

    /// Fill in missing IDs from another set. Existing values are kept.
    pub fn merge(&mut self, other: &MediaIds) {
        if self.imdb.is_none() {
            self.imdb = other.imdb.clone();
        }
        if self.tmdb.is_none() {
            self.tmdb = other.tmdb;
        }
        if self.tvdb.is_none() {
            self.tvdb = other.tvdb;
        }
        if self.trakt.is_none() {
            self.trakt = other.trakt;
        }
        if self.slug.is_none() {
            self.slug = other.slug.clone();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.imdb.as_deref().map_or(true, str::is_empty)
            && self.tmdb.is_none()
            && self.tvdb.is_none()
            && self.trakt.is_none()
            && self.slug.as_deref().map_or(true, str::is_empty)
    }

    /// Best single ID for log lines, preferring imdb.
    pub fn label(&self) -> String {
        self.imdb
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| self.trakt.map(|id| format!("trakt:{}", id)))
            .or_else(|| self.tmdb.map(|id| format!("tmdb:{}", id)))
            .or_else(|| self.tvdb.map(|id| format!("tvdb:{}", id)))
            .or_else(|| self.slug.clone().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "no id".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_on_any_shared_provider() {
        let a = MediaIds {
            imdb: Some("tt0137523".to_string()),
            tvdb: Some(81189),
            ..MediaIds::default()
        };
        let b = MediaIds {
            tvdb: Some(81189),
            trakt: Some(42),
            ..MediaIds::default()
        };
        assert!(a.matches(&b));

        let c = MediaIds {
            trakt: Some(43),
            ..MediaIds::default()
        };
        assert!(!a.matches(&c));
    }

    #[test]
    fn test_empty_strings_never_match() {
        let a = MediaIds {
            imdb: Some(String::new()),
            ..MediaIds::default()
        };
        let b = MediaIds {
            imdb: Some(String::new()),
            ..MediaIds::default()
        };
        assert!(!a.matches(&b));
        assert!(a.is_empty());
    }

    #[test]
    fn test_merge_keeps_existing_values() {
        let mut a = MediaIds {
            imdb: Some("tt0137523".to_string()),
            ..MediaIds::default()
        };
        let b = MediaIds {
            imdb: Some("tt9999999".to_string()),
            tmdb: Some(550),
            ..MediaIds::default()
        };
        a.merge(&b);
        assert_eq!(a.imdb.as_deref(), Some("tt0137523"));
        assert_eq!(a.tmdb, Some(550));
    }
}
