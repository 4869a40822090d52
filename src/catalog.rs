//! Exploration catalogs and pattern enumeration.
//!
//! The exploration universe is the cartesian product of two independent,
//! ordered catalogs: audience segments (dimension A) and opportunity themes
//! (dimension B). Enumeration is deterministic and segment-major so that a
//! restarted process derives the exact same universe.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::CorpusError;
use crate::model::PatternKey;

/// Scope id of the whole-batch report.
pub const OVERVIEW_SCOPE_ID: &str = "overview";

/// One audience segment (dimension A).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Stable identifier used in pattern keys and scope filters.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short characterization embedded into prompts.
    pub profile: String,
}

/// One opportunity theme (dimension B).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    /// Stable identifier used in pattern keys.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short characterization embedded into prompts.
    pub angle: String,
}

/// A named subset (or the whole) of a batch's result items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Stable identifier, unique per batch.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Segment id to filter result items by; `None` means the whole batch.
    pub segment_filter: Option<String>,
}

impl Scope {
    /// The whole-batch overview scope.
    pub fn overview() -> Self {
        Self {
            id: OVERVIEW_SCOPE_ID.to_string(),
            name: "Overview".to_string(),
            segment_filter: None,
        }
    }

    /// A scope covering a single segment's result items.
    pub fn for_segment(segment: &Segment) -> Self {
        Self {
            id: segment.id.clone(),
            name: segment.name.clone(),
            segment_filter: Some(segment.id.clone()),
        }
    }
}

/// The ordered segment and theme catalogs driving one exploration universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub segments: Vec<Segment>,
    pub themes: Vec<Theme>,
}

impl Catalog {
    /// Creates a catalog from explicit segment and theme lists.
    pub fn new(segments: Vec<Segment>, themes: Vec<Theme>) -> Self {
        Self { segments, themes }
    }

    /// Loads a catalog from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, CorpusError> {
        let raw = std::fs::read_to_string(path)?;
        let catalog: Catalog = serde_json::from_str(&raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(catalog)
    }

    /// Returns true if either dimension is empty, i.e. the universe is empty.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() || self.themes.is_empty()
    }

    /// Universe size: |segments| x |themes|.
    pub fn universe_size(&self) -> usize {
        self.segments.len() * self.themes.len()
    }

    /// Enumerates the full pattern universe in segment-major order.
    ///
    /// Deterministic and side-effect free: the same catalog always yields
    /// the same keys in the same order.
    pub fn enumerate_patterns(&self) -> Vec<PatternKey> {
        let mut keys = Vec::with_capacity(self.universe_size());
        for segment in &self.segments {
            for theme in &self.themes {
                keys.push(PatternKey::new(segment.id.clone(), theme.id.clone()));
            }
        }
        keys
    }

    /// Derives the report scopes for this catalog: one per segment plus the
    /// whole-batch overview scope, overview first.
    pub fn scopes(&self) -> Vec<Scope> {
        let mut scopes = Vec::with_capacity(self.segments.len() + 1);
        scopes.push(Scope::overview());
        scopes.extend(self.segments.iter().map(Scope::for_segment));
        scopes
    }

    /// Looks up a segment by id.
    pub fn segment(&self, id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// Looks up a theme by id.
    pub fn theme(&self, id: &str) -> Option<&Theme> {
        self.themes.iter().find(|t| t.id == id)
    }
}

impl Default for Catalog {
    /// Built-in catalog used when no catalog file is configured.
    fn default() -> Self {
        let segments = vec![
            Segment {
                id: "smb-operators".to_string(),
                name: "Small business operators".to_string(),
                profile: "Owner-operators of small businesses with limited staffing \
                          and tight cash flow, pragmatic about tooling"
                    .to_string(),
            },
            Segment {
                id: "mid-market-ops".to_string(),
                name: "Mid-market operations teams".to_string(),
                profile: "Operations leads at growing companies juggling handoffs \
                          between sales, fulfillment and support"
                    .to_string(),
            },
            Segment {
                id: "solo-professionals".to_string(),
                name: "Solo professionals".to_string(),
                profile: "Independent consultants and freelancers who trade time for \
                          money and guard it jealously"
                    .to_string(),
            },
            Segment {
                id: "enterprise-it".to_string(),
                name: "Enterprise IT groups".to_string(),
                profile: "IT groups in large organizations with procurement rules, \
                          compliance pressure and legacy systems"
                    .to_string(),
            },
        ];

        let themes = vec![
            Theme {
                id: "workflow-automation".to_string(),
                name: "Workflow automation".to_string(),
                angle: "Removing repetitive manual steps from day-to-day processes".to_string(),
            },
            Theme {
                id: "insight-surfacing".to_string(),
                name: "Insight surfacing".to_string(),
                angle: "Turning data the audience already has into decisions".to_string(),
            },
            Theme {
                id: "customer-communication".to_string(),
                name: "Customer communication".to_string(),
                angle: "Faster, more consistent outbound and inbound communication".to_string(),
            },
            Theme {
                id: "cost-reduction".to_string(),
                name: "Cost reduction".to_string(),
                angle: "Cutting recurring spend without cutting capability".to_string(),
            },
            Theme {
                id: "new-revenue".to_string(),
                name: "New revenue".to_string(),
                angle: "Opening an additional line of business from existing assets".to_string(),
            },
        ];

        Self { segments, themes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn small_catalog(m: usize, n: usize) -> Catalog {
        let segments = (0..m)
            .map(|i| Segment {
                id: format!("seg-{}", i),
                name: format!("Segment {}", i),
                profile: String::new(),
            })
            .collect();
        let themes = (0..n)
            .map(|i| Theme {
                id: format!("theme-{}", i),
                name: format!("Theme {}", i),
                angle: String::new(),
            })
            .collect();
        Catalog::new(segments, themes)
    }

    #[test]
    fn test_universe_size_is_product() {
        for (m, n) in [(1, 1), (2, 3), (4, 5), (7, 2)] {
            let catalog = small_catalog(m, n);
            let keys = catalog.enumerate_patterns();
            assert_eq!(keys.len(), m * n);
            assert_eq!(catalog.universe_size(), m * n);
        }
    }

    #[test]
    fn test_pattern_keys_are_distinct() {
        let catalog = small_catalog(4, 5);
        let keys = catalog.enumerate_patterns();
        let unique: HashSet<_> = keys.iter().cloned().collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn test_enumeration_is_segment_major_and_stable() {
        let catalog = small_catalog(2, 2);
        let keys = catalog.enumerate_patterns();
        assert_eq!(keys[0], PatternKey::new("seg-0", "theme-0"));
        assert_eq!(keys[1], PatternKey::new("seg-0", "theme-1"));
        assert_eq!(keys[2], PatternKey::new("seg-1", "theme-0"));
        assert_eq!(keys[3], PatternKey::new("seg-1", "theme-1"));

        // Repeatable.
        assert_eq!(keys, catalog.enumerate_patterns());
    }

    #[test]
    fn test_empty_catalog_yields_zero_patterns() {
        let catalog = small_catalog(0, 5);
        assert!(catalog.is_empty());
        assert!(catalog.enumerate_patterns().is_empty());

        let catalog = small_catalog(3, 0);
        assert!(catalog.is_empty());
        assert_eq!(catalog.universe_size(), 0);
    }

    #[test]
    fn test_scopes_overview_first_then_segments() {
        let catalog = small_catalog(3, 2);
        let scopes = catalog.scopes();
        assert_eq!(scopes.len(), 4);
        assert_eq!(scopes[0].id, OVERVIEW_SCOPE_ID);
        assert!(scopes[0].segment_filter.is_none());
        assert_eq!(scopes[1].segment_filter.as_deref(), Some("seg-0"));
    }

    #[test]
    fn test_default_catalog_nonempty() {
        let catalog = Catalog::default();
        assert!(!catalog.is_empty());
        assert_eq!(
            catalog.universe_size(),
            catalog.segments.len() * catalog.themes.len()
        );
    }
}
