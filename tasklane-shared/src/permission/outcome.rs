/// Access decisions and how per-id results combine into one
///
/// Each requested id gets a `Verdict`. The aggregator folds them into a single
/// `Outcome` where missing ids always win over forbidden ones, so a caller
/// learns about nonexistent resources before learning about permissions.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of resource an access check is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Project,
    Section,
    Task,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Project => "project",
            ResourceKind::Section => "section",
            ResourceKind::Task => "task",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of checking a single id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    NotFound,
    Forbidden,
}

/// Aggregated decision for a batch of ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every id exists and the user may act on all of them
    Allowed,

    /// These ids do not exist (or their owning project cannot be found)
    NotFound(Vec<String>),

    /// Every id exists, but the user is not a member for these
    Forbidden(Vec<String>),
}

impl Outcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Outcome::Allowed)
    }

    /// The ids that caused a denial; empty when allowed
    pub fn denied_ids(&self) -> &[String] {
        match self {
            Outcome::Allowed => &[],
            Outcome::NotFound(ids) | Outcome::Forbidden(ids) => ids,
        }
    }
}

/// Ids that could not be resolved, in request order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not found: {}", .0.join(", "))]
pub struct MissingIds(pub Vec<String>);

/// Folds per-id verdicts into one outcome
///
/// Any `NotFound` produces `Outcome::NotFound` listing exactly those ids.
/// Otherwise any `Forbidden` produces `Outcome::Forbidden` listing exactly
/// those ids. Otherwise (including an empty input) the result is `Allowed`.
/// Ids are reported in the order they are yielded.
pub fn aggregate<I, S>(verdicts: I) -> Outcome
where
    I: IntoIterator<Item = (S, Verdict)>,
    S: Into<String>,
{
    let mut not_found = Vec::new();
    let mut forbidden = Vec::new();

    for (id, verdict) in verdicts {
        match verdict {
            Verdict::Allowed => {}
            Verdict::NotFound => not_found.push(id.into()),
            Verdict::Forbidden => forbidden.push(id.into()),
        }
    }

    if !not_found.is_empty() {
        Outcome::NotFound(not_found)
    } else if !forbidden.is_empty() {
        Outcome::Forbidden(forbidden)
    } else {
        Outcome::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_allowed() {
        let verdicts: Vec<(String, Verdict)> = vec![];
        assert_eq!(aggregate(verdicts), Outcome::Allowed);
    }

    #[test]
    fn test_all_allowed() {
        let outcome = aggregate(vec![("a", Verdict::Allowed), ("b", Verdict::Allowed)]);
        assert!(outcome.is_allowed());
        assert!(outcome.denied_ids().is_empty());
    }

    #[test]
    fn test_not_found_takes_precedence() {
        let outcome = aggregate(vec![
            ("a", Verdict::Forbidden),
            ("b", Verdict::NotFound),
            ("c", Verdict::Allowed),
            ("d", Verdict::NotFound),
        ]);

        assert_eq!(
            outcome,
            Outcome::NotFound(vec!["b".to_string(), "d".to_string()])
        );
    }

    #[test]
    fn test_forbidden_lists_only_forbidden() {
        let outcome = aggregate(vec![
            ("a", Verdict::Allowed),
            ("b", Verdict::Forbidden),
            ("c", Verdict::Forbidden),
        ]);

        assert_eq!(
            outcome,
            Outcome::Forbidden(vec!["b".to_string(), "c".to_string()])
        );
        assert_eq!(outcome.denied_ids(), ["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_resource_kind_display() {
        assert_eq!(ResourceKind::Project.to_string(), "project");
        assert_eq!(ResourceKind::Section.to_string(), "section");
        assert_eq!(ResourceKind::Task.to_string(), "task");
    }

    #[test]
    fn test_missing_ids_display() {
        let err = MissingIds(vec!["x".to_string(), "y".to_string()]);
        assert_eq!(err.to_string(), "not found: x, y");
    }
}
