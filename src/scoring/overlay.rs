//! Pending operator changes layered over authoritative team results.

use indexmap::IndexMap;

use crate::scoring::team::{StageResult, TeamId};

/// Unsaved values for one team, seeded from its authoritative result.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub score: f64,
    pub rank: String,
    pub medal: String,
    pub flag: String,
    pub dirty: bool,
}

impl Edit {
    fn seeded(authoritative: &StageResult) -> Self {
        Self {
            score: authoritative.score,
            rank: authoritative.rank.clone(),
            medal: authoritative.medal.clone(),
            flag: authoritative.flag.clone(),
            dirty: false,
        }
    }

    fn to_result(&self) -> StageResult {
        StageResult {
            score: self.score,
            rank: self.rank.clone(),
            medal: self.medal.clone(),
            flag: self.flag.clone(),
        }
    }
}

/// Single-field change applied by an operator.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    /// New score; callers validate the `[-1, 100]` domain beforehand.
    Score(f64),
    Rank(String),
    Medal(String),
    Flag(String),
}

/// Edits of one scoring session, keyed by team and kept in edit order.
#[derive(Debug, Clone, Default)]
pub struct EditOverlay {
    edits: IndexMap<TeamId, Edit>,
}

impl EditOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, team_id: &str) -> Option<&Edit> {
        self.edits.get(team_id)
    }

    /// Apply `change` to the team's edit, seeding it from `authoritative` first.
    pub fn set(&mut self, team_id: &str, change: FieldChange, authoritative: &StageResult) {
        let edit = self
            .edits
            .entry(team_id.to_string())
            .or_insert_with(|| Edit::seeded(authoritative));

        match change {
            FieldChange::Score(score) => edit.score = score,
            FieldChange::Rank(rank) => edit.rank = rank,
            FieldChange::Medal(medal) => edit.medal = medal,
            FieldChange::Flag(flag) => edit.flag = flag,
        }
        edit.dirty = true;
    }

    /// Effective values: the edit when present, the authoritative result otherwise.
    pub fn resolve(&self, team_id: &str, authoritative: &StageResult) -> StageResult {
        self.edits
            .get(team_id)
            .map(Edit::to_result)
            .unwrap_or_else(|| authoritative.clone())
    }

    /// Drop the edit of a team, typically once its values were persisted.
    pub fn clear(&mut self, team_id: &str) -> Option<Edit> {
        self.edits.shift_remove(team_id)
    }

    /// Abandon every pending edit.
    pub fn discard(&mut self) {
        self.edits.clear();
    }

    pub fn is_dirty(&self, team_id: &str) -> bool {
        self.edits.get(team_id).is_some_and(|edit| edit.dirty)
    }

    /// Teams with unsaved changes, in the order they were first edited.
    ///
    /// The overlay knows nothing about visibility; callers intersect with their own view.
    pub fn dirty_ids(&self) -> Vec<TeamId> {
        self.edits
            .iter()
            .filter(|(_, edit)| edit.dirty)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> StageResult {
        StageResult {
            score: 75.0,
            rank: "2".into(),
            medal: String::new(),
            flag: "TRUE".into(),
        }
    }

    #[test]
    fn resolve_without_edit_returns_authoritative() {
        let overlay = EditOverlay::new();
        assert_eq!(overlay.resolve("t1", &stored()), stored());
        assert!(!overlay.is_dirty("t1"));
    }

    #[test]
    fn set_seeds_untouched_fields_from_authoritative() {
        let mut overlay = EditOverlay::new();
        overlay.set("t1", FieldChange::Score(88.0), &stored());

        let resolved = overlay.resolve("t1", &stored());
        assert_eq!(resolved.score, 88.0);
        assert_eq!(resolved.rank, "2");
        assert_eq!(resolved.flag, "TRUE");
        assert!(overlay.is_dirty("t1"));
    }

    #[test]
    fn later_changes_keep_earlier_ones() {
        let mut overlay = EditOverlay::new();
        overlay.set("t1", FieldChange::Score(88.0), &stored());
        overlay.set("t1", FieldChange::Medal("Gold".into()), &stored());
        overlay.set("t1", FieldChange::Flag(String::new()), &stored());

        let edit = overlay.get("t1").unwrap();
        assert_eq!(edit.score, 88.0);
        assert_eq!(edit.medal, "Gold");
        assert!(edit.flag.is_empty());
        assert_eq!(overlay.len(), 1);
    }

    #[test]
    fn overlay_does_not_clamp_scores() {
        let mut overlay = EditOverlay::new();
        overlay.set("t1", FieldChange::Score(140.0), &stored());
        assert_eq!(overlay.resolve("t1", &stored()).score, 140.0);
    }

    #[test]
    fn resolve_is_idempotent() {
        let mut overlay = EditOverlay::new();
        overlay.set("t1", FieldChange::Rank("1".into()), &stored());
        let first = overlay.resolve("t1", &stored());
        let second = overlay.resolve("t1", &stored());
        assert_eq!(first, second);
        assert_eq!(overlay.dirty_ids(), vec!["t1".to_string()]);
    }

    #[test]
    fn clear_and_discard_remove_edits() {
        let mut overlay = EditOverlay::new();
        overlay.set("t1", FieldChange::Score(10.0), &stored());
        overlay.set("t2", FieldChange::Score(20.0), &stored());
        overlay.set("t3", FieldChange::Score(30.0), &stored());

        assert!(overlay.clear("t2").is_some());
        assert_eq!(overlay.dirty_ids(), vec!["t1".to_string(), "t3".to_string()]);
        assert_eq!(overlay.resolve("t2", &stored()), stored());

        overlay.discard();
        assert!(overlay.is_empty());
        assert!(overlay.dirty_ids().is_empty());
    }
}
