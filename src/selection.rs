//! Which dilemma is current.
//!
//! ```text
//!                 initialize (random)
//!  Uninitialized ───────────────────────► Selected(id)
//!        │                                  │    ▲
//!        │ select(id) / advance (first)     │    │ select(id) / advance (next, wraps)
//!        └─────────────────────────────────►└────┘
//! ```

use rand::Rng;

use crate::catalog::{Catalog, Dilemma};
use crate::error::{Result, TrainerError};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Uninitialized,
    Selected(String),
}

/// Outcome of a selection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed,
    Unchanged,
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    state: SelectionState,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn current_id(&self) -> Option<&str> {
        match &self.state {
            SelectionState::Uninitialized => None,
            SelectionState::Selected(id) => Some(id.as_str()),
        }
    }

    /// Dilemma for the current id, if any and still in the catalog.
    pub fn current<'a>(&self, catalog: &'a Catalog) -> Option<&'a Dilemma> {
        self.current_id().and_then(|id| catalog.get_by_id(id).ok())
    }

    /// Pick uniformly at random when nothing is selected yet.
    pub fn initialize<R: Rng + ?Sized>(&mut self, catalog: &Catalog, rng: &mut R) -> Transition {
        if self.current_id().is_some() {
            return Transition::Unchanged;
        }
        let idx = rng.gen_range(0..catalog.len());
        self.state = SelectionState::Selected(catalog.get_all()[idx].id.clone());
        Transition::Changed
    }

    /// Jump to `id`. Re-selecting the current id is a no-op.
    pub fn select(&mut self, catalog: &Catalog, id: &str) -> Result<Transition> {
        if catalog.index_of(id).is_none() {
            return Err(TrainerError::InvalidSelection { id: id.to_string() });
        }
        if self.current_id() == Some(id) {
            return Ok(Transition::Unchanged);
        }
        self.state = SelectionState::Selected(id.to_string());
        Ok(Transition::Changed)
    }

    pub fn select_by_title(&mut self, catalog: &Catalog, title: &str) -> Result<Transition> {
        let id = catalog
            .get_by_title(title)
            .map(|d| d.id.clone())
            .ok_or_else(|| TrainerError::InvalidSelection { id: title.to_string() })?;
        self.select(catalog, &id)
    }

    /// Next dilemma in catalog order, wrapping after the last. From
    /// `Uninitialized` (or a stale id) this lands on the first dilemma.
    pub fn advance<'a>(&mut self, catalog: &'a Catalog) -> &'a Dilemma {
        let next = match self.current_id().and_then(|id| catalog.index_of(id)) {
            Some(idx) => (idx + 1) % catalog.len(),
            None => 0,
        };
        let dilemma = &catalog.get_all()[next];
        self.state = SelectionState::Selected(dilemma.id.clone());
        dilemma
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn catalog() -> Catalog {
        Catalog::builtin().unwrap()
    }

    #[test]
    fn initialize_picks_from_catalog_once() {
        let cat = catalog();
        let mut sel = Selection::new();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(sel.initialize(&cat, &mut rng), Transition::Changed);
        let first = sel.current_id().unwrap().to_string();
        assert!(cat.get_by_id(&first).is_ok());
        assert_eq!(sel.initialize(&cat, &mut rng), Transition::Unchanged);
        assert_eq!(sel.current_id(), Some(first.as_str()));
    }

    #[test]
    fn initialize_reaches_every_dilemma() {
        let cat = catalog();
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..400 {
            let mut sel = Selection::new();
            sel.initialize(&cat, &mut rng);
            seen.insert(sel.current_id().unwrap().to_string());
        }
        assert_eq!(seen.len(), cat.len());
    }

    #[test]
    fn select_validates_and_is_idempotent() {
        let cat = catalog();
        let mut sel = Selection::new();
        assert_eq!(sel.select(&cat, "gift_vendor_conference").unwrap(), Transition::Changed);
        assert_eq!(sel.select(&cat, "gift_vendor_conference").unwrap(), Transition::Unchanged);
        let err = sel.select(&cat, "unknown").unwrap_err();
        assert_eq!(err, TrainerError::InvalidSelection { id: "unknown".to_string() });
        assert_eq!(sel.current_id(), Some("gift_vendor_conference"));
    }

    #[test]
    fn select_by_title() {
        let cat = catalog();
        let mut sel = Selection::new();
        let title = cat.get_all()[2].title.clone();
        sel.select_by_title(&cat, &title).unwrap();
        assert_eq!(sel.current_id(), Some("bid_splitting_threshold"));
        assert!(sel.select_by_title(&cat, "no such title").is_err());
    }

    #[test]
    fn advance_wraps_and_closes_cycle() {
        let cat = catalog();
        let mut sel = Selection::new();
        sel.select(&cat, "nepotism_hidden_subcontractor").unwrap();
        assert_eq!(sel.advance(&cat).id, "bribe_supervisor_email");

        let start = sel.current_id().unwrap().to_string();
        for _ in 0..cat.len() {
            sel.advance(&cat);
        }
        assert_eq!(sel.current_id(), Some(start.as_str()));
    }

    #[test]
    fn advance_from_uninitialized_starts_at_first() {
        let cat = catalog();
        let mut sel = Selection::new();
        assert_eq!(sel.advance(&cat).id, "bribe_supervisor_email");
        assert_eq!(sel.current(&cat).unwrap().id, "bribe_supervisor_email");
    }
}
