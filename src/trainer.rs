//! The operations a presentation layer drives: list, pick, advance, submit,
//! show progress and export.
//!
//! A `Trainer` holds only read-only data (catalog and policy) and can be
//! shared freely. All mutable state lives in the `SessionState` passed in.

use std::path::Path;
use std::sync::Arc;

use rand::Rng;
use serde_json::json;

use crate::catalog::{Catalog, Dilemma, Resource};
use crate::config::Config;
use crate::error::{Result, TrainerError};
use crate::export;
use crate::logging::{
    log_catalog_loaded, log_export, log_progress, log_rejected_submission, log_selection,
    log_submission,
};
use crate::scoring::{self, Aggregate, Progress, ScorePolicy};
use crate::selection::Transition;
use crate::session::{Response, SessionState};

#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub response: Response,
    pub feedback: String,
    pub resources: Vec<Resource>,
    pub aggregate: Aggregate,
    pub progress: Progress,
}

#[derive(Debug, Clone)]
pub struct Trainer {
    catalog: Arc<Catalog>,
    policy: ScorePolicy,
}

impl Trainer {
    pub fn new(catalog: Arc<Catalog>, policy: ScorePolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let (catalog, source) = match &cfg.catalog_path {
            Some(path) => (Catalog::from_path(path)?, path.display().to_string()),
            None => (Catalog::builtin()?, "builtin".to_string()),
        };
        log_catalog_loaded(&source, catalog.len(), catalog.fingerprint());
        Ok(Self::new(Arc::new(catalog), cfg.score_policy()))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn policy(&self) -> &ScorePolicy {
        &self.policy
    }

    /// Titles in catalog order, for a picker.
    pub fn list_dilemmas(&self) -> Vec<&str> {
        self.catalog.titles()
    }

    /// New session with a randomly chosen current dilemma.
    pub fn start_session<R: Rng + ?Sized>(&self, rng: &mut R) -> SessionState {
        let mut session = SessionState::create();
        self.ensure_selected(&mut session, rng);
        session
    }

    pub fn ensure_selected<R: Rng + ?Sized>(&self, session: &mut SessionState, rng: &mut R) {
        if session.selection.initialize(&self.catalog, rng) == Transition::Changed {
            if let Some(id) = session.selection.current_id() {
                log_selection(session.id().as_str(), id, "random");
            }
        }
    }

    pub fn get_current(&self, session: &SessionState) -> Result<&Dilemma> {
        let id = session.selection.current_id().ok_or(TrainerError::NoSelection)?;
        self.catalog.get_by_id(id)
    }

    pub fn advance(&self, session: &mut SessionState) -> &Dilemma {
        let dilemma = session.selection.advance(&self.catalog);
        log_selection(session.id().as_str(), &dilemma.id, "advance");
        dilemma
    }

    pub fn select(&self, session: &mut SessionState, id: &str) -> Result<Transition> {
        let t = session.selection.select(&self.catalog, id)?;
        if t == Transition::Changed {
            log_selection(session.id().as_str(), id, "explicit");
        }
        Ok(t)
    }

    pub fn select_by_title(&self, session: &mut SessionState, title: &str) -> Result<Transition> {
        let t = session.selection.select_by_title(&self.catalog, title)?;
        if t == Transition::Changed {
            if let Some(id) = session.selection.current_id() {
                log_selection(session.id().as_str(), id, "title");
            }
        }
        Ok(t)
    }

    /// The user touched a choice; only the first touch is kept.
    pub fn record_interaction(&self, session: &mut SessionState) {
        session.record_first_interaction();
    }

    /// Score `choice_key` against `dilemma_id` and append the response.
    /// On error nothing is recorded.
    pub fn submit(&self, session: &mut SessionState, dilemma_id: &str, choice_key: &str) -> Result<SubmitOutcome> {
        let dilemma = self.catalog.get_by_id(dilemma_id)?;
        let response = match scoring::submit_choice(dilemma, choice_key, &session.response_context()) {
            Ok(r) => r,
            Err(err) => {
                log_rejected_submission(session.id().as_str(), dilemma_id, &err.to_string());
                return Err(err);
            }
        };
        session.append_response(response.clone());
        log_submission(
            session.id().as_str(),
            dilemma_id,
            &response.choice_key,
            response.score,
            session.responses().len(),
        );

        let progress = self.progress(session);
        log_progress(session.id().as_str(), json!(progress));
        Ok(SubmitOutcome {
            feedback: response.feedback.clone(),
            resources: dilemma.resources.clone(),
            aggregate: scoring::aggregate(session.responses()),
            progress,
            response,
        })
    }

    /// Submit against whatever dilemma is current.
    pub fn submit_current(&self, session: &mut SessionState, choice_key: &str) -> Result<SubmitOutcome> {
        let id = self.get_current(session)?.id.clone();
        self.submit(session, &id, choice_key)
    }

    pub fn progress(&self, session: &SessionState) -> Progress {
        self.policy.progress(session.responses())
    }

    pub fn export(&self, session: &SessionState) -> Vec<[String; 11]> {
        export::rows(session.responses())
    }

    pub fn export_csv(&self, session: &SessionState) -> String {
        log_export(session.id().as_str(), session.responses().len(), "memory");
        export::to_csv(session.responses())
    }

    pub fn export_to_file(&self, session: &SessionState, path: &Path) -> anyhow::Result<usize> {
        let n = export::write_csv_file(path, session.responses())?;
        log_export(session.id().as_str(), n, &path.display().to_string());
        Ok(n)
    }
}
