//! Red Line: an anti-corruption dilemma trainer.
//!
//! The core is a small session/scoring engine:
//!
//! ```text
//! ┌──────────────┐   pick    ┌──────────────┐  choice   ┌──────────────┐
//! │   Catalog    │──────────►│  Selection   │──────────►│   Scoring    │
//! │ (read-only)  │           │ (per session)│           │ (pure fns)   │
//! └──────────────┘           └──────────────┘           └──────┬───────┘
//!                                                              │ Response
//!                                                              ▼
//!                                                       ┌──────────────┐
//!                                                       │   Session    │──► export (CSV)
//!                                                       │ (append-only)│
//!                                                       └──────────────┘
//! ```
//!
//! [`trainer::Trainer`] ties the pieces together for a presentation layer.

pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod scoring;
pub mod selection;
pub mod session;
pub mod share;
pub mod trainer;

pub use catalog::{Catalog, Choice, Dilemma, Resource};
pub use error::TrainerError;
pub use scoring::{aggregate, derive_badge, Aggregate, Badge, Progress, ScorePolicy};
pub use session::{Response, SessionId, SessionRegistry, SessionState};
pub use trainer::{SubmitOutcome, Trainer};
