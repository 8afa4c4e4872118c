//! Per-author contribution statistics (lines added, removed, net) across a set
//! of git repositories.
//!
//! The engine builds one `git log --numstat` query per (repository, author group)
//! pair, runs it through a shell with a bounded wait, parses the summed
//! `added,removed,net` output and aggregates it per repository and per author.

pub mod aggregate;
pub mod author;
pub mod cli;
pub mod error;
pub mod git;
pub mod model;
pub mod numstat;
pub mod observer;
pub mod orchestrator;
pub mod query;
pub mod repos;
pub mod runner;
pub mod settings;
pub mod stats;
pub mod tool;

pub use aggregate::{AggregateState, Aggregator};
pub use author::parse_author_spec;
pub use error::{ContribError, Result};
pub use model::{AuthorGroup, ContributionTriple, DateWindow, RepositorySelection};
pub use observer::{NoopObserver, RunObserver};
pub use orchestrator::{Orchestrator, RunHandle, RunRequest, RunResult, RunState};
pub use tool::ExternalTool;
