//! ctk-engine - Fixture Execution Engine
//!
//! Discovers fixtures, turns their [`Instructions`](ctk_directive::Instructions)
//! into an execution [`Plan`], runs the plan against an external compiler and
//! runtime inside a per-fixture [`Sandbox`], and aggregates the resulting
//! [`Outcome`]s into a [`RunReport`].
//!
//! # Pipeline
//!
//! ```text
//! Catalog ──(Fixture, Instructions)──▶ SandboxExecutor ──Outcome──▶ Orchestrator ──▶ RunReport
//!                                       │
//!                                       ├─ Plan::build
//!                                       ├─ Sandbox::create / materialize
//!                                       ├─ compile / clean / run (process::run_tool)
//!                                       └─ Sandbox::finalize
//! ```
//!
//! Only the [`Orchestrator`] is concurrent. Every other component is
//! sequential given its inputs, and execution problems of one fixture are
//! reported as that fixture's [`Outcome`], never as an error.

#![warn(missing_docs)]

pub mod catalog;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod outcome;
pub mod plan;
pub mod process;
pub mod sandbox;

pub use catalog::{limit, Catalog, CatalogEntry, CatalogSummary, Fixture, FixtureList};
pub use error::{EngineError, Result};
pub use executor::{ExecMode, ExecutorConfig, SandboxExecutor};
pub use orchestrator::{Orchestrator, OrchestratorOptions};
pub use outcome::{reasons, FixtureResult, Outcome, OutcomeKind, RunReport};
pub use plan::{CompileSet, CopyEntry, Plan, PlanStage};
pub use sandbox::Sandbox;
