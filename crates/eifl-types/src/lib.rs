//! # eifl-types
//!
//! Domain entities, identifiers, and the shared error enumeration for the
//! EIFL continuous-integration core. This crate has no dependency on how
//! entities are stored or dispatched — it is the vocabulary the rest of the
//! workspace (`eifl-store`, `eifl-encrypt`, `eifl`) shares.
//!
//! ## Modules
//!
//! - [`ids`] — `Uuid`-backed identifier newtypes, one per entity
//! - [`timestamp`] — millisecond-precision UTC timestamps
//! - [`error`] — the unified `EiflError` enum
//! - [`manifest`] — the `.eifl.json` pipeline manifest: shape, validation,
//!   branch-pattern matching, and step `if` condition evaluation
//! - [`project`], [`repo`], [`pipeline`], [`run`], [`step`], [`metric`],
//!   [`baseline`], [`runner`], [`secret`] — one module per data-model entity
//! - [`job`] — wire shapes exchanged with runners (`JobPayload`,
//!   `ReceivePackRecord`, `RegressionSummary`)

pub mod baseline;
pub mod error;
pub mod ids;
pub mod job;
pub mod manifest;
pub mod metric;
pub mod pipeline;
pub mod project;
pub mod repo;
pub mod run;
pub mod runner;
pub mod secret;
pub mod step;
pub mod timestamp;

pub use baseline::{Baseline, BaselineComparison};
pub use error::{EiflError, Result};
pub use ids::{
    BaselineId, MetricId, PipelineId, ProjectId, RepoId, RunId, RunnerId, SecretId, StepId,
};
pub use job::{JobPayload, JobStep, ReceivePackRecord, RegressionSummary, ReportedMetric, ZERO_SHA};
pub use manifest::Manifest;
pub use metric::Metric;
pub use pipeline::Pipeline;
pub use project::Project;
pub use repo::Repo;
pub use run::{Run, RunStatus, TriggeredBy};
pub use runner::{Runner, RunnerStatus};
pub use secret::{Secret, SecretScope};
pub use step::{Step, StepStatus};
pub use timestamp::UtcTimestamp;
