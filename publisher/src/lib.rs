//! # Build metrics publisher
//!
//! Turns the artifacts of a single build (job metadata, coverage, analysis results, load tests, change logs and
//! user supplied data) into InfluxDB points and writes them to every configured target.
//!
//! ## Architecture
//!
//! - **`point`**: the [`Point`] model and its line protocol encoding
//! - **`renderer`**: renders the project name every point is tagged with
//! - **`build`**: the read-only [`Build`] facade of the host build system
//! - **`generators`**: one [`PointGenerator`] per data source
//! - **`orchestrator`**: runs all generators tolerantly and publishes the batch
//! - **`writer`**: batched writes to the targets, one request per target
//!
//! A failing generator never blocks the others, and a failing target never blocks the remaining targets. The
//! only error that leaves the crate is [`InfluxReportError`], and only for targets configured to expose it.

#[macro_use]
extern crate tracing;

pub mod build;
pub mod error;
pub mod generators;
pub mod http;
pub mod listener;
pub mod orchestrator;
pub mod point;
pub mod renderer;
pub mod reports;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use build::{
    Build,
    BuildResult,
    ChangeLogEntry,
    ReportKind,
    TestSummary,
};
pub use error::{
    InfluxReportError,
    PointError,
    WriteError,
};
pub use generators::{
    Availability,
    PointContext,
    PointGenerator,
};
pub use listener::{
    ConsoleListener,
    TaskListener,
};
pub use orchestrator::PublicationOrchestrator;
pub use point::{
    FieldValue,
    Point,
    PointBuilder,
};
pub use renderer::ProjectNameRenderer;
pub use writer::{
    PublishOutcome,
    TargetWriter,
};
