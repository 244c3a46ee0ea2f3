//! The read-only view of the host build system.

use crate::reports::{
    CoberturaReport,
    JacocoReport,
    PerfPublisherReport,
    PerformanceReport,
    RobotFrameworkReport,
};
use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    io::{
        self,
        BufRead,
    },
    time::Duration,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
}

impl BuildResult {
    /// Severity order, best first.
    pub fn ordinal(self) -> i64 {
        match self {
            Self::Success => 0,
            Self::Unstable => 1,
            Self::Failure => 2,
            Self::NotBuilt => 3,
            Self::Aborted => 4,
        }
    }

    pub fn is_successful(self) -> bool {
        self == Self::Success
    }

    pub fn status_message(self) -> &'static str {
        match self {
            Self::Success => "stable",
            Self::Unstable => "unstable",
            Self::Failure => "broken",
            Self::NotBuilt => "not built",
            Self::Aborted => "aborted",
        }
    }
}

/// Report formats whose parser may be missing from a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ReportKind {
    Cobertura,
    RobotFramework,
    Jacoco,
    Performance,
    PerfPublisher,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub message: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub affected_paths: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    pub failed: u64,
    pub skipped: u64,
    pub total: u64,
}

/// Everything the generators may ask about the build being published.
pub trait Build {
    fn project_name(&self) -> &str;

    /// Full path of the job, e.g. `folder/project`.
    fn project_path(&self) -> &str {
        self.project_name()
    }

    fn display_name(&self) -> &str;

    fn number(&self) -> u64;

    fn duration(&self) -> Duration;

    /// `None` while the build is still running without a verdict.
    fn result(&self) -> Option<BuildResult>;

    fn start_time(&self) -> DateTime<Utc>;

    /// A fresh, forward-only reader over the console log.
    fn log_reader(&self) -> io::Result<Box<dyn BufRead + '_>>;

    fn env_var(&self, name: &str) -> Option<String>;

    fn parameter(&self, _name: &str) -> Option<String> {
        None
    }

    fn agent_name(&self) -> Option<&str> {
        None
    }

    fn health_score(&self) -> Option<i64> {
        None
    }

    fn test_summary(&self) -> Option<TestSummary> {
        None
    }

    fn change_log(&self) -> &[ChangeLogEntry] {
        &[]
    }

    /// Whether the parser for `kind` is installed at all.
    fn supports(&self, _kind: ReportKind) -> bool {
        true
    }

    fn cobertura_report(&self) -> Option<&CoberturaReport> {
        None
    }

    fn robot_framework_report(&self) -> Option<&RobotFrameworkReport> {
        None
    }

    fn jacoco_report(&self) -> Option<&JacocoReport> {
        None
    }

    fn performance_reports(&self) -> &[PerformanceReport] {
        &[]
    }

    fn perf_publisher_report(&self) -> Option<&PerfPublisherReport> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn result_names_and_ordinals() {
        assert_eq!(BuildResult::NotBuilt.to_string(), "NOT_BUILT");
        assert_eq!(BuildResult::from_str("UNSTABLE").unwrap(), BuildResult::Unstable);
        assert_eq!(BuildResult::Aborted.ordinal(), 4);
        assert!(BuildResult::Success.is_successful());
        assert!(!BuildResult::Unstable.is_successful());
    }

    #[test]
    fn report_kind_names() {
        assert_eq!(ReportKind::PerfPublisher.to_string(), "perf-publisher");
        assert_eq!(ReportKind::from_str("robot-framework").unwrap(), ReportKind::RobotFramework);
    }
}
