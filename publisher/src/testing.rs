//! Fakes shared by the unit tests.

use crate::{
    build::{
        Build,
        BuildResult,
        ChangeLogEntry,
        ReportKind,
        TestSummary,
    },
    listener::TaskListener,
    reports::*,
};
use chrono::{
    DateTime,
    TimeZone as _,
    Utc,
};
use std::{
    collections::HashMap,
    io::{
        self,
        BufRead,
    },
    sync::Mutex,
    time::Duration,
};

pub(crate) const TIMESTAMP: i64 = 1_700_000_000_000_000_000;

#[derive(Debug, Clone)]
pub(crate) struct FakeBuild {
    pub project_name: String,
    pub project_path: String,
    pub number: u64,
    pub duration: Duration,
    pub result: Option<BuildResult>,
    pub start_time: DateTime<Utc>,
    pub log: String,
    pub env: HashMap<String, String>,
    pub parameters: HashMap<String, String>,
    pub agent_name: Option<String>,
    pub health_score: Option<i64>,
    pub tests: Option<TestSummary>,
    pub change_log: Vec<ChangeLogEntry>,
    pub unsupported: Vec<ReportKind>,
    pub cobertura: Option<CoberturaReport>,
    pub robot_framework: Option<RobotFrameworkReport>,
    pub jacoco: Option<JacocoReport>,
    pub performance: Vec<PerformanceReport>,
    pub perf_publisher: Option<PerfPublisherReport>,
}

impl FakeBuild {
    pub fn new(project_name: &str, number: u64) -> Self {
        Self {
            project_name: project_name.to_string(),
            project_path: format!("folder/{project_name}"),
            number,
            duration: Duration::from_millis(1500),
            result: Some(BuildResult::Success),
            start_time: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            log: String::new(),
            env: HashMap::new(),
            parameters: HashMap::new(),
            agent_name: None,
            health_score: None,
            tests: None,
            change_log: Vec::new(),
            unsupported: Vec::new(),
            cobertura: None,
            robot_framework: None,
            jacoco: None,
            performance: Vec::new(),
            perf_publisher: None,
        }
    }

    pub fn with_log(mut self, log: &str) -> Self {
        self.log = log.to_string();
        self
    }

    pub fn with_env(mut self, name: &str, value: &str) -> Self {
        self.env.insert(name.to_string(), value.to_string());
        self
    }
}

impl Build for FakeBuild {
    fn project_name(&self) -> &str {
        &self.project_name
    }

    fn project_path(&self) -> &str {
        &self.project_path
    }

    fn display_name(&self) -> &str {
        "#42"
    }

    fn number(&self) -> u64 {
        self.number
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn result(&self) -> Option<BuildResult> {
        self.result
    }

    fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    fn log_reader(&self) -> io::Result<Box<dyn BufRead + '_>> {
        Ok(Box::new(io::Cursor::new(self.log.as_bytes())))
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }

    fn parameter(&self, name: &str) -> Option<String> {
        self.parameters.get(name).cloned()
    }

    fn agent_name(&self) -> Option<&str> {
        self.agent_name.as_deref()
    }

    fn health_score(&self) -> Option<i64> {
        self.health_score
    }

    fn test_summary(&self) -> Option<TestSummary> {
        self.tests
    }

    fn change_log(&self) -> &[ChangeLogEntry] {
        &self.change_log
    }

    fn supports(&self, kind: ReportKind) -> bool {
        !self.unsupported.contains(&kind)
    }

    fn cobertura_report(&self) -> Option<&CoberturaReport> {
        self.cobertura.as_ref()
    }

    fn robot_framework_report(&self) -> Option<&RobotFrameworkReport> {
        self.robot_framework.as_ref()
    }

    fn jacoco_report(&self) -> Option<&JacocoReport> {
        self.jacoco.as_ref()
    }

    fn performance_reports(&self) -> &[PerformanceReport] {
        &self.performance
    }

    fn perf_publisher_report(&self) -> Option<&PerfPublisherReport> {
        self.perf_publisher.as_ref()
    }
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

#[derive(Debug, Default)]
pub(crate) struct RecordingListener {
    lines: Mutex<Vec<String>>,
}

impl RecordingListener {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl TaskListener for RecordingListener {
    fn println(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}
