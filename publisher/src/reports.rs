//! Already parsed third-party reports, as handed over by the host.

use serde::{
    Deserialize,
    Serialize,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoberturaReport {
    /// Coverage percentages, 0-100.
    pub package_coverage: f64,
    pub class_coverage: f64,
    pub line_coverage: f64,
    pub branch_coverage: f64,
    pub packages: u64,
    pub source_files: u64,
    pub classes: u64,
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageCounter {
    pub covered: u64,
    pub missed: u64,
}

impl CoverageCounter {
    pub fn total(&self) -> u64 {
        self.covered + self.missed
    }

    /// Covered share in percent, 0 when there is nothing to cover.
    pub fn percentage(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.covered as f64 * 100.0 / total as f64,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JacocoReport {
    #[serde(default)]
    pub instruction: CoverageCounter,
    #[serde(default)]
    pub branch: CoverageCounter,
    #[serde(default)]
    pub complexity: CoverageCounter,
    #[serde(default)]
    pub line: CoverageCounter,
    #[serde(default)]
    pub method: CoverageCounter,
    #[serde(default)]
    pub class: CoverageCounter,
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotCounts {
    pub passed: u64,
    pub failed: u64,
    #[serde(default)]
    pub skipped: u64,
    #[serde(default)]
    pub duration_ms: u64,
}

impl RobotCounts {
    pub fn total(&self) -> u64 {
        self.passed + self.failed + self.skipped
    }

    pub fn pass_percentage(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.passed as f64 * 100.0 / total as f64,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotTagResult {
    pub name: String,
    #[serde(flatten)]
    pub counts: RobotCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotSuiteResult {
    pub name: String,
    #[serde(flatten)]
    pub counts: RobotCounts,
    /// Test cases directly inside this suite.
    #[serde(default)]
    pub test_cases: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotFrameworkReport {
    #[serde(flatten)]
    pub overall: RobotCounts,
    #[serde(default)]
    pub tags: Vec<RobotTagResult>,
    #[serde(default)]
    pub suites: Vec<RobotSuiteResult>,
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

/// Load test results of one report file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub file: String,
    pub samples: u64,
    pub error_count: u64,
    pub error_percent: f64,
    pub average_ms: f64,
    pub median_ms: f64,
    pub p90_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    #[serde(default)]
    pub total_traffic_kb: f64,
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerfPublisherMetric {
    pub name: String,
    pub average: f64,
    pub best: f64,
    pub worst: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerfPublisherTest {
    pub name: String,
    pub executed: bool,
    pub successful: bool,
    #[serde(default)]
    pub compile_time: Option<f64>,
    #[serde(default)]
    pub execution_time: Option<f64>,
    #[serde(default)]
    pub performance: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerfPublisherReport {
    #[serde(default)]
    pub metrics: Vec<PerfPublisherMetric>,
    #[serde(default)]
    pub tests: Vec<PerfPublisherTest>,
}
