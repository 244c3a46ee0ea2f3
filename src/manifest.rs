//! A finished build described by a YAML (or JSON) file, for hosts without a native integration.
//!
//! ```yaml
//! project_name: my-app
//! project_path: team/my-app
//! number: 42
//! result: UNSTABLE
//! duration_ms: 93000
//! start_time: 2024-03-01T10:00:00Z
//! console_log: console.log   # relative to the manifest
//! env:
//!   GIT_BRANCH: main
//! reports:
//!   cobertura:
//!     line_coverage: 81.5
//!     ...
//! unsupported: [perf-publisher]
//! ```

use buildflux_publisher::{
    reports::{
        CoberturaReport,
        JacocoReport,
        PerfPublisherReport,
        PerformanceReport,
        RobotFrameworkReport,
    },
    Build,
    BuildResult,
    ChangeLogEntry,
    ReportKind,
    TestSummary,
};
use chrono::{
    DateTime,
    Utc,
};
use eyre::{
    Context as _,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    collections::BTreeMap,
    fs,
    io::{
        self,
        BufRead,
        BufReader,
    },
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reports {
    #[serde(default)]
    pub cobertura: Option<CoberturaReport>,
    #[serde(default)]
    pub robot_framework: Option<RobotFrameworkReport>,
    #[serde(default)]
    pub jacoco: Option<JacocoReport>,
    #[serde(default)]
    pub performance: Vec<PerformanceReport>,
    #[serde(default)]
    pub perf_publisher: Option<PerfPublisherReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildManifest {
    pub project_name: String,
    /// Full path of the job, e.g. including folders. Defaults to the project name.
    #[serde(default)]
    pub project_path: Option<String>,
    /// Defaults to `#<number>`.
    #[serde(default)]
    pub display_name: Option<String>,
    pub number: u64,
    #[serde(default)]
    pub duration_ms: u64,
    /// Absent while the build is still running.
    #[serde(default)]
    pub result: Option<BuildResult>,
    #[serde(default = "Utc::now")]
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub console_log: Option<PathBuf>,
    /// Build environment. Variables missing here are looked up in the process environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub health_score: Option<i64>,
    #[serde(default)]
    pub tests: Option<TestSummary>,
    #[serde(default)]
    pub change_log: Vec<ChangeLogEntry>,
    /// Report kinds this host cannot produce at all.
    #[serde(default)]
    pub unsupported: Vec<ReportKind>,
    #[serde(default)]
    pub reports: Reports,

    #[serde(skip)]
    display: String,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl BuildManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).wrap_err_with(|| format!("Failed to read build manifest {path:?}"))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let manifest = Self::parse(&content, base_dir).wrap_err_with(|| format!("Invalid build manifest {path:?}"))?;
        debug!(project = %manifest.project_name, number = manifest.number, "build manifest loaded");
        Ok(manifest)
    }

    /// `base_dir` anchors a relative `console_log`.
    pub fn parse(content: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut manifest: Self = serde_yml::from_str(content)?;
        manifest.display = manifest
            .display_name
            .clone()
            .unwrap_or_else(|| format!("#{}", manifest.number));
        manifest.base_dir = base_dir.into();
        Ok(manifest)
    }
}

impl Build for BuildManifest {
    fn project_name(&self) -> &str {
        &self.project_name
    }

    fn project_path(&self) -> &str {
        self.project_path.as_deref().unwrap_or(&self.project_name)
    }

    fn display_name(&self) -> &str {
        &self.display
    }

    fn number(&self) -> u64 {
        self.number
    }

    fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    fn result(&self) -> Option<BuildResult> {
        self.result
    }

    fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    fn log_reader(&self) -> io::Result<Box<dyn BufRead + '_>> {
        match &self.console_log {
            Some(log) => Ok(Box::new(BufReader::new(fs::File::open(self.base_dir.join(log))?))),
            None => Ok(Box::new(io::empty())),
        }
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned().or_else(|| std::env::var(name).ok())
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
        self.reports.cobertura.as_ref()
    }

    fn robot_framework_report(&self) -> Option<&RobotFrameworkReport> {
        self.reports.robot_framework.as_ref()
    }

    fn jacoco_report(&self) -> Option<&JacocoReport> {
        self.reports.jacoco.as_ref()
    }

    fn performance_reports(&self) -> &[PerformanceReport] {
        &self.reports.performance
    }

    fn perf_publisher_report(&self) -> Option<&PerfPublisherReport> {
        self.reports.perf_publisher.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Read as _;

    const MANIFEST: &str = r#"
project_name: my-app
project_path: team/my-app
number: 42
result: UNSTABLE
duration_ms: 93000
start_time: 2024-03-01T10:00:00Z
console_log: logs/console.log
env:
  GIT_BRANCH: main
parameters:
  TARGET: staging
tests:
  failed: 1
  skipped: 2
  total: 30
change_log:
  - message: Fix login
    author: alice
    affected_paths: [src/login.rs]
unsupported: [perf-publisher]
reports:
  cobertura:
    package_coverage: 90.0
    class_coverage: 85.0
    line_coverage: 81.5
    branch_coverage: 60.0
    packages: 3
    source_files: 12
    classes: 14
  performance:
    - file: checkout.jtl
      samples: 100
      error_count: 1
      error_percent: 1.0
      average_ms: 120.0
      median_ms: 100.0
      p90_ms: 300.0
      min_ms: 20.0
      max_ms: 900.0
"#;

    #[test]
    fn parses_full_manifest() {
        let manifest = BuildManifest::parse(MANIFEST, "/ci/build").unwrap();

        assert_eq!(manifest.project_path(), "team/my-app");
        assert_eq!(manifest.display_name(), "#42");
        assert_eq!(manifest.result(), Some(BuildResult::Unstable));
        assert_eq!(manifest.duration(), Duration::from_secs(93));
        assert_eq!(manifest.start_time().timestamp(), 1_709_287_200);
        assert_eq!(manifest.env_var("GIT_BRANCH").as_deref(), Some("main"));
        assert_eq!(manifest.parameter("TARGET").as_deref(), Some("staging"));
        assert_eq!(manifest.test_summary().map(|t| t.total), Some(30));
        assert_eq!(manifest.change_log()[0].author, "alice");
        assert!(!manifest.supports(ReportKind::PerfPublisher));
        assert!(manifest.supports(ReportKind::Cobertura));
        assert_eq!(manifest.cobertura_report().map(|r| r.source_files), Some(12));
        assert_eq!(manifest.performance_reports()[0].file, "checkout.jtl");
        assert_eq!(manifest.jacoco_report(), None);
    }

    #[test]
    fn minimal_manifest_defaults() {
        let manifest = BuildManifest::parse("{\"project_name\": \"job\", \"number\": 7}", "").unwrap();

        assert_eq!(manifest.project_path(), "job");
        assert_eq!(manifest.display_name(), "#7");
        assert_eq!(manifest.result(), None);
        assert!(manifest.change_log().is_empty());

        let mut log = String::new();
        manifest.log_reader().unwrap().read_to_string(&mut log).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn console_log_is_relative_to_manifest() {
        let dir = temp_dir::TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("logs")).unwrap();
        fs::write(dir.path().join("logs/console.log"), "line one\nline two\n").unwrap();
        let path = dir.path().join("build.yaml");
        fs::write(&path, MANIFEST).unwrap();

        let manifest = BuildManifest::load(&path).unwrap();
        let lines: Vec<String> = manifest.log_reader().unwrap().lines().map(Result::unwrap).collect();
        assert_eq!(lines, ["line one", "line two"]);
    }

    #[test]
    fn missing_manifest_names_the_file() {
        let error = BuildManifest::load(Path::new("/nonexistent/build.yaml")).unwrap_err();
        assert!(format!("{error}").contains("/nonexistent/build.yaml"));
    }
}
