//! # Point generators
//!
//! Every data source of a build is turned into points by its own [`PointGenerator`]:
//!
//! - **`JenkinsBasePointGenerator`**: build metadata, always present
//! - **`CustomDataPointGenerator`** / **`CustomDataMapPointGenerator`**: user supplied values
//! - **`CoberturaPointGenerator`**, **`JacocoPointGenerator`**: coverage reports
//! - **`RobotFrameworkPointGenerator`**, **`PerformancePointGenerator`**, **`PerfPublisherPointGenerator`**: test
//!   and load test results
//! - **`SonarQubePointGenerator`**: issue counts fetched from the SonarQube server the build analysed against
//! - **`ChangeLogPointGenerator`**: commits that went into the build
//!
//! Generators are independent of each other. They only see the [`Build`] facade and a [`PointContext`].

mod change_log;
mod cobertura;
mod custom_data;
mod custom_data_map;
mod jacoco;
mod jenkins_base;
mod perf_publisher;
mod performance;
mod robot_framework;
mod sonarqube;

pub use change_log::ChangeLogPointGenerator;
pub use cobertura::CoberturaPointGenerator;
pub use custom_data::CustomDataPointGenerator;
pub use custom_data_map::CustomDataMapPointGenerator;
pub use jacoco::JacocoPointGenerator;
pub use jenkins_base::{
    resolve_parameter_value,
    JenkinsBasePointGenerator,
    ENV_MARKER,
};
pub use perf_publisher::PerfPublisherPointGenerator;
pub use performance::PerformancePointGenerator;
pub use robot_framework::RobotFrameworkPointGenerator;
pub use sonarqube::{
    SonarQubePointGenerator,
    SonarUrls,
};

use crate::{
    build::{
        Build,
        ReportKind,
    },
    point::{
        Point,
        PointBuilder,
    },
    renderer::ProjectNameRenderer,
};
use buildflux_config::Config;
use eyre::Result;

pub(crate) const PROJECT_NAME: &str = "project_name";
pub(crate) const PROJECT_PATH: &str = "project_path";
pub(crate) const BUILD_NUMBER: &str = "build_number";
pub(crate) const CUSTOM_PREFIX: &str = "custom_prefix";

/// Whether the capability behind a generator exists in this deployment at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
}

impl Availability {
    pub(crate) fn of(build: &dyn Build, kind: ReportKind) -> Self {
        if build.supports(kind) {
            Self::Available
        } else {
            Self::Unavailable
        }
    }
}

/// Turns one kind of build artifact into points.
pub trait PointGenerator {
    /// Human readable data source name, used in log lines.
    fn name(&self) -> &'static str;

    fn availability(&self) -> Availability {
        Availability::Available
    }

    /// Cheap probe whether this build produced the artifact. Never fails, a missing report is `false`.
    fn has_report(&mut self) -> bool;

    /// Only called after [`PointGenerator::has_report`] returned `true`.
    fn generate(&mut self) -> Result<Vec<Point>>;
}

/// Settings shared by every generator of one publication run.
#[derive(Debug, Clone)]
pub struct PointContext {
    renderer: ProjectNameRenderer,
    custom_prefix: Option<String>,
    timestamp: i64,
    replace_dash_with_underscore: bool,
}

impl PointContext {
    pub fn new(
        renderer: ProjectNameRenderer,
        custom_prefix: Option<&str>,
        timestamp: i64,
        replace_dash_with_underscore: bool,
    ) -> Self {
        Self {
            renderer,
            custom_prefix: custom_prefix.filter(|s| !s.is_empty()).map(str::to_string),
            timestamp,
            replace_dash_with_underscore,
        }
    }

    pub fn from_config(config: &Config, timestamp: i64) -> Self {
        Self::new(
            ProjectNameRenderer::from_config(config),
            config.custom_prefix(),
            timestamp,
            config.replace_dash_with_underscore,
        )
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn renderer(&self) -> &ProjectNameRenderer {
        &self.renderer
    }

    /// An empty point stamped with the run timestamp.
    pub fn point(&self, measurement: impl Into<String>) -> PointBuilder {
        Point::builder(measurement)
            .timestamp(self.timestamp)
            .sanitize_tags(self.replace_dash_with_underscore)
    }

    /// A point identifying the build: project name and build number fields, project tags.
    pub fn base_point(&self, measurement: impl Into<String>, build: &dyn Build) -> PointBuilder {
        let project_name = self.renderer.render(build);
        let mut builder = self
            .point(measurement)
            .field(PROJECT_NAME, project_name.as_str())
            .field(BUILD_NUMBER, build.number())
            .tag(PROJECT_NAME, project_name)
            .tag(PROJECT_PATH, build.project_path());
        if let Some(prefix) = &self.custom_prefix {
            builder = builder.tag(CUSTOM_PREFIX, prefix.as_str());
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        point::FieldValue,
        testing::{
            FakeBuild,
            TIMESTAMP,
        },
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn base_point_identifies_build() {
        let build = FakeBuild::new("my-job", 7);
        let ctx = PointContext::new(ProjectNameRenderer::new(Some("pr-1"), None), Some("pr-1"), TIMESTAMP, true);

        let point = ctx.base_point("m", &build).build().unwrap();

        assert_eq!(point.timestamp(), TIMESTAMP);
        assert_eq!(point.field(PROJECT_NAME), Some(&FieldValue::String("pr-1_my-job".into())));
        assert_eq!(point.field(BUILD_NUMBER), Some(&FieldValue::Integer(7)));
        assert_eq!(point.tag(PROJECT_NAME), Some("pr_1_my_job"));
        assert_eq!(point.tag(PROJECT_PATH), Some("folder/my_job"));
        assert_eq!(point.tag(CUSTOM_PREFIX), Some("pr_1"));
    }

    #[test]
    fn unsupported_report_kind_is_unavailable() {
        let mut build = FakeBuild::new("job", 1);
        assert_eq!(Availability::of(&build, ReportKind::Jacoco), Availability::Available);
        build.unsupported.push(ReportKind::Jacoco);
        assert_eq!(Availability::of(&build, ReportKind::Jacoco), Availability::Unavailable);
    }
}
