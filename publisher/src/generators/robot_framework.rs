use super::{
    Availability,
    PointContext,
    PointGenerator,
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
    reports::RobotCounts,
};
use eyre::{
    OptionExt as _,
    Result,
};

const RF_RESULTS: &str = "rf_results";
const RF_TAG_RESULTS: &str = "rf_tag_results";
const RF_SUITE_RESULTS: &str = "rf_suite_results";

/// Robot Framework results: one overall point, one point per tag and one per suite.
pub struct RobotFrameworkPointGenerator<'a> {
    ctx: &'a PointContext,
    build: &'a dyn Build,
}

impl<'a> RobotFrameworkPointGenerator<'a> {
    pub fn new(ctx: &'a PointContext, build: &'a dyn Build) -> Self {
        Self { ctx, build }
    }
}

fn with_counts(builder: PointBuilder, counts: &RobotCounts) -> PointBuilder {
    builder
        .field("rf_failed", counts.failed)
        .field("rf_passed", counts.passed)
        .field("rf_skipped", counts.skipped)
        .field("rf_total", counts.total())
        .field("rf_duration", counts.duration_ms)
}

impl PointGenerator for RobotFrameworkPointGenerator<'_> {
    fn name(&self) -> &'static str {
        "Robot Framework"
    }

    fn availability(&self) -> Availability {
        Availability::of(self.build, ReportKind::RobotFramework)
    }

    fn has_report(&mut self) -> bool {
        self.build.robot_framework_report().is_some()
    }

    fn generate(&mut self) -> Result<Vec<Point>> {
        let report = self
            .build
            .robot_framework_report()
            .ok_or_eyre("Robot Framework report vanished")?;

        let mut points = Vec::with_capacity(1 + report.tags.len() + report.suites.len());
        points.push(
            with_counts(self.ctx.base_point(RF_RESULTS, self.build), &report.overall)
                .field("rf_pass_percentage", report.overall.pass_percentage())
                .field("rf_suites", report.suites.len())
                .build()?,
        );

        for tag in &report.tags {
            points.push(
                with_counts(self.ctx.base_point(RF_TAG_RESULTS, self.build), &tag.counts)
                    .tag("rf_tag_name", tag.name.as_str())
                    .build()?,
            );
        }

        for suite in &report.suites {
            points.push(
                with_counts(self.ctx.base_point(RF_SUITE_RESULTS, self.build), &suite.counts)
                    .tag("rf_suite_name", suite.name.as_str())
                    .field("rf_testcases", suite.test_cases)
                    .build()?,
            );
        }

        Ok(points)
    }
}
