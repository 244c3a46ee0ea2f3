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
    point::Point,
    reports::{
        PerfPublisherReport,
        PerfPublisherTest,
    },
};
use eyre::{
    OptionExt as _,
    Result,
};

/// PerfPublisher results: a summary, one point per metric and one per test.
pub struct PerfPublisherPointGenerator<'a> {
    ctx: &'a PointContext,
    build: &'a dyn Build,
}

impl<'a> PerfPublisherPointGenerator<'a> {
    pub fn new(ctx: &'a PointContext, build: &'a dyn Build) -> Self {
        Self { ctx, build }
    }

    fn summary(&self, report: &PerfPublisherReport) -> Result<Point> {
        let tests = &report.tests;
        let executed = tests.iter().filter(|t| t.executed).count();
        let passed = tests.iter().filter(|t| t.executed && t.successful).count();

        let best = |value: fn(&PerfPublisherTest) -> Option<f64>| {
            tests.iter().filter_map(value).min_by(f64::total_cmp)
        };
        let worst = |value: fn(&PerfPublisherTest) -> Option<f64>| {
            tests.iter().filter_map(value).max_by(f64::total_cmp)
        };

        let point = self
            .ctx
            .base_point("perfpublisher_summary", self.build)
            .field("number_of_tests", tests.len())
            .field("number_of_executed_tests", executed)
            .field("number_of_not_executed_tests", tests.len() - executed)
            .field("number_of_passed_tests", passed)
            .field("number_of_failed_tests", executed - passed)
            .optional_field("best_compile_time", best(|t| t.compile_time))
            .optional_field("worst_compile_time", worst(|t| t.compile_time))
            .optional_field("best_execution_time", best(|t| t.execution_time))
            .optional_field("worst_execution_time", worst(|t| t.execution_time))
            // Higher performance figures are better.
            .optional_field("best_performance", worst(|t| t.performance))
            .optional_field("worst_performance", best(|t| t.performance))
            .build()?;
        Ok(point)
    }
}

impl PointGenerator for PerfPublisherPointGenerator<'_> {
    fn name(&self) -> &'static str {
        "PerfPublisher"
    }

    fn availability(&self) -> Availability {
        Availability::of(self.build, ReportKind::PerfPublisher)
    }

    fn has_report(&mut self) -> bool {
        self.build.perf_publisher_report().is_some()
    }

    fn generate(&mut self) -> Result<Vec<Point>> {
        let report = self
            .build
            .perf_publisher_report()
            .ok_or_eyre("PerfPublisher report vanished")?;

        let mut points = vec![self.summary(report)?];

        for metric in &report.metrics {
            points.push(
                self.ctx
                    .base_point("perfpublisher_metric", self.build)
                    .tag("metric_name", metric.name.as_str())
                    .field("average", metric.average)
                    .field("best", metric.best)
                    .field("worst", metric.worst)
                    .build()?,
            );
        }

        for test in &report.tests {
            points.push(
                self.ctx
                    .base_point("perfpublisher_test", self.build)
                    .tag("test_name", test.name.as_str())
                    .field("successful", test.successful)
                    .field("executed", test.executed)
                    .optional_field("compile_time", test.compile_time)
                    .optional_field("execution_time", test.execution_time)
                    .optional_field("performance", test.performance)
                    .build()?,
            );
        }

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        point::FieldValue,
        renderer::ProjectNameRenderer,
        reports::PerfPublisherMetric,
        testing::{
            FakeBuild,
            TIMESTAMP,
        },
    };

    fn test(name: &str, executed: bool, successful: bool, execution_time: Option<f64>) -> PerfPublisherTest {
        PerfPublisherTest {
            name: name.to_string(),
            executed,
            successful,
            compile_time: None,
            execution_time,
            performance: None,
        }
    }

    #[test]
    fn summary_is_derived_from_tests() {
        let ctx = PointContext::new(ProjectNameRenderer::default(), None, TIMESTAMP, false);
        let mut build = FakeBuild::new("job", 1);
        build.perf_publisher = Some(PerfPublisherReport {
            metrics: vec![PerfPublisherMetric {
                name: "throughput".to_string(),
                average: 10.0,
                best: 12.0,
                worst: 8.0,
            }],
            tests: vec![
                test("a", true, true, Some(1.5)),
                test("b", true, false, Some(0.5)),
                test("c", false, false, None),
            ],
        });

        let points = PerfPublisherPointGenerator::new(&ctx, &build).generate().unwrap();
        assert_eq!(points.len(), 5);

        let summary = &points[0];
        assert_eq!(summary.measurement(), "perfpublisher_summary");
        assert_eq!(summary.field("number_of_tests"), Some(&FieldValue::Integer(3)));
        assert_eq!(summary.field("number_of_not_executed_tests"), Some(&FieldValue::Integer(1)));
        assert_eq!(summary.field("number_of_passed_tests"), Some(&FieldValue::Integer(1)));
        assert_eq!(summary.field("number_of_failed_tests"), Some(&FieldValue::Integer(1)));
        assert_eq!(summary.field("best_execution_time"), Some(&FieldValue::Float(0.5)));
        assert_eq!(summary.field("worst_execution_time"), Some(&FieldValue::Float(1.5)));
        assert_eq!(summary.field("best_compile_time"), None);

        assert_eq!(points[1].tag("metric_name"), Some("throughput"));
        assert_eq!(points[4].tag("test_name"), Some("c"));
        assert_eq!(points[4].field("executed"), Some(&FieldValue::Boolean(false)));
    }
}
