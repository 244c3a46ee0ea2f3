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
};
use eyre::Result;

/// Load test results, one point per report file.
pub struct PerformancePointGenerator<'a> {
    ctx: &'a PointContext,
    build: &'a dyn Build,
}

impl<'a> PerformancePointGenerator<'a> {
    pub fn new(ctx: &'a PointContext, build: &'a dyn Build) -> Self {
        Self { ctx, build }
    }
}

impl PointGenerator for PerformancePointGenerator<'_> {
    fn name(&self) -> &'static str {
        "Performance"
    }

    fn availability(&self) -> Availability {
        Availability::of(self.build, ReportKind::Performance)
    }

    fn has_report(&mut self) -> bool {
        !self.build.performance_reports().is_empty()
    }

    fn generate(&mut self) -> Result<Vec<Point>> {
        self.build
            .performance_reports()
            .iter()
            .map(|report| {
                self.ctx
                    .base_point("performance_data", self.build)
                    .tag("report_file", report.file.as_str())
                    .field("error_percent", report.error_percent)
                    .field("error_count", report.error_count)
                    .field("average", report.average_ms)
                    .field("90Percentile", report.p90_ms)
                    .field("median", report.median_ms)
                    .field("max", report.max_ms)
                    .field("min", report.min_ms)
                    .field("total_traffic", report.total_traffic_kb)
                    .field("size", report.samples)
                    .build()
                    .map_err(Into::into)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        point::FieldValue,
        renderer::ProjectNameRenderer,
        reports::PerformanceReport,
        testing::{
            FakeBuild,
            TIMESTAMP,
        },
    };

    #[test]
    fn point_per_report_file() {
        let ctx = PointContext::new(ProjectNameRenderer::default(), None, TIMESTAMP, false);
        let mut build = FakeBuild::new("job", 1);
        build.performance = vec![
            PerformanceReport {
                file: "checkout.jtl".to_string(),
                samples: 200,
                p90_ms: 410.0,
                ..Default::default()
            },
            PerformanceReport {
                file: "search.jtl".to_string(),
                error_count: 2,
                ..Default::default()
            },
        ];

        let mut generator = PerformancePointGenerator::new(&ctx, &build);
        assert!(generator.has_report());
        let points = generator.generate().unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].tag("report_file"), Some("checkout.jtl"));
        assert_eq!(points[0].field("90Percentile"), Some(&FieldValue::Float(410.0)));
        assert_eq!(points[0].field("size"), Some(&FieldValue::Integer(200)));
        assert_eq!(points[1].field("error_count"), Some(&FieldValue::Integer(2)));
    }
}
