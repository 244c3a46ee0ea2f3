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
use eyre::{
    OptionExt as _,
    Result,
};

pub struct JacocoPointGenerator<'a> {
    ctx: &'a PointContext,
    build: &'a dyn Build,
}

impl<'a> JacocoPointGenerator<'a> {
    pub fn new(ctx: &'a PointContext, build: &'a dyn Build) -> Self {
        Self { ctx, build }
    }
}

impl PointGenerator for JacocoPointGenerator<'_> {
    fn name(&self) -> &'static str {
        "JaCoCo"
    }

    fn availability(&self) -> Availability {
        Availability::of(self.build, ReportKind::Jacoco)
    }

    fn has_report(&mut self) -> bool {
        self.build.jacoco_report().is_some()
    }

    fn generate(&mut self) -> Result<Vec<Point>> {
        let report = self.build.jacoco_report().ok_or_eyre("JaCoCo report vanished")?;
        let point = self
            .ctx
            .base_point("jacoco_data", self.build)
            .field("jacoco_instruction_coverage_rate", report.instruction.percentage())
            .field("jacoco_branch_coverage_rate", report.branch.percentage())
            .field("jacoco_complexity_coverage_rate", report.complexity.percentage())
            .field("jacoco_line_coverage_rate", report.line.percentage())
            .field("jacoco_method_coverage_rate", report.method.percentage())
            .field("jacoco_class_coverage_rate", report.class.percentage())
            .field("jacoco_lines_covered", report.line.covered)
            .field("jacoco_lines_missed", report.line.missed)
            .build()?;
        Ok(vec![point])
    }
}
