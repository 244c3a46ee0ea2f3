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

const COBERTURA_PACKAGE_COVERAGE_RATE: &str = "cobertura_package_coverage_rate";
const COBERTURA_CLASS_COVERAGE_RATE: &str = "cobertura_class_coverage_rate";
const COBERTURA_LINE_COVERAGE_RATE: &str = "cobertura_line_coverage_rate";
const COBERTURA_BRANCH_COVERAGE_RATE: &str = "cobertura_branch_coverage_rate";
const COBERTURA_NUMBER_OF_PACKAGES: &str = "cobertura_number_of_packages";
const COBERTURA_NUMBER_OF_SOURCEFILES: &str = "cobertura_number_of_sourcefiles";
const COBERTURA_NUMBER_OF_CLASSES: &str = "cobertura_number_of_classes";

pub struct CoberturaPointGenerator<'a> {
    ctx: &'a PointContext,
    build: &'a dyn Build,
}

impl<'a> CoberturaPointGenerator<'a> {
    pub fn new(ctx: &'a PointContext, build: &'a dyn Build) -> Self {
        Self { ctx, build }
    }
}

impl PointGenerator for CoberturaPointGenerator<'_> {
    fn name(&self) -> &'static str {
        "Cobertura"
    }

    fn availability(&self) -> Availability {
        Availability::of(self.build, ReportKind::Cobertura)
    }

    fn has_report(&mut self) -> bool {
        self.build.cobertura_report().is_some()
    }

    fn generate(&mut self) -> Result<Vec<Point>> {
        let report = self.build.cobertura_report().ok_or_eyre("Cobertura report vanished")?;
        let point = self
            .ctx
            .base_point("cobertura_data", self.build)
            .field(COBERTURA_PACKAGE_COVERAGE_RATE, report.package_coverage)
            .field(COBERTURA_CLASS_COVERAGE_RATE, report.class_coverage)
            .field(COBERTURA_LINE_COVERAGE_RATE, report.line_coverage)
            .field(COBERTURA_BRANCH_COVERAGE_RATE, report.branch_coverage)
            .field(COBERTURA_NUMBER_OF_PACKAGES, report.packages)
            .field(COBERTURA_NUMBER_OF_SOURCEFILES, report.source_files)
            .field(COBERTURA_NUMBER_OF_CLASSES, report.classes)
            .build()?;
        Ok(vec![point])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        point::FieldValue,
        renderer::ProjectNameRenderer,
        reports::CoberturaReport,
        testing::{
            FakeBuild,
            TIMESTAMP,
        },
    };

    #[test]
    fn coverage_fields() {
        let ctx = PointContext::new(ProjectNameRenderer::default(), None, TIMESTAMP, false);
        let mut build = FakeBuild::new("job", 3);
        let mut generator = CoberturaPointGenerator::new(&ctx, &build);
        assert!(!generator.has_report());

        build.cobertura = Some(CoberturaReport {
            line_coverage: 81.5,
            classes: 12,
            ..Default::default()
        });
        let mut generator = CoberturaPointGenerator::new(&ctx, &build);
        assert!(generator.has_report());
        let points = generator.generate().unwrap();

        assert_eq!(points[0].measurement(), "cobertura_data");
        assert_eq!(points[0].field(COBERTURA_LINE_COVERAGE_RATE), Some(&FieldValue::Float(81.5)));
        assert_eq!(points[0].field(COBERTURA_NUMBER_OF_CLASSES), Some(&FieldValue::Integer(12)));
        assert_eq!(points[0].field("build_number"), Some(&FieldValue::Integer(3)));
    }
}
