use crate::{
    build::Build,
    error::InfluxReportError,
    generators::*,
    listener::TaskListener,
    point::Point,
    writer::{
        PublishOutcome,
        TargetWriter,
    },
};
use buildflux_config::Config;

/// Collects the points of one build from every generator and publishes them to the configured targets.
pub struct PublicationOrchestrator<'a> {
    config: &'a Config,
    ctx: PointContext,
}

impl<'a> PublicationOrchestrator<'a> {
    /// `timestamp` (epoch nanoseconds) is shared by every point of the run.
    pub fn new(config: &'a Config, timestamp: i64) -> Self {
        Self {
            config,
            ctx: PointContext::from_config(config, timestamp),
        }
    }

    pub fn timestamp(&self) -> i64 {
        self.ctx.timestamp()
    }

    fn generators<'g>(&'g self, build: &'g dyn Build) -> Vec<Box<dyn PointGenerator + 'g>> {
        let config = self.config;
        let ctx = &self.ctx;
        vec![
            Box::new(JenkinsBasePointGenerator::new(
                ctx,
                build,
                &config.measurement_name,
                config.env_parameter_field.as_deref(),
                config.env_parameter_tag.as_deref(),
            )),
            Box::new(CustomDataPointGenerator::new(
                ctx,
                &config.custom_data,
                &config.custom_data_tags,
                &config.measurement_name,
            )),
            Box::new(CustomDataMapPointGenerator::new(
                ctx,
                &config.custom_data_map,
                &config.custom_data_map_tags,
            )),
            Box::new(CoberturaPointGenerator::new(ctx, build)),
            Box::new(RobotFrameworkPointGenerator::new(ctx, build)),
            Box::new(JacocoPointGenerator::new(ctx, build)),
            Box::new(PerformancePointGenerator::new(ctx, build)),
            Box::new(SonarQubePointGenerator::new(ctx, build, &config.http)),
            Box::new(ChangeLogPointGenerator::new(ctx, build)),
            Box::new(PerfPublisherPointGenerator::new(ctx, build)),
        ]
    }

    /// Every point the build yields, in generator order.
    pub fn run(&self, build: &dyn Build, listener: &dyn TaskListener) -> Vec<Point> {
        collect(self.generators(build), listener)
    }

    pub fn perform(
        &self,
        build: &dyn Build,
        listener: &dyn TaskListener,
    ) -> Result<Vec<PublishOutcome>, InfluxReportError> {
        listener.log("Collecting data for publication in InfluxDB...");
        let points = self.run(build, listener);
        info!(project = build.project_name(), build = build.number(), points = points.len(), "Collected points");

        if self.config.targets.is_empty() {
            warn!("No InfluxDB targets configured, nothing published");
            listener.log("No InfluxDB targets configured");
            return Ok(Vec::new());
        }

        let outcomes = TargetWriter::new(&self.config.http, self.config.proxy.as_ref(), listener)
            .publish_all(&points, &self.config.targets)?;
        listener.log("Completed.");
        Ok(outcomes)
    }
}

/// Runs `generators` in order. A generator that is unavailable, has nothing to report or fails contributes no
/// points, the remaining ones still run.
pub fn collect(generators: Vec<Box<dyn PointGenerator + '_>>, listener: &dyn TaskListener) -> Vec<Point> {
    let mut points = Vec::new();
    for mut generator in generators {
        let name = generator.name();
        if generator.availability() == Availability::Unavailable {
            debug!(generator = name, "Plugin not available, skipped");
            continue;
        }
        if !generator.has_report() {
            debug!(generator = name, "Data not found");
            continue;
        }

        listener.log(&format!("{name} data found. Writing to InfluxDB..."));
        match generator.generate() {
            Ok(generated) => {
                trace!(generator = name, points = generated.len(), "Generated points");
                points.extend(generated);
            }
            Err(error) => {
                warn!(generator = name, ?error, "Failed to generate points");
                listener.log(&format!("Failed to collect {name} data: {error}"));
            }
        }
    }
    points
}
