use crate::{
    args::{
        Args,
        Command,
    },
    manifest::BuildManifest,
};
use buildflux_config::Config;
use buildflux_publisher::{
    point::to_line_protocol,
    ConsoleListener,
    PublicationOrchestrator,
    PublishOutcome,
};
use chrono::Utc;
use color_eyre::Result;
use std::path::Path;

pub struct App {
    args: Args,
    config: Config,
}

impl App {
    pub fn new(args: Args) -> Result<Self> {
        let config = Config::load(args.config.as_deref())?;
        Ok(Self { args, config })
    }

    pub fn run(self) -> Result<()> {
        match &self.args.command {
            Command::Config => {
                print!("{}", self.config.to_yaml()?);
                Ok(())
            }
            Command::Publish {
                manifest,
                timestamp,
                dry_run,
            } => self.publish(manifest, *timestamp, *dry_run),
        }
    }

    fn publish(&self, manifest: &Path, timestamp: Option<i64>, dry_run: bool) -> Result<()> {
        let build = BuildManifest::load(manifest)?;
        let timestamp = timestamp.unwrap_or_else(|| Utc::now().timestamp_nanos_opt().unwrap_or_default());
        let orchestrator = PublicationOrchestrator::new(&self.config, timestamp);
        let listener = ConsoleListener;

        if dry_run {
            let points = orchestrator.run(&build, &listener);
            println!("{}", to_line_protocol(&points));
            return Ok(());
        }

        let outcomes = orchestrator.perform(&build, &listener)?;
        let written = outcomes.iter().filter(|outcome| outcome.is_written()).count();
        let failed = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, PublishOutcome::Failed { .. } | PublishOutcome::Skipped { .. }))
            .count();
        info!(written, failed, targets = self.config.targets.len(), "publication finished");
        Ok(())
    }
}
