use clap::{
    Parser,
    Subcommand,
};
use std::path::PathBuf;

/// Publishes the metrics of a finished build to InfluxDB.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Settings file layered over the built-in defaults. Defaults to `config.yaml` in the config directory.
    #[arg(long, global = true, env = "BUILDFLUX_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Collect the points of a build and write them to every configured target.
    Publish {
        /// Build manifest (YAML or JSON) describing the build and its reports.
        #[arg(long, short)]
        manifest: PathBuf,

        /// Timestamp of every point in epoch nanoseconds. Defaults to now.
        #[arg(long)]
        timestamp: Option<i64>,

        /// Print the points as line protocol instead of writing them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the effective configuration, passwords masked.
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_arguments() {
        let args = Args::parse_from([
            "buildflux",
            "publish",
            "--manifest",
            "build.yaml",
            "--timestamp",
            "1700000000000000000",
            "--verbose",
        ]);
        assert!(args.verbose);
        assert_eq!(args.config, None);
        match args.command {
            Command::Publish {
                manifest,
                timestamp,
                dry_run,
            } => {
                assert_eq!(manifest, PathBuf::from("build.yaml"));
                assert_eq!(timestamp, Some(1_700_000_000_000_000_000));
                assert!(!dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn manifest_is_required() {
        assert!(Args::try_parse_from(["buildflux", "publish"]).is_err());
    }
}
