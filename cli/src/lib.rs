use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use utils::app_config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "bucket-deploy", version)]
#[command(about = "Deploy a local directory to an object-storage bucket", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,
}

/// Where objects and invalidations go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Amazon S3 and CloudFront, credentials from the standard AWS chain
    S3,
    /// In-process store; nothing leaves the machine
    Memory,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload changed files to the bucket and invalidate the CDN
    Deploy(DeployArgs),
}

#[derive(clap::Args, Debug)]
pub struct DeployArgs {
    /// Configuration file path (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Local directory to deploy
    #[arg(short, long)]
    pub source: Option<String>,

    /// Target bucket, optionally with a key prefix: NAME[/PREFIX]
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Canned ACL applied to every uploaded object
    #[arg(long)]
    pub acl: Option<String>,

    /// Maximum number of files in flight
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Cache-Control header for every uploaded object
    #[arg(long)]
    pub cache_control: Option<String>,

    /// CDN distribution to invalidate after the upload
    #[arg(long)]
    pub distribution_id: Option<String>,

    /// AWS region
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3 endpoint (S3-compatible services)
    #[arg(long)]
    pub endpoint_url: Option<String>,

    #[arg(long, value_enum, default_value_t = Backend::S3)]
    pub backend: Backend,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Layer the user config file and `--log-level` over the defaults. Runs
/// before logging is set up so both can change the log settings.
pub fn load_config(cli: &Cli) -> utils::error::Result<()> {
    let Commands::Deploy(args) = &cli.command;
    AppConfig::merge_config(args.config.as_deref())?;

    if let Some(level) = &cli.log_level {
        AppConfig::set("log.level", level)?;
    }

    Ok(())
}

pub async fn cli_match(cli: Cli) -> utils::error::Result<()> {
    match cli.command {
        Commands::Deploy(args) => commands::deploy_cmd(args).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_deploy_flags() {
        let cli = Cli::try_parse_from([
            "bucket-deploy",
            "--log-level",
            "debug",
            "deploy",
            "--source",
            "public",
            "--bucket",
            "site/www",
            "-j",
            "4",
            "--backend",
            "memory",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        let Commands::Deploy(args) = cli.command;
        assert_eq!(args.source.as_deref(), Some("public"));
        assert_eq!(args.bucket.as_deref(), Some("site/www"));
        assert_eq!(args.concurrency, Some(4));
        assert_eq!(args.backend, Backend::Memory);
        assert_eq!(args.distribution_id, None);
    }

    #[test]
    fn backend_defaults_to_s3() {
        let cli = Cli::try_parse_from(["bucket-deploy", "deploy"]).unwrap();
        let Commands::Deploy(args) = cli.command;
        assert_eq!(args.backend, Backend::S3);
    }

    #[test]
    fn rejects_non_numeric_concurrency() {
        assert!(Cli::try_parse_from(["bucket-deploy", "deploy", "-j", "many"]).is_err());
    }
}
