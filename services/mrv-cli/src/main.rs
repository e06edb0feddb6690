//! Forest monitoring command line tool.
//!
//! Loads forest projects from a base directory and, through Earth Engine,
//! reports land-cover pixel counts with the CO2 they retain or exports the
//! land-cover composite as a Cloud Optimized GeoTIFF.

mod commands;
mod report;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use dynamic_world::{EarthEngineConfig, DEFAULT_API_URL, DEFAULT_GDAL_TRANSLATE};
use forest_config::DEFAULT_PROJECTS_DIR;
use mrv_common::logging::{self, LogFormat};

#[derive(Parser, Debug)]
#[command(name = "mrv")]
#[command(about = "Land-cover statistics and CO2 estimates for forest projects")]
struct Cli {
    /// Directory holding one sub-directory per forest project
    #[arg(long, env = "FORESTS_DIR", default_value = DEFAULT_PROJECTS_DIR, global = true)]
    forests_dir: PathBuf,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Log format (json or pretty)
    #[arg(long, env = "LOG_FORMAT", default_value = "json", global = true)]
    log_format: LogFormat,

    /// Earth Engine project; defaults to the service account's project
    #[arg(long, env = "EE_PROJECT", global = true)]
    ee_project: Option<String>,

    /// Earth Engine REST API base URL
    #[arg(long, env = "EE_API_URL", default_value = DEFAULT_API_URL, global = true)]
    ee_api_url: String,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "300", global = true)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that forest projects exist and load without errors
    Validate {
        /// Forest project directory names
        #[arg(long = "forest", required = true, num_args = 1..)]
        forests: Vec<String>,
    },

    /// Count land-cover pixels and estimate retained CO2
    Calculate(QueryArgs),

    /// Export the land-cover composite as a Cloud Optimized GeoTIFF
    Download {
        #[command(flatten)]
        query: QueryArgs,

        /// Output directory (default: <forests-dir>/<forest>/<end-date>)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// gdal_translate executable
        #[arg(long, env = "GDAL_TRANSLATE", default_value = DEFAULT_GDAL_TRANSLATE)]
        gdal_translate: PathBuf,
    },
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Forest project directory names
    #[arg(long = "forest", required = true, num_args = 1..)]
    forests: Vec<String>,

    /// First day of the window (YYYY-MM-DD, inclusive)
    #[arg(long)]
    start_date: String,

    /// Last day of the window (YYYY-MM-DD, exclusive)
    #[arg(long)]
    end_date: String,
}

impl Cli {
    fn earth_engine_config(&self) -> EarthEngineConfig {
        EarthEngineConfig {
            api_url: self.ee_api_url.clone(),
            project: self.ee_project.clone(),
            request_timeout: Duration::from_secs(self.timeout_secs),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(logging::parse_level(&cli.log_level), cli.log_format);

    info!(forests_dir = %cli.forests_dir.display(), "Starting mrv");

    match &cli.command {
        Command::Validate { forests } => {
            let summaries = commands::validate(forests, &cli.forests_dir)?;
            report::print_json_lines(&summaries)?;
        }
        Command::Calculate(query) => {
            let forests = commands::prepare_query(
                &query.forests,
                &cli.forests_dir,
                &query.start_date,
                &query.end_date,
            )?;
            let client = commands::connect(cli.earth_engine_config()).await?;
            let reports =
                commands::calculate(&client, &forests, &query.start_date, &query.end_date).await?;
            report::print_json_lines(&reports)?;
        }
        Command::Download {
            query,
            output_dir,
            gdal_translate,
        } => {
            let forests = commands::prepare_query(
                &query.forests,
                &cli.forests_dir,
                &query.start_date,
                &query.end_date,
            )?;
            let client = commands::connect(cli.earth_engine_config()).await?;
            let exports = commands::download(
                &client,
                gdal_translate,
                &forests,
                &query.start_date,
                &query.end_date,
                output_dir.as_deref(),
            )
            .await?;
            report::print_json_lines(&exports)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_calculate() {
        let cli = Cli::try_parse_from([
            "mrv",
            "--forests-dir",
            "/data/forests",
            "calculate",
            "--forest",
            "CordilleraAzul",
            "Sample",
            "--start-date",
            "2021-07-05",
            "--end-date",
            "2022-07-05",
        ])
        .unwrap();

        assert_eq!(cli.forests_dir, PathBuf::from("/data/forests"));
        match cli.command {
            Command::Calculate(query) => {
                assert_eq!(query.forests, vec!["CordilleraAzul", "Sample"]);
                assert_eq!(query.start_date, "2021-07-05");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "mrv",
            "validate",
            "--forest",
            "Sample",
            "--log-format",
            "pretty",
            "--timeout-secs",
            "5",
        ])
        .unwrap();

        assert_eq!(cli.log_format, LogFormat::Pretty);
        assert_eq!(cli.earth_engine_config().request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_forest_is_required() {
        assert!(Cli::try_parse_from(["mrv", "validate"]).is_err());
    }

    #[test]
    fn test_download_options() {
        let cli = Cli::try_parse_from([
            "mrv",
            "download",
            "--forest",
            "Sample",
            "--start-date",
            "2021-07-05",
            "--end-date",
            "2022-07-05",
            "--output-dir",
            "/tmp/out",
            "--gdal-translate",
            "/opt/gdal/bin/gdal_translate",
        ])
        .unwrap();

        match cli.command {
            Command::Download {
                output_dir,
                gdal_translate,
                ..
            } => {
                assert_eq!(output_dir, Some(PathBuf::from("/tmp/out")));
                assert_eq!(gdal_translate, PathBuf::from("/opt/gdal/bin/gdal_translate"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
