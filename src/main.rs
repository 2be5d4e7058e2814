//! Command-line interface for the prlog binary.
//!
//! Loads the changelog configuration, collects merged pull requests from
//! GitHub and writes the rendered HTML document.

use std::{path::PathBuf, process};

use clap::{ArgAction, Parser};
use prlog::{
    ChangelogConfig, Error, GithubTracker, Progress, RunOptions, load_config, render_document,
    run_pipeline, write_changelog,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Command line interface for building the pull request changelog.
#[derive(Debug, Parser,)]
#[command(name = "prlog", version, about = "Build an HTML changelog of merged pull requests")]
struct Cli
{
    /// Only collect and render the most recent version.
    #[arg(short = 'l', long = "latest", action = ArgAction::SetTrue)]
    latest: bool,

    /// Path to the YAML configuration describing the repository and versions.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        env = "PRLOG_CONFIG",
        default_value = "changelog.yaml"
    )]
    config: PathBuf,

    /// Destination of the HTML document, overriding the configured path.
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: Option<PathBuf,>,
}

/// Entry point that reports errors and sets the appropriate exit status.
fn main()
{
    init_tracing();

    let cli = Cli::parse();
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime,) => runtime,
        Err(error,) => {
            println!("failed to start runtime: {error}");
            process::exit(1,);
        }
    };

    if let Err(error,) = runtime.block_on(run(cli,),) {
        println!("{}", error.to_display_string());
        process::exit(error.exit_code(),);
    }
}

fn init_tracing()
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info",),);
    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr,),).with(filter,).init();
}

/// Executes the changelog run using parsed arguments.
///
/// # Errors
///
/// Propagates configuration, tracker and filesystem errors. The document is
/// only written after the whole pipeline succeeded.
async fn run(cli: Cli,) -> Result<(), Error,>
{
    let config = load_config(&cli.config,)?;
    let destination = resolve_output(&cli, &config,);
    let tracker = GithubTracker::new(&config,)?;

    tracing::info!(
        repository = %format!("{}/{}", config.owner, config.repository),
        latest_only = cli.latest,
        "Building changelog"
    );

    let outcome = run_pipeline(
        &tracker,
        RunOptions::from_config(&config, cli.latest,),
        config.pagination,
        &Progress::spinner(),
    )
    .await?;

    let html = render_document(&config.title, &outcome.versions, &outcome.aggregator,);
    write_changelog(&destination, &html,)
}

fn resolve_output(cli: &Cli, config: &ChangelogConfig,) -> PathBuf
{
    cli.output.clone().unwrap_or_else(|| config.output.clone(),)
}

#[cfg(test)]
mod tests
{
    use std::path::Path;

    use clap::Parser;
    use prlog::parse_config;

    use super::{Cli, resolve_output};

    const CONFIG: &str = "repository: {owner: acme, name: widgets}\nversions:\n  - label: '1.0'\n";

    #[test]
    fn cli_defaults()
    {
        let cli = Cli::try_parse_from([env!("CARGO_PKG_NAME")],).expect("failed to parse CLI",);

        assert!(!cli.latest);
        assert!(cli.output.is_none());
        if std::env::var_os("PRLOG_CONFIG",).is_none() {
            assert_eq!(cli.config, Path::new("changelog.yaml"));
        }
    }

    #[test]
    fn cli_accepts_short_flags()
    {
        let cli = Cli::try_parse_from([
            env!("CARGO_PKG_NAME"),
            "-l",
            "-c",
            "release.yaml",
            "-o",
            "site/log.html",
        ],)
        .expect("failed to parse CLI",);

        assert!(cli.latest);
        assert_eq!(cli.config, Path::new("release.yaml"));
        assert_eq!(cli.output.as_deref(), Some(Path::new("site/log.html")));
    }

    #[test]
    fn output_flag_overrides_configuration()
    {
        let config = parse_config(CONFIG,).expect("valid configuration",);

        let default = Cli::try_parse_from([env!("CARGO_PKG_NAME")],).expect("failed to parse CLI",);
        assert_eq!(resolve_output(&default, &config), Path::new("./docs/changelog.html"));

        let custom = Cli::try_parse_from([env!("CARGO_PKG_NAME"), "--output", "out.html"],)
            .expect("failed to parse CLI",);
        assert_eq!(resolve_output(&custom, &config), Path::new("out.html"));
    }
}
