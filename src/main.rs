use clap::Parser;
use group_archive::archive::{self, ArchiveJob};
use group_archive::config::{self, ContentPolicy, FetchErrorPolicy, MediaStrategy};
use group_archive::media::ReqwestBackend;
use group_archive::output;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "group-archive")]
#[command(about = "Static HTML archive of an exported social-group feed")]
#[command(long_about = "\
Static HTML archive of an exported social-group feed

Reads a JSON array of posts (with comments, likes and pictures), sorts it
oldest first, downloads every picture it references and writes a single
self-contained page.

Output structure:

  output/
  ├── index.html        # The archive page
  ├── pictures/         # Downloaded pictures, named by SHA-256 of their URL
  ├── fonts/            # Copied from the theme
  ├── assets/           # Copied from the theme
  └── entries.json      # Normalized entries (with --manifest)

Pictures already in output/pictures/ are not downloaded again, so re-running
into the same directory only fetches what is new.

Settings are read from --config, or ./config.toml when present. Run
'group-archive --gen-config' to print a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Feed export (JSON array of posts)
    #[arg(long, default_value = "data.json")]
    data: PathBuf,

    /// Output directory
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// Access token for the attachment graph
    #[arg(long, env = "GROUP_ARCHIVE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Config file (defaults to ./config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Theme directory holding fonts/ and assets/
    #[arg(long)]
    theme: Option<PathBuf>,

    /// How message bodies are stored and rendered
    #[arg(long, value_enum)]
    content: Option<ContentPolicy>,

    /// Where entry pictures come from
    #[arg(long, value_enum)]
    media: Option<MediaStrategy>,

    /// What a failed download or graph query does to the run
    #[arg(long, value_enum)]
    on_fetch_error: Option<FetchErrorPolicy>,

    /// Also write the normalized entries to entries.json
    #[arg(long)]
    manifest: bool,

    /// Print a stock config.toml with all options documented and exit
    #[arg(long)]
    gen_config: bool,

    /// Log every download and cache hit
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    if let Err(error) = run() {
        eprintln!("group-archive: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    init_tracing(cli.quiet, cli.verbose)?;

    let mut config = config::load_config(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);
    config.validate()?;

    let backend = ReqwestBackend::new(&config.http)?;
    let job = ArchiveJob {
        data: cli.data,
        output: cli.output,
        token: cli.token,
    };
    let report = archive::run(&job, &config, &backend)?;

    if !cli.quiet {
        output::print_archive_output(&report);
    }
    Ok(())
}

/// Command-line flags win over config file values.
fn apply_overrides(config: &mut config::ArchiveConfig, cli: &Cli) {
    if let Some(theme) = &cli.theme {
        config.theme_dir = Some(theme.clone());
    }
    if let Some(policy) = cli.content {
        config.content_policy = policy;
    }
    if let Some(strategy) = cli.media {
        config.media_strategy = strategy;
    }
    if let Some(policy) = cli.on_fetch_error {
        config.on_fetch_error = policy;
    }
    if cli.manifest {
        config.write_manifest = true;
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if quiet {
        "error"
    } else if verbose {
        "group_archive=debug,info"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("GROUP_ARCHIVE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| format!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
