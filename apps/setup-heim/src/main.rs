#![warn(clippy::pedantic)]

//! # setup-heim
//!
//! CI setup step that installs a Heim release into the runner tool cache
//! and exposes it to the rest of the job.
//!
//! ```bash
//! setup-heim 1.1.1      # exact release
//! setup-heim v1         # newest 1.x release
//! setup-heim latest     # newest release
//! ```
//!
//! On success the Heim bin directory is added to `PATH`, `HEIM_HOME` is
//! exported, and the outputs `heimHome`, `bin`, `runtime` and `cli` are set.
//! On failure a single `::error::` annotation is emitted and the process
//! exits with code 1.

mod actions;
mod dist;
mod errors;
mod http;
mod logging;
mod settings;
mod toolcache;

use anyhow::Result;
use clap::Parser;

use actions::{ActionEnvironment, CommandFiles, WorkflowRunner};
use dist::{HeimDist, Host, InstalledPaths};
use dist::release::HttpReleaseLookup;
use settings::Settings;
use toolcache::HttpFetcher;
use toolcache::cache::FsToolCache;

/// Installs a Heim release for the current runner.
#[derive(Parser)]
#[command(
    name = "setup-heim",
    version,
    about = "Install a Heim release into the CI tool cache",
    after_help = "\
ENVIRONMENT VARIABLES:
    INPUT_VERSION       Version specifier when no argument is given
    HEIM_DIST_SERVER    Release service URL (default: https://cloud.heim.dev/heim)
    RUNNER_TOOL_CACHE   Tool cache root
    RUNNER_TEMP         Scratch directory for downloads
    RUNNER_DEBUG        Set to 1 for debug logging
    SETUP_HEIM_LOG      Explicit log filter"
)]
struct Cli {
    /// Version to install: `X.Y.Z`, `vN`, `current` or `latest`.
    #[arg(value_name = "VERSION", env = "INPUT_VERSION")]
    specifier: String,

    /// Host architecture as named by the runner (`x64`, `arm64`, ...).
    #[arg(long, hide = true)]
    host_arch: Option<String>,

    /// Host operating system as named by the runner (`linux`, `darwin`, `win32`, ...).
    #[arg(long, hide = true)]
    host_os: Option<String>,
}

impl Cli {
    fn host(&self) -> Host {
        let detected = Host::detect();
        Host::new(
            self.host_arch.clone().unwrap_or(detected.arch),
            self.host_os.clone().unwrap_or(detected.os),
        )
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

/// Reports the error through the runner's failure channel and returns the
/// exit code.
fn handle_error(e: &anyhow::Error) -> i32 {
    WorkflowRunner::new(CommandFiles::default()).set_failed(&format!("{e:#}"));
    1
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    logging::init(settings.debug);

    let lookup = HttpReleaseLookup::new(settings.base_url.as_str())?;
    let cache = FsToolCache::new(&settings.tool_cache_root);
    let fetcher = HttpFetcher::new(&settings.temp_dir)?;
    let runner = WorkflowRunner::new(settings.command_files.clone());

    let paths = HeimDist::new(&settings.base_url, &lookup, &cache, &fetcher, &runner)
        .setup(&cli.specifier, &cli.host())
        .await?;

    set_outputs(&runner, &paths)?;
    Ok(())
}

fn set_outputs(env: &dyn ActionEnvironment, paths: &InstalledPaths) -> Result<()> {
    let home = paths.home.to_string_lossy();
    let bin = paths.bin.to_string_lossy();
    let runtime = paths.runtime.to_string_lossy();
    let cli = paths.cli.to_string_lossy();
    env.set_outputs(&[
        ("heimHome", &*home),
        ("bin", &*bin),
        ("runtime", &*runtime),
        ("cli", &*cli),
    ])?;
    Ok(())
}
