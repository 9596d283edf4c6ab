use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::ArgGroup;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use refdocs::{DEFAULT_CONFIG, DEFAULT_TEMPLATE_DIR, OutputTarget, RefdocsOptions, run_main};

#[derive(Parser, Debug)]
#[command(
    name = "refdocs",
    about = "refdocs: cross-linked API reference documents from type declarations",
    version,
    group = ArgGroup::new("output").required(true).args(["out_file", "http_addr"])
)]
pub struct Cli {
    /// Directory of package manifests (point this at the apis root)
    #[arg(long = "api-dir", value_name = "DIR")]
    api_dir: PathBuf,

    /// Path to the JSON config file
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Directory of `*.tpl` templates
    #[arg(long = "template-dir", value_name = "DIR", default_value = DEFAULT_TEMPLATE_DIR)]
    template_dir: PathBuf,

    /// Write the document to this file
    #[arg(long = "out-file", value_name = "FILE")]
    out_file: Option<PathBuf>,

    /// Serve the document over HTTP on this address (e.g. :8080)
    #[arg(long = "http-addr", value_name = "ADDR")]
    http_addr: Option<String>,

    /// Log at debug level
    #[arg(short = 'v', long, default_value_t = false)]
    verbose: bool,
}

impl Cli {
    fn into_options(self) -> RefdocsOptions {
        let target = match (self.out_file, self.http_addr) {
            (Some(path), _) => OutputTarget::File(path),
            (None, Some(addr)) => OutputTarget::Http(addr),
            // clap rejects this through the `output` group
            (None, None) => unreachable!("an output target is required"),
        };
        RefdocsOptions::new(self.api_dir, target)
            .with_config(self.config)
            .with_template_dir(self.template_dir)
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(args: Cli) -> ExitCode {
    let total_start = Instant::now();
    init_tracing(args.verbose);

    let opts = args.into_options();
    let code = match run_main(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            tracing::error!(error = %e, "execution failed");
            ExitCode::FAILURE
        }
    };

    let total_secs = total_start.elapsed().as_secs_f64();
    tracing::info!(total_secs, "complete");
    code
}

pub fn main() -> ExitCode {
    let args = Cli::parse();
    run(args)
}
