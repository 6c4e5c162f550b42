// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, hand off to `ui`.
// - Errors are printed with their full cause chain and exit with status 1.

use std::process;

use deploy_cli::cli::Cli;
use deploy_cli::ui;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let cli = Cli::parse_args();
    init_logging(&cli);

    if let Err(e) = ui::run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

/// Log to stderr at `info`, or `debug` with `--verbose`. `RUST_LOG` still
/// applies to other targets.
fn init_logging(cli: &Cli) {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("deploy_cli={}", cli.log_level()).parse() {
        filter = filter.add_directive(directive);
    }

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(cli.global.verbose)
        .init();
}
