use std::io::Write;
use std::process::ExitCode;

use clap::Parser;

use mnenv::cli::{self, App, Cli, LinePrompt};
use mnenv::logging;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let app = match App::from_process() {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    let _guard = logging::init(&app.layout);

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(anyhow::Error::from)
        .and_then(|runtime| {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let mut prompt = LinePrompt::new(std::io::stdin().lock(), std::io::stderr());
            let result = runtime.block_on(cli::run(cli, &app, &mut out, &mut prompt));
            out.flush()?;
            result
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
