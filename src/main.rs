use std::process::ExitCode;
use std::time::Duration;

use catsearch::cli::{self, ParsedArgs};
use catsearch::{Config, run};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> ExitCode {
    let cli = match cli::parse_args(std::env::args_os()) {
        ParsedArgs::Run(cli) => cli,
        ParsedArgs::Info(text) => {
            print!("{text}");
            return ExitCode::SUCCESS;
        }
        ParsedArgs::Usage => {
            println!("{}", cli::USAGE);
            return ExitCode::from(1);
        }
    };

    match start(cli.port) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn start(port: u16) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::load()?;
    let worker_threads = config.general.worker_threads;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    if worker_threads > 0 {
        builder.worker_threads(worker_threads);
    }

    let runtime = builder.build()?;
    let result = runtime.block_on(run(config, port));

    // A pending stdin read would otherwise keep the runtime alive.
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}
