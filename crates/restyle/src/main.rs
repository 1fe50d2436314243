use anyhow::Error;
use log::error;
use restyle::RestyleConfig;
use restyle::cli::{Command, run};
use std::env;
use std::io::stdout;
use std::process::ExitCode;
use tokio::runtime::Runtime;

fn main() -> ExitCode {
    env_logger::init();

    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<(), Error> {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = Command::parse(&args)?;
    let config = RestyleConfig::from_env();
    let runtime = Runtime::new()?;
    let mut out = stdout().lock();
    runtime.block_on(run(runtime.handle(), &config, command, &mut out))
}
