#![warn(clippy::uninlined_format_args)]

mod bootstrap;
mod session;

use std::{borrow::Cow, env, fs, process};

use bootstrap::{AppConfig, init_logging};
use session::ScriptSession;
use stellarsplit_parser::parse_program;

type CliResult<T> = Result<T, Cow<'static, str>>;

fn main() {
    init_logging();

    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let Some(path) = env::args().nth(1) else {
        return Err("Usage: stellarsplit <ledger-script>".into());
    };

    let config = AppConfig::from_env().map_err(|err| err.to_string())?;
    tracing::debug!(currency = config.currency.code, path = %path, "Interpreter starting");

    let source =
        fs::read_to_string(&path).map_err(|err| format!("Failed to read '{path}': {err}"))?;
    let program = parse_program(&source).map_err(|err| err.to_string())?;

    let session =
        ScriptSession::open(&program.members, config.currency).map_err(|err| err.to_string())?;
    let output = session.run(&program).map_err(|err| err.to_string())?;

    print!("{output}");
    Ok(())
}
