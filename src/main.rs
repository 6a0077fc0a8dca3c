use clap::Parser;

use envtiers::cli::{Cli, execute_command, init_logger_from_cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger_from_cli(&cli)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = execute_command(&cli, &mut out) {
        tracing::error!(error = %e, "Command failed");
        return Err(e);
    }
    Ok(())
}
