use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    carewise_cli::run()
}
