use anyhow::Result;
use benchplot::cli;

fn main() -> Result<()> {
    cli::handle_calls()
}
