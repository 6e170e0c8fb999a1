use anyhow::Result;
use rollstat_cli::app;

fn main() -> Result<()> {
    app::run()
}
