//! CLI entry point: scriptable front end over `corelib::Ring`.

use clap::Parser;
use cli::{CliConfig, Command, CommandResult};
use corelib::RingBuilder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = CliConfig::parse();
    let ring_config = config.load_ring_config()?;
    let script = config.read_script()?;
    let ring = RingBuilder::new().config(ring_config).build();

    for (lineno, line) in script.lines().enumerate() {
        let parsed = match Command::parse(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("line {}: {e:#}", lineno + 1);
                continue;
            }
        };
        let Some(cmd) = parsed else { continue };
        match cmd.run(&ring).await {
            Ok(CommandResult::Continue) => {}
            Ok(CommandResult::Exit) => break,
            Err(e) => eprintln!("line {}: {e:#}", lineno + 1),
        }
    }

    Ok(())
}
