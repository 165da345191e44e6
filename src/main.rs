use anyhow::Result;
use bodega::cli::BodegaCli;
use clap::Parser;

fn main() {
    if let Err(e) = real_main() {
        eprintln!("bodega error: {:#}", e);
        std::process::exit(1);
    }
}

fn real_main() -> Result<()> {
    let cli = BodegaCli::parse();
    cli.run()
}
