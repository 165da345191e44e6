use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "bodega",
    version,
    about = "Local, dependency-complete mirror for Chef cookbooks",
    long_about = "bodega — build and maintain a local mirror of cookbooks and their \
                  transitive dependencies.\n\nExamples:\n  bodega init\n  bodega mirror\n  \
                  bodega list\n  bodega cache path\n  bodega cache clean"
)]
pub struct BodegaCli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build or refresh the mirror from an inventory file
    Mirror {
        /// Inventory file describing catalogs and cookbook requirements
        #[arg(long, default_value = "inventory.yml")]
        inventory: PathBuf,
        /// Directory the mirror is stored in
        #[arg(long, default_value = "inventory")]
        directory: PathBuf,
    },
    /// List cookbooks already present in the mirror
    List {
        #[arg(long, default_value = "inventory")]
        directory: PathBuf,
    },
    /// Write a starter inventory file
    Init {
        #[arg(long, default_value = "inventory.yml")]
        path: PathBuf,
    },
    /// Inspect or clean the shared fetch cache
    Cache {
        #[command(subcommand)]
        cmd: CacheCmd,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheCmd {
    /// Show the shared fetch cache path on this machine
    Path,
    /// Remove everything in the shared fetch cache
    Clean,
}

impl BodegaCli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Mirror {
                inventory,
                directory,
            } => commands::mirror::cmd_mirror(&inventory, &directory),
            Commands::List { directory } => commands::list::cmd_list(&directory),
            Commands::Init { path } => commands::init::cmd_init(&path),
            Commands::Cache { cmd } => commands::cache::cmd_cache(cmd),
        }
    }
}
