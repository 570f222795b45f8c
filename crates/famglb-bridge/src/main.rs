// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! famglb command-line tool
//!
//! - `famglb export <family.json>` writes one GLB with every configuration
//! - `famglb serve <family.json>` serves live updates over HTTP

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use famglb_bridge::{serve, spawn_authority, BridgeConfig};
use famglb_export::{ExportOptions, FamilyExporter};
use famglb_memdoc::MemoryDocument;
use famglb_model::{DetailLevel, FamilyDocument};
use log::info;
use std::path::{Path, PathBuf};

/// Export parametric families to GLB
#[derive(Parser)]
#[command(name = "famglb")]
#[command(about = "Export parametric families to GLB", long_about = None)]
#[command(version)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export every configuration of a family to one GLB file
    Export {
        /// Family document description (JSON)
        input: PathBuf,

        /// Folder the GLB is written to
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// coarse, medium or fine
        #[arg(long, default_value = "fine")]
        detail: DetailLevel,

        /// Export only the current configuration
        #[arg(long)]
        current_only: bool,
    },

    /// Serve live re-exports over HTTP
    Serve {
        /// Family document description (JSON)
        input: PathBuf,

        /// Bridge settings (JSON); flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        bind: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,

        /// coarse, medium or fine
        #[arg(long)]
        detail: Option<DetailLevel>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Export {
            input,
            output,
            detail,
            current_only,
        } => {
            let mut document = load(&input)?;
            let exporter = FamilyExporter::new(ExportOptions {
                output_folder: output,
                detail_level: detail,
                export_current_type_only: current_only,
            });

            let outcome = exporter.export(&mut document);
            if !outcome.success {
                bail!("{}", outcome);
            }
            println!("{}: {}", exporter.output_path(&document).display(), outcome);
        }

        Commands::Serve {
            input,
            config,
            bind,
            port,
            detail,
        } => {
            let mut settings = match config {
                Some(path) => BridgeConfig::from_path(&path)?,
                None => BridgeConfig::default(),
            };
            if let Some(bind) = bind {
                settings.bind_address = bind;
            }
            if let Some(port) = port {
                settings.port = port;
            }
            if let Some(detail) = detail {
                settings.detail_level = detail;
            }

            let document = load(&input)?;
            info!(
                "Serving {} ({} types)",
                document.title(),
                document.family_manager().types().len()
            );

            let (handle, _authority) = spawn_authority(Box::new(document), settings.detail_level)
                .context("Failed to start the authority thread")?;
            serve(&settings, handle).await?;
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<MemoryDocument> {
    MemoryDocument::from_path(path).with_context(|| format!("Failed to load {}", path.display()))
}
