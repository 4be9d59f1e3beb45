//! PdmlView: packet dissection tree viewer.
//!
//! Thin binary entry point. All logic lives in the `pdmlview-core` crate;
//! this prints the decoded tree the way a tree widget would show it, plus
//! the hex highlight layers for a chosen byte offset.

use anyhow::{Context, Result};
use clap::Parser;
use pdmlview_core::config::{ViewerConfig, CONFIG_FILE_NAME};
use pdmlview_core::display::visible_rows;
use pdmlview_core::expansion::ExpandedPaths;
use pdmlview_core::render::render_subtree;
use pdmlview_core::watcher::ConfigWatcher;
use pdmlview_core::{decode_packet, packet_bytes, DisplayModel, NodeRef, SharedExpandedPaths};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pdmlview")]
#[command(about = "Show a tshark PDML packet dissection as a collapsible tree")]
struct Cli {
    /// PDML file: one <packet>, or a `tshark -T pdml` capture (its first packet is shown)
    pdml: PathBuf,

    /// Byte offset to resolve into hex highlight layers
    #[arg(long)]
    offset: Option<usize>,

    /// Include the whole-packet frame layer when resolving --offset
    #[arg(long)]
    include_first: bool,

    /// Expand the first field with this canonical name (repeatable)
    #[arg(long = "expand", value_name = "FIELD")]
    expand: Vec<String>,

    /// Config file
    #[arg(long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Expansion-state file, loaded before and saved after (overrides config)
    #[arg(long)]
    state: Option<PathBuf>,

    /// Print every node, ignoring expansion state
    #[arg(long)]
    all: bool,

    /// Re-render whenever the config file changes
    #[arg(long)]
    watch: bool,

    /// Debug logging
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let data = std::fs::read(&cli.pdml)
        .with_context(|| format!("failed to read {}", cli.pdml.display()))?;
    let packet = packet_bytes(&data)
        .with_context(|| format!("no packet found in {}", cli.pdml.display()))?;

    let config = ViewerConfig::load(&cli.config)?;
    let state_file = cli.state.clone().or_else(|| config.expanded_paths_file.clone());
    let store = match &state_file {
        Some(path) => ExpandedPaths::load(path)?,
        None => ExpandedPaths::new(),
    }
    .shared();

    show(&cli, &config, packet, &store);
    if let Some(path) = &state_file {
        save_state(&store, path)?;
    }

    if cli.watch {
        let watcher = ConfigWatcher::new(cli.config.clone())?;
        tracing::info!("Watching {} for changes", cli.config.display());
        while watcher.config_changed().recv().is_ok() {
            match ViewerConfig::load(&cli.config) {
                Ok(config) => show(&cli, &config, packet, &store),
                Err(e) => tracing::warn!("Keeping previous config: {e}"),
            }
            if let Some(path) = &state_file {
                save_state(&store, path)?;
            }
        }
        watcher.close()?;
    }
    Ok(())
}

/// Decode and print one view of the packet.
fn show(cli: &Cli, config: &ViewerConfig, data: &[u8], store: &SharedExpandedPaths) {
    let Some(tree) = decode_packet(data, store) else {
        println!("(no detail view for this packet)");
        return;
    };

    for name in &cli.expand {
        match tree.find(name) {
            Some(idx) => NodeRef::new(&tree, idx).set_collapsed(false),
            None => tracing::warn!("No field named {name:?}"),
        }
    }

    if cli.all {
        println!("{}", render_subtree(&tree, tree.root(), config.indent_width));
    } else {
        for row in visible_rows(tree.root_ref()) {
            let marker = match (row.model.has_children(), row.model.is_collapsed()) {
                (false, _) => ' ',
                (true, true) => '+',
                (true, false) => '-',
            };
            println!(
                "{:width$}{marker} {}",
                "",
                row.model.label(),
                width = config.indent_width * row.depth
            );
        }
    }

    if let Some(offset) = cli.offset {
        let include_first = cli.include_first || config.hex_include_first;
        let layers = tree.hex_layers(offset, include_first);
        if layers.is_empty() {
            println!("byte {offset}: no layers");
        }
        for layer in layers {
            let node = tree.node(layer.node);
            println!(
                "byte {offset}: {:<6} {:>5}..{:<5} {}",
                layer.kind.label(),
                layer.start,
                layer.end,
                node.name
            );
        }
    }
}

fn save_state(store: &SharedExpandedPaths, path: &Path) -> Result<()> {
    store
        .lock()
        .save(path)
        .with_context(|| format!("failed to persist expansion state to {}", path.display()))
}
