//! Stages subcommand - show the filter chain the current config builds

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use crate::config::Config;

pub fn run(config: &Config) -> Result<()> {
    let chain =
        docsift_filters::build_chain(&config.stages).context("failed to build filter chain")?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("#").fg(Color::Cyan),
            Cell::new("Stage").fg(Color::Cyan),
        ]);
    for (i, name) in chain.stage_names().enumerate() {
        table.add_row(vec![Cell::new(i + 1), Cell::new(name)]);
    }
    eprintln!("\n{table}");
    Ok(())
}
