//! Reading current load order files.
//!
//! The sort consumes the current load order as a plain list of plugin
//! names. This module reads that list out of a `plugins.txt` or
//! `loadorder.txt` style file, and can identify the game a load order file
//! belongs to from the master files it names.

use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufRead, BufReader};

use anyhow::{Context, Result};
use camino::Utf8Path;

use crate::filename::compare_filenames;
use crate::game::GameType;

/// Read the plugin names out of a load order file.
///
/// Blank lines and `#` comments are skipped, and a leading `*`, `+` or `-`
/// activation marker is stripped from each entry.
///
/// # Arguments
/// * `path` - Path to the load order file (plugins.txt or loadorder.txt)
pub fn read_load_order(path: &Utf8Path) -> Result<Vec<String>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open load order file: {}", path))?;
    let reader = BufReader::new(file);

    let mut load_order = Vec::new();

    for line_result in reader.lines() {
        let line = line_result.context("Failed to read line from load order file")?;

        if let Some(plugin_name) = parse_load_order_line(&line) {
            load_order.push(plugin_name.to_string());
        }
    }

    tracing::debug!("Read {} entries from {}", load_order.len(), path);
    Ok(load_order)
}

/// Detect the game a load order file belongs to from the master files it
/// lists.
///
/// Where a base master is shared by several engine variants (e.g.
/// `Skyrim.esm`), the oldest variant is reported.
///
/// # Arguments
/// * `path` - Path to the load order file
///
/// # Returns
/// The detected game, or `None` if no known master file appears
pub fn detect_game_from_load_order(path: &Utf8Path) -> Result<Option<GameType>> {
    const GAME_MASTERS: [(&str, GameType); 7] = [
        ("Morrowind.esm", GameType::Tes3),
        ("Oblivion.esm", GameType::Tes4),
        ("Skyrim.esm", GameType::Tes5),
        ("Fallout3.esm", GameType::Fo3),
        ("FalloutNV.esm", GameType::Fonv),
        ("Fallout4.esm", GameType::Fo4),
        ("Starfield.esm", GameType::Starfield),
    ];

    for plugin_name in read_load_order(path)? {
        for (master, game_type) in GAME_MASTERS {
            if compare_filenames(&plugin_name, master) == Ordering::Equal {
                tracing::info!("Detected game type from load order: {}", game_type);
                return Ok(Some(game_type));
            }
        }
    }

    tracing::debug!("Could not detect game type from load order");
    Ok(None)
}

fn parse_load_order_line(line: &str) -> Option<&str> {
    let line = line.trim();

    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let plugin_name = line
        .strip_prefix(['*', '+', '-'])
        .map(str::trim)
        .unwrap_or(line);

    if plugin_name.is_empty() {
        None
    } else {
        Some(plugin_name)
    }
}
