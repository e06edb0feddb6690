//! JSON documents printed on stdout.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use mrv_common::PixelCounts;

/// A project that loaded cleanly.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub forest: String,
    pub name: String,
    pub start_date: String,
    pub features: usize,
    pub co2_factor: BTreeMap<String, f64>,
}

/// Pixel counts and CO2 estimate for one project and window.
#[derive(Debug, Clone, Serialize)]
pub struct ForestReport {
    pub forest: String,
    pub start_date: String,
    pub end_date: String,
    pub pixel_counts: PixelCounts,
    pub co2_tons: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub forest: String,
    pub start_date: String,
    pub end_date: String,
    pub cog_path: PathBuf,
}

/// Print one compact JSON document per line.
pub fn print_json_lines<T: Serialize>(items: &[T]) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for item in items {
        serde_json::to_writer(&mut out, item)?;
        writeln!(out)?;
    }
    Ok(())
}
