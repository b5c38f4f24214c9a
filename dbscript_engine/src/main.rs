#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! Load every script table and report what was accepted.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use log::info;

use dbscript_engine::{DBSCRIPT_ENGINE_VERSION, LoadReport, ScriptMgr, data_path, load_config};

fn main() -> Result<()> {
    env_logger::init();
    let config_path = env::args_os()
        .nth(1)
        .map_or_else(|| data_path("dbscripts.toml"), PathBuf::from);
    info!("dbscript_engine {DBSCRIPT_ENGINE_VERSION}: using '{}'", config_path.display());

    let config = load_config(&config_path);
    let (mgr, reports) = ScriptMgr::load(config).context("while loading script tables")?;

    println!("{}", format!("script data in '{}'", mgr.config().data_root().display()).bold());
    for report in &reports {
        print_report(report);
    }
    println!(
        "{} texts, {} script names, {} waypoint paths",
        mgr.texts().len(),
        mgr.registry().script_ids_count() - 1,
        mgr.waypoints().path_count()
    );

    let skipped: usize = reports.iter().map(|r| r.skipped.len()).sum();
    if skipped > 0 {
        println!("{}", format!("{skipped} rows rejected").red());
    }
    Ok(())
}

fn print_report(report: &LoadReport) {
    let line = format!(
        "{:<30} {:>6} commands {:>6} keys",
        report.table.table_name(),
        report.loaded(),
        report.keys
    );
    if report.skipped.is_empty() && report.missing_texts.is_empty() {
        println!("{}", line.green());
        return;
    }
    println!("{}", line.yellow());
    for error in &report.skipped {
        println!("    {} {error}", "skipped:".red());
    }
    if report.warnings > 0 {
        println!("    {} rows with values in unused columns", report.warnings);
    }
    if !report.missing_texts.is_empty() {
        let ids: Vec<String> = report.missing_texts.iter().map(ToString::to_string).collect();
        println!("    {} {}", "missing texts:".red(), ids.join(", "));
    }
}
