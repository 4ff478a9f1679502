// src/cli/handlers/synth.rs

use crate::{
    cli::{args::SynthArgs, handlers::commons},
    core::{paths, synthesizer},
    system::writer,
};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

/// Synthesizes the workspace and writes the files.
pub fn handle(args: SynthArgs) -> Result<()> {
    let config_path = commons::config_path(&args.workspace)?;
    let mut loaded = commons::load(&args.workspace)?;

    let files = synthesizer::synthesize(&mut loaded.workspace, &mut loaded.configurator)
        .context("Synthesis failed")?;

    let outdir = match &args.outdir {
        Some(dir) => paths::expand_user_path(dir)?,
        None => config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    if args.dry_run {
        for file in &files {
            println!("{} {}", "~".dimmed(), outdir.join(&file.path).display());
        }
        return Ok(());
    }

    let written = writer::write_files(&outdir, &files)?;
    println!(
        "{} {} of {} file(s) written to '{}'",
        "✔".green(),
        written,
        files.len(),
        outdir.display()
    );
    Ok(())
}
