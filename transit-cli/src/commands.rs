//! Subcommand handlers. Each one opens the file in the session, applies
//! the requested events, and writes its report to `out`.

use crate::{CatalogAction, Commands};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use transit_core::{MarkerLayout, Session, Side};

pub fn run(session: &mut Session, command: Commands, out: &mut impl Write) -> Result<()> {
    match command {
        Commands::Info { file } => {
            open(session, &file)?;
            info(session, out)
        }
        Commands::Fold {
            file,
            epoch,
            period,
            detrend,
        } => {
            open(session, &file)?;
            session.set_detrend(detrend)?;
            session.edit_fields(Some(epoch), Some(period))?;
            session.toggle_fold()?;
            write_series(session, "folded_time,flux", out)
        }
        Commands::Detrend { file } => {
            open(session, &file)?;
            session.set_detrend(true)?;
            write_series(session, "time,flux", out)
        }
        Commands::Markers {
            file,
            epoch,
            period,
        } => {
            open(session, &file)?;
            session.edit_fields(Some(epoch), period)?;
            let frame = session.frame().context("No light curve open")?;
            write_markers(&frame.markers, out)
        }
        Commands::Catalog { file, action } => {
            open(session, &file)?;
            catalog(session, action, out)
        }
    }
}

fn open(session: &mut Session, file: &Path) -> Result<()> {
    session
        .open_path(file)
        .with_context(|| format!("Failed to open light curve {}", file.display()))
}

fn info(session: &Session, out: &mut impl Write) -> Result<()> {
    let series = session.series().context("No light curve open")?;
    let (first, last) = series.bounds();

    if let Some(title) = series.title() {
        writeln!(out, "{title}")?;
    }
    writeln!(out, "points: {}", series.len())?;
    writeln!(out, "time range: {first} .. {last} days")?;
    writeln!(out, "content hash: {}", session.hash().unwrap_or_default())?;

    let catalog = session.catalog().context("No light curve open")?;
    writeln!(out, "saved transits: {}", catalog.len())?;
    for (index, entry) in catalog.iter().enumerate() {
        writeln!(out, "  [{index}] {entry}")?;
    }
    Ok(())
}

fn write_series(session: &Session, header: &str, out: &mut impl Write) -> Result<()> {
    let frame = session.frame().context("No light curve open")?;
    writeln!(out, "{header}")?;
    for (x, y) in frame.x.iter().zip(&frame.y) {
        writeln!(out, "{x},{y}")?;
    }
    Ok(())
}

fn write_markers(layout: &MarkerLayout, out: &mut impl Write) -> Result<()> {
    if let Some(first) = layout.first {
        writeln!(out, "first: {first}")?;
    }
    for marker in layout.repeats.iter() {
        let side = match marker.side {
            Side::Left => "left",
            Side::Right => "right",
        };
        writeln!(out, "{side} {}: {}", marker.index, marker.position)?;
    }
    Ok(())
}

fn catalog(session: &mut Session, action: CatalogAction, out: &mut impl Write) -> Result<()> {
    match action {
        CatalogAction::List => {}
        CatalogAction::Add { epoch, period } => {
            session.edit_fields(Some(epoch), period)?;
            let index = session.save_candidate()?;
            log::info!("Added transit entry {index}");
        }
        CatalogAction::Remove { index } => {
            let entry = session.delete_entry(index)?;
            log::info!("Removed transit entry {index}: {entry}");
        }
    }

    let catalog = session.catalog().context("No light curve open")?;
    for (index, entry) in catalog.iter().enumerate() {
        writeln!(out, "[{index}] {entry}")?;
    }
    Ok(())
}
