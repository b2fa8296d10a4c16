//! CSV export for recorded snapshots.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::Snapshot;

/// Fixed leading columns; per-device columns follow.
const FIXED_COLUMNS: [&str; 7] = [
    "tick",
    "elapsed_s",
    "mode",
    "total_flow_lpm",
    "power_kw",
    "power_cost_per_hour",
    "total_bill",
];

/// Builds the header for a plant shaped like `snapshot`.
///
/// `level.<tank>` per tank, `pump.<pump>` per pump, then
/// `flow.<c>`, `usage.<c>`, `bill.<c>` per consumer.
pub fn header(snapshot: &Snapshot) -> Vec<String> {
    let mut cols: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    cols.extend(snapshot.tanks.iter().map(|t| format!("level.{}", t.id)));
    cols.extend(snapshot.pumps.iter().map(|p| format!("pump.{}", p.id)));
    for c in &snapshot.consumers {
        cols.push(format!("flow.{}", c.id));
        cols.push(format!("usage.{}", c.id));
        cols.push(format!("bill.{}", c.id));
    }
    cols
}

fn row(s: &Snapshot) -> Vec<String> {
    let mut fields = vec![
        s.tick.to_string(),
        format!("{:.3}", s.elapsed_s),
        s.mode.to_string(),
        format!("{:.4}", s.total_flow_lpm),
        format!("{:.4}", s.power.total_kw),
        format!("{:.4}", s.power.cost_per_hour),
        format!("{:.4}", s.total_bill),
    ];
    fields.extend(s.tanks.iter().map(|t| format!("{:.4}", t.level_percent)));
    fields.extend(s.pumps.iter().map(|p| u8::from(p.is_on).to_string()));
    for c in &s.consumers {
        fields.push(format!("{:.4}", c.flow_rate_lpm));
        fields.push(format!("{:.4}", c.daily_usage_liters));
        fields.push(format!("{:.4}", c.current_bill));
    }
    fields
}

/// Exports snapshots to a CSV file at the given path.
///
/// Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(snapshots: &[Snapshot], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(snapshots, buf)
}

/// Writes snapshots as CSV to any writer.
///
/// The header is taken from the first snapshot. Nothing is written for an
/// empty slice.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(snapshots: &[Snapshot], writer: impl Write) -> io::Result<()> {
    let Some(first) = snapshots.first() else {
        return Ok(());
    };
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(header(first))?;
    for s in snapshots {
        wtr.write_record(row(s))?;
    }

    wtr.flush()?;
    Ok(())
}
