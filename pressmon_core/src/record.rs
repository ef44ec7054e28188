//! Tab-separated session table: `Time(s)` then one column per channel.

use std::path::Path;

use eyre::WrapErr;

use crate::atomic::write_atomic;
use crate::error::Result;

const NAN: &str = "NaN";

/// Render per-channel series as a TSV table. Row `i` is recorded second
/// `i`; series shorter than the longest are padded with `NaN`.
pub fn render_table(history: &[Vec<f64>]) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(false)
        .from_writer(Vec::new());

    let mut header = vec!["Time(s)".to_string()];
    header.extend((1..=history.len()).map(|ch| format!("Channel {ch}")));
    wtr.write_record(&header)?;

    let rows = history.iter().map(Vec::len).max().unwrap_or(0);
    for i in 0..rows {
        let mut row = Vec::with_capacity(history.len() + 1);
        row.push(i.to_string());
        for series in history {
            row.push(match series.get(i) {
                Some(v) => format!("{v:?}"),
                None => NAN.to_string(),
            });
        }
        wtr.write_record(&row)?;
    }
    wtr.into_inner()
        .map_err(|e| eyre::eyre!("flush session table: {}", e.error()))
}

/// Write the session table to `path`, replacing it atomically.
pub fn write_session_record(path: &Path, history: &[Vec<f64>]) -> Result<()> {
    let bytes = render_table(history)?;
    write_atomic(path, &bytes).wrap_err_with(|| format!("write session record {path:?}"))?;
    tracing::info!(path = %path.display(), rows = history.first().map_or(0, Vec::len), "session record saved");
    Ok(())
}
