use std::path::Path;

use tracing::info;

use common::{Bar, Error, Result};

/// Load a bar history from a CSV file with columns
/// `time,open,high,low,close,volume` (`time` in RFC 3339, UTC).
///
/// Bars must already be in ascending time order; out-of-order rows are
/// a data error, not something the replay engine will silently sort.
pub fn load_bars_csv(path: impl AsRef<Path>) -> Result<Vec<Bar>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;
    let mut bars = Vec::new();
    for row in reader.deserialize() {
        let bar: Bar = row?;
        if let Some(prev) = bars.last() {
            let prev: &Bar = prev;
            if bar.time <= prev.time {
                return Err(Error::Other(format!(
                    "bars out of order in {}: {} follows {}",
                    path.display(),
                    bar.time,
                    prev.time
                )));
            }
        }
        bars.push(bar);
    }
    info!(path = %path.display(), bars = bars.len(), "Bar history loaded");
    Ok(bars)
}
