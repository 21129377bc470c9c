//! Lookup table files
//!
//! Writes go to a sibling temporary file that is renamed over the target,
//! so a reader never sees a half-written table and a failed optimization
//! leaves the original file as it was.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{LutError, Result};
use crate::optimizer::{Optimized, run_optimization};
use crate::table::{LookupTable, SegmentedTable};

pub fn read_table(path: impl AsRef<Path>) -> Result<LookupTable> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| LutError::io(path, e))?;
    LookupTable::parse(&text)
}

pub fn read_segmented(path: impl AsRef<Path>) -> Result<SegmentedTable> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| LutError::io(path, e))?;
    SegmentedTable::parse(&text)
}

pub fn write_table(path: impl AsRef<Path>, table: &LookupTable) -> Result<()> {
    atomic_write(path.as_ref(), table.format().as_bytes())
}

pub fn write_segmented(path: impl AsRef<Path>, table: &SegmentedTable) -> Result<()> {
    atomic_write(path.as_ref(), table.format().as_bytes())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("lookup"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write-rename: the target is either the old file or the complete new one
fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let temp = temp_path(path);
    let written = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&temp)?;
        file.write_all(data)?;
        file.sync_all()
    })();
    if let Err(e) = written {
        let _ = fs::remove_file(&temp);
        return Err(LutError::io(&temp, e));
    }
    fs::rename(&temp, path).map_err(|e| {
        let _ = fs::remove_file(&temp);
        LutError::io(path, e)
    })
}

/// Optimize the table at `target` after the shape of the table at
/// `reference` and write the new weights back to `target`.
///
/// Nothing is written unless the optimization succeeds.
pub fn optimize_file(target: impl AsRef<Path>, reference: impl AsRef<Path>, cost: f64) -> Result<Optimized> {
    let target = target.as_ref();
    let table = read_table(target)?;
    let shape = read_table(reference)?;

    let optimized = run_optimization(&table, &shape, cost)?;
    write_table(target, &table.with_weights(&optimized.weights)?)?;
    log::info!(
        "wrote optimized weights to {} (rtp {:.4})",
        target.display(),
        optimized.rtp_after
    );
    Ok(optimized)
}
