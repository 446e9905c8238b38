//! Read circuits and test patterns from files

mod bench;
mod patterns;

use std::fs::File;
use std::path::Path;

pub use bench::read_bench;
pub use patterns::{read_patterns, write_patterns};

use crate::circuit::Circuit;
use crate::error::{Error, Result};
use crate::value::Logic;

/// Read a circuit from a file
///
/// Following extensions are supported: .bench
pub fn read_circuit_file<V: Logic>(path: &Path) -> Result<Circuit<V>> {
    match path.extension() {
        Some(s) if s == "bench" => read_bench(File::open(path)?),
        Some(s) => Err(Error::UnsupportedFormat(s.to_string_lossy().into_owned())),
        None => Err(Error::UnsupportedFormat(format!(
            "no extension given for {}",
            path.display()
        ))),
    }
}

/// Read patterns from a file
pub fn read_pattern_file(path: &Path) -> Result<Vec<Vec<Option<bool>>>> {
    read_patterns(File::open(path)?)
}

/// Write patterns to a file
pub fn write_pattern_file(path: &Path, patterns: &[Vec<Option<bool>>]) -> Result<()> {
    let mut f = File::create(path)?;
    write_patterns(&mut f, patterns)
}
