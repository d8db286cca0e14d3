//! Stacking of multi-part episodes
//!
//! Some releases split one logical episode over several files in the same
//! folder (`race.part1.mkv`, `race.part2.mkv`). After a directory level has
//! been resolved, the records of those files are merged into one record with
//! several parts.

use crate::resolver::EpisodeRecord;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static RE_PART_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[ ._-]*\b(?:cd|dvd|disc|disk|part|pt)[ ._-]*[0-9]+\b")
        .expect("part marker pattern is valid")
});

/// Merges records that belong to the same episode
pub trait Stacker {
    /// Stacks the records of a single directory level in place
    fn stack(&self, records: &mut Vec<EpisodeRecord>);
}

/// Stacks files whose names differ only by a part marker
///
/// Only single-part records are considered, and only files in the same
/// directory are merged. The first record of a group keeps its position and
/// metadata and collects the parts of the later ones in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartStacker;

impl Stacker for PartStacker {
    fn stack(&self, records: &mut Vec<EpisodeRecord>) {
        let mut stacked: Vec<EpisodeRecord> = Vec::with_capacity(records.len());
        let mut groups: HashMap<(PathBuf, String), usize> = HashMap::new();

        for record in records.drain(..) {
            let key = match record.parts.as_slice() {
                [part] => stack_key(part),
                _ => None,
            };

            let Some(key) = key else {
                stacked.push(record);
                continue;
            };

            match groups.get(&key) {
                Some(&index) => {
                    let existing = &mut stacked[index];
                    tracing::debug!(title = %existing.title, "Stacking additional part");
                    for part in record.parts {
                        if !existing.parts.contains(&part) {
                            existing.parts.push(part);
                        }
                    }
                }
                None => {
                    groups.insert(key, stacked.len());
                    stacked.push(record);
                }
            }
        }

        *records = stacked;
    }
}

/// Directory and part-less file name of a file carrying a part marker
fn stack_key(part: &Path) -> Option<(PathBuf, String)> {
    let name = part.file_name()?.to_str()?;
    if !RE_PART_MARKER.is_match(name) {
        return None;
    }

    let directory = part.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
    let base = RE_PART_MARKER.replace(name, "").to_lowercase();
    Some((directory, base))
}
