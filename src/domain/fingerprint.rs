use sha2::{Digest, Sha256};

use crate::domain::dataset::Dataset;
use crate::domain::value_objects::Fingerprint;

/// Compute a SHA-256 fingerprint of a dataset's content and row order.
///
/// Algorithm:
/// 1. The header is serialised as a JSON array of column names.
/// 2. Each row is serialised as `<position>\t<JSON array of cells>`.
/// 3. Header and rows are fed to SHA-256 separated by `\n`.
///
/// Row position is hashed, so reordering rows changes the fingerprint.
///
/// Known limitation: cells are compared by their JSON spelling, so an
/// integer `5` and a float `5.0` produce different fingerprints even though
/// they hold the same number. A column re-typed between imports therefore
/// triggers a full rewrite of the cached table.
pub fn fingerprint(dataset: &Dataset) -> Fingerprint {
    let mut hasher = Sha256::new();

    let header = serde_json::to_string(dataset.columns()).unwrap_or_default();
    hasher.update(header.as_bytes());

    for (pos, row) in dataset.rows().iter().enumerate() {
        let cells = serde_json::to_string(row).unwrap_or_default();
        hasher.update(format!("\n{}\t{}", pos, cells).as_bytes());
    }

    Fingerprint(format!("{:x}", hasher.finalize()))
}
