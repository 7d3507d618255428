use rand::Rng;
use tracing::warn;

use crate::config::NO_FILE_SENTINEL;

/// File-list entries that name an actual file, in list order.
pub fn usable_files(files: &[String]) -> Vec<&str> {
    files
        .iter()
        .map(String::as_str)
        .filter(|file| !file.is_empty() && *file != NO_FILE_SENTINEL)
        .collect()
}

/// Picks a candidate index. An in-range `explicit_index` wins; otherwise the
/// index is drawn uniformly. Returns `None` when there are no candidates.
pub fn select_variant<R: Rng + ?Sized>(
    candidates: &[&str],
    explicit_index: Option<usize>,
    rng: &mut R,
) -> Option<usize> {
    if candidates.is_empty() {
        return None;
    }
    match explicit_index {
        Some(index) if index < candidates.len() => Some(index),
        Some(index) => {
            warn!(
                requested_index = index,
                candidate_count = candidates.len(),
                "stamp_variant_index_out_of_range"
            );
            Some(rng.gen_range(0..candidates.len()))
        }
        None => Some(rng.gen_range(0..candidates.len())),
    }
}
