use crate::aggregate::Counts;
use crate::normalize::Bucket;

/// Whether `bucket` gets folded into `Other` under `threshold`.
///
/// `Unknown` is never merged, and neither is a bucket with no records.
/// Values already normalized to `Other` are part of `Other` regardless.
pub fn is_other(bucket: &Bucket, counts: &Counts, threshold: usize) -> bool {
    if *bucket == Bucket::Unknown || *bucket == Bucket::Other {
        return false;
    }
    let count = counts.get(bucket);
    count > 0 && count < threshold
}

/// Folds every bucket below `threshold` (except `Unknown`) into a single
/// `Other` bucket. `Other` only appears when at least one bucket merged or
/// some record was already `Other`.
pub fn bucket(counts: &Counts, threshold: usize) -> Counts {
    let mut kept = Counts::new();
    let mut other: Option<(usize, usize)> = None;

    for entry in counts.iter() {
        if is_other(&entry.bucket, counts, threshold) {
            let (count, first_seen) = other.get_or_insert((0, entry.first_seen));
            *count += entry.count;
            *first_seen = (*first_seen).min(entry.first_seen);
        } else {
            kept.add(entry.bucket.clone(), entry.count, entry.first_seen);
        }
    }

    if let Some((count, first_seen)) = other {
        kept.add(Bucket::Other, count, first_seen);
    }
    kept
}
