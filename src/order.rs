use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::aggregate::{BucketCount, Counts};
use crate::normalize::Bucket;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OrderMode {
    /// Largest share first; ties go to whichever bucket was seen first.
    Proportion,
    /// Numbers ascending, then text, then `Unknown`, then `Other`.
    Trend,
    /// Order in which buckets first appeared in the records.
    FirstSeen,
}

pub fn order(counts: Counts, mode: OrderMode) -> Vec<BucketCount> {
    let mut entries = counts.into_entries();
    match mode {
        OrderMode::Proportion => entries.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.first_seen.cmp(&b.first_seen))
        }),
        OrderMode::Trend => entries.sort_by(trend_cmp),
        OrderMode::FirstSeen => entries.sort_by_key(|entry| entry.first_seen),
    }
    entries
}

fn trend_rank(bucket: &Bucket) -> u8 {
    match bucket {
        Bucket::Number(_) => 0,
        Bucket::Text(_) => 1,
        Bucket::Unknown => 2,
        Bucket::Other => 3,
    }
}

fn trend_cmp(a: &BucketCount, b: &BucketCount) -> Ordering {
    let by_value = match (&a.bucket, &b.bucket) {
        (Bucket::Number(x), Bucket::Number(y)) => x.cmp(y),
        (Bucket::Text(x), Bucket::Text(y)) => x.cmp(y),
        _ => Ordering::Equal,
    };
    trend_rank(&a.bucket)
        .cmp(&trend_rank(&b.bucket))
        .then(by_value)
        .then_with(|| a.first_seen.cmp(&b.first_seen))
}
