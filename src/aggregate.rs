use dashmap::DashMap;
use rayon::prelude::*;

use crate::index::IndexSnapshot;

/// Items and bytes for one calendar year. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearBucket {
    pub year: i32,
    pub count: usize,
    pub total_bytes: u64,
}

/// Group a snapshot's items by year, newest year first.
pub fn bucket(snapshot: &IndexSnapshot) -> Vec<YearBucket> {
    let by_year: DashMap<i32, (usize, u64)> = DashMap::new();

    snapshot
        .item_map()
        .par_iter()
        .for_each(|(_, item)| {
            let mut entry = by_year.entry(item.year).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += item.byte_size;
        });

    let mut buckets: Vec<YearBucket> = by_year
        .into_iter()
        .map(|(year, (count, total_bytes))| YearBucket {
            year,
            count,
            total_bytes,
        })
        .collect();
    buckets.sort_unstable_by(|a, b| b.year.cmp(&a.year));
    buckets
}

/// Item count and bytes across all buckets.
pub fn totals(buckets: &[YearBucket]) -> (usize, u64) {
    buckets
        .iter()
        .fold((0, 0), |(count, bytes), b| (count + b.count, bytes + b.total_bytes))
}
