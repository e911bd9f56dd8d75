use xxhash_rust::xxh3::xxh3_64;

/// Stable bucket for `key` among `buckets` reducers.
///
/// Uses xxh3 so the assignment is identical across processes and runs.
pub fn bucket_for(key: &str, buckets: usize) -> usize {
    if buckets <= 1 {
        return 0;
    }
    (xxh3_64(key.as_bytes()) % buckets as u64) as usize
}

/// Name of the output file written by reducer `index`.
pub fn part_file_name(index: usize) -> String {
    format!("part-{index:05}")
}
