//! Fixed-size chunking and tree height planning.

/// Default chunk size in bytes (256 KiB).
pub const CHUNK_SIZE: usize = 256 * 1024;

/// Default maximum number of links per list node.
pub const BRANCHING_FACTOR: usize = 4096;

/// Split data into contiguous chunks of at most `chunk_size` bytes.
///
/// The last chunk may be shorter. Empty input yields exactly one empty chunk,
/// which is how an empty file is represented.
pub fn split(data: &[u8], chunk_size: usize) -> Vec<&[u8]> {
    assert!(chunk_size > 0, "chunk_size must be non-zero");
    if data.is_empty() {
        return vec![data];
    }
    data.chunks(chunk_size).collect()
}

/// Number of chunks a file of `len` bytes splits into: `ceil(len / chunk_size)`.
pub fn chunk_count(len: u64, chunk_size: usize) -> u64 {
    len.div_ceil(chunk_size as u64)
}

/// Smallest height `h >= 1` such that `branching_factor^h >= chunk_count`.
///
/// Uses exact integer multiplication. An overflowing capacity is
/// larger than any `u64` chunk count.
pub fn compute_height(chunk_count: u64, branching_factor: usize) -> u32 {
    assert!(branching_factor >= 2, "branching_factor must be at least 2");

    let branching = branching_factor as u64;
    let mut height = 1;
    let mut capacity = branching;
    while capacity < chunk_count {
        capacity = match capacity.checked_mul(branching) {
            Some(next) => next,
            None => return height + 1,
        };
        height += 1;
    }
    height
}
