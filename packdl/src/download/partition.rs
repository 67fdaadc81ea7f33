//! Byte-range partitioning of a resource across chunk workers.

/// Minimum number of chunk workers.
pub const MIN_THREADS: usize = 1;

/// Maximum number of chunk workers.
pub const MAX_THREADS: usize = 64;

/// Clamp a requested worker count to `[MIN_THREADS, MAX_THREADS]`.
pub fn clamp_threads(requested: usize) -> usize {
    requested.clamp(MIN_THREADS, MAX_THREADS)
}

/// A contiguous, inclusive byte range assigned to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    /// Worker index, in range order.
    pub index: usize,
    /// First byte offset.
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
}

impl ChunkRange {
    /// Number of bytes in the range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always false: a range holds at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Split `[0, total)` into `threads` contiguous ranges.
///
/// The last range absorbs the remainder of the integer division. The thread
/// count is raised to at least one and lowered to at most `total`, so no
/// range is ever empty. A zero-length resource yields no ranges.
///
/// # Examples
///
/// ```
/// use packdl::download::partition;
///
/// let ranges = partition(10, 3);
/// assert_eq!(ranges.len(), 3);
/// assert_eq!((ranges[0].start, ranges[0].end), (0, 2));
/// assert_eq!((ranges[2].start, ranges[2].end), (6, 9));
/// ```
pub fn partition(total: u64, threads: usize) -> Vec<ChunkRange> {
    if total == 0 {
        return Vec::new();
    }

    let count = (threads.max(1) as u64).min(total);
    let chunk = total / count;

    (0..count)
        .map(|i| {
            let start = i * chunk;
            let end = if i == count - 1 {
                total - 1
            } else {
                (i + 1) * chunk - 1
            };
            ChunkRange {
                index: i as usize,
                start,
                end,
            }
        })
        .collect()
}
