//! Path-splitting helpers and the pooled capture buffers used when
//! assembling wildcard and catch-all remainders.

use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// Splits a request path or pattern into its segments.
///
/// Leading and trailing slashes are skipped and empty segments (from
/// consecutive slashes) are dropped, so `/foo//bar/` yields `foo`, `bar`.
///
/// # Examples
/// ```rust
/// let segments: Vec<&str> = routier::operations::util::split_path("/foo//bar/").collect();
/// assert_eq!(segments, vec!["foo", "bar"]);
/// let root: Vec<&str> = routier::operations::util::split_path("/").collect();
/// assert_eq!(root, Vec::<&str>::new());
/// ```
#[inline]
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Lower-cases each segment for case-insensitive static lookups. Captured
/// parameter values keep the original casing; only tree keys use these.
pub(crate) fn lowercase_segments(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_lowercase()).collect()
}

/// Upper bounds for the capture-buffer free list: how many buffers to keep
/// and how large a buffer may be before it is dropped instead of pooled.
const POOL_MAX_BUFFERS: usize = 32;
const POOL_MAX_CAPACITY: usize = 4096;

static CAPTURE_POOL: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Takes a cleared buffer from the pool, or allocates a fresh one.
pub(crate) fn acquire_buffer() -> String {
    CAPTURE_POOL.lock().pop().unwrap_or_default()
}

/// Returns a buffer to the pool. Oversized buffers are dropped so a single
/// pathological request cannot pin memory for the rest of the process.
pub(crate) fn release_buffer(mut buffer: String) {
    if buffer.capacity() > POOL_MAX_CAPACITY {
        return;
    }
    buffer.clear();
    let mut pool = CAPTURE_POOL.lock();
    if pool.len() < POOL_MAX_BUFFERS {
        pool.push(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_paths() {
        assert_eq!(split_path("").collect::<Vec<&str>>(), Vec::<&str>::new());
        assert_eq!(split_path("/").collect::<Vec<&str>>(), Vec::<&str>::new());
        assert_eq!(split_path("path").collect::<Vec<&str>>(), vec!["path"]);
        assert_eq!(split_path("/path/").collect::<Vec<&str>>(), vec!["path"]);
        assert_eq!(
            split_path("//path//to//resource//").collect::<Vec<&str>>(),
            vec!["path", "to", "resource"]
        );
    }

    #[test]
    fn test_lowercase_segments() {
        assert_eq!(
            lowercase_segments(&["Docs", "README"]),
            vec!["docs".to_string(), "readme".to_string()]
        );
    }

    #[test]
    fn test_buffer_pool_round_trip() {
        let mut buffer = acquire_buffer();
        assert!(buffer.is_empty());
        buffer.push_str("some/capture");
        release_buffer(buffer);

        let reused = acquire_buffer();
        assert!(reused.is_empty(), "pooled buffers must come back cleared");
        release_buffer(reused);
    }

    #[test]
    fn test_buffer_pool_drops_oversized_buffers() {
        let mut buffer = acquire_buffer();
        buffer.reserve(POOL_MAX_CAPACITY + 1);
        // Must not panic; the buffer is simply not pooled again.
        release_buffer(buffer);
    }
}
