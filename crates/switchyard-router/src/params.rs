//! Route parameters and their buffer pool.

use std::sync::Arc;

use parking_lot::Mutex;

/// Reserved parameter key under which the matched route pattern is stored
/// when [`Router::save_matched_route_path`] is enabled.
///
/// [`Router::save_matched_route_path`]: crate::Router::save_matched_route_path
pub const MATCHED_ROUTE_PATH_KEY: &str = "$matchedRoutePath";

/// A single URL parameter, a key and a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name as registered, without the `:` or `*` marker.
    pub key: String,
    /// Decoded path segment(s) captured for this parameter.
    pub value: String,
}

/// Ordered collection of URL parameters captured during a lookup.
///
/// The first parameter in a pattern is the first element. The backing
/// buffer is borrowed from the router's pool and returned on drop, so
/// serving a request usually performs no parameter-vector allocation.
#[derive(Debug, Default)]
pub struct Params {
    items: Vec<Param>,
    pool: Option<Arc<Mutex<Vec<Vec<Param>>>>>,
}

impl Params {
    /// Create an empty, unpooled parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value of the first parameter with the given key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }

    /// Get the matched route pattern, if the router was configured to
    /// record it.
    #[must_use]
    pub fn matched_route_path(&self) -> Option<&str> {
        self.get(MATCHED_ROUTE_PATH_KEY)
    }

    /// Iterate over the parameters in capture order.
    pub fn iter(&self) -> std::slice::Iter<'_, Param> {
        self.items.iter()
    }

    /// Number of captured parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no parameters were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.items.push(Param {
            key: key.into(),
            value: value.into(),
        });
    }
}

impl std::ops::Index<usize> for Params {
    type Output = Param;

    /// The `index`-th parameter in capture order.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds; use [`len`](Self::len) to stay
    /// within it.
    fn index(&self, index: usize) -> &Param {
        &self.items[index]
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Drop for Params {
    fn drop(&mut self) {
        // Return the buffer to the pool, including on unwind paths.
        if let Some(pool) = self.pool.take() {
            let mut buf = std::mem::take(&mut self.items);
            buf.clear();
            pool.lock().push(buf);
        }
    }
}

/// Pool of parameter buffers shared by all lookups on a router.
#[derive(Debug, Default)]
pub(crate) struct ParamsPool {
    free: Arc<Mutex<Vec<Vec<Param>>>>,
}

impl ParamsPool {
    /// Borrow a buffer with at least `capacity` slots. The returned
    /// [`Params`] hands the buffer back when dropped.
    pub(crate) fn acquire(&self, capacity: usize) -> Params {
        let mut buf: Vec<Param> = self.free.lock().pop().unwrap_or_default();
        if buf.capacity() < capacity {
            buf.reserve(capacity);
        }
        Params {
            items: buf,
            pool: Some(Arc::clone(&self.free)),
        }
    }

    #[cfg(test)]
    fn idle(&self) -> usize {
        self.free.lock().len()
    }
}
