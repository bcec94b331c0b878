use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// FIFO shared between the input side (producer) and the render thread (consumer).
pub struct RenderQueue<T> {
    inner: Mutex<VecDeque<T>>,
}

impl<T> Default for RenderQueue<T> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }
}

impl<T> RenderQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    // Queued items stay valid even if a producer panicked mid-push.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, item: T) {
        self.lock().push_back(item);
    }

    /// Takes everything queued so far, oldest first. Items pushed while the caller
    /// processes the batch wait for the next drain.
    pub fn drain(&self) -> Vec<T> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<T> fmt::Debug for RenderQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderQueue")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_fifo_order() {
        let q = RenderQueue::new();
        q.push(1);
        q.push(2);
        q.push(3);
        assert_eq!(q.drain(), vec![1, 2, 3]);
        assert!(q.is_empty());
    }
}
