//! LRU-K page replacement (§4.2).
//!
//! Frames with fewer than `k` recorded accesses live in `history`
//! (oldest-evictable-first); once a frame's access count reaches `k` it
//! moves to `cache` and is ranked by how long ago its *k*-th-most-recent
//! access happened, not by raw recency. Both lists are kept
//! most-recent-first (`push_front` on access); eviction scans each list
//! from its back (oldest) toward its front (newest) for the first
//! evictable entry, checking `history` before `cache`.

use std::collections::{HashMap, VecDeque};

pub type FrameId = usize;

#[derive(Debug, thiserror::Error)]
pub enum ReplacerError {
    #[error("frame {0} is not evictable")]
    NotEvictable(FrameId),
}

pub struct LruKReplacer {
    k: usize,
    history: VecDeque<FrameId>,
    cache: VecDeque<FrameId>,
    access_count: HashMap<FrameId, usize>,
    evictable: HashMap<FrameId, bool>,
    evictable_count: usize,
}

impl LruKReplacer {
    pub fn new(k: usize) -> Self {
        assert!(k >= 1, "k must be at least 1");
        Self {
            k,
            history: VecDeque::new(),
            cache: VecDeque::new(),
            access_count: HashMap::new(),
            evictable: HashMap::new(),
            evictable_count: 0,
        }
    }

    fn remove_from(list: &mut VecDeque<FrameId>, frame_id: FrameId) {
        if let Some(pos) = list.iter().position(|&f| f == frame_id) {
            list.remove(pos);
        }
    }

    /// Records a new access to `frame_id`, creating its bookkeeping entry
    /// if this is its first access.
    pub fn access(&mut self, frame_id: FrameId) {
        let count = self.access_count.entry(frame_id).or_insert(0);
        *count += 1;
        let count = *count;

        if count == self.k {
            Self::remove_from(&mut self.history, frame_id);
            self.cache.push_front(frame_id);
        } else if count > self.k {
            Self::remove_from(&mut self.cache, frame_id);
            self.cache.push_front(frame_id);
        } else {
            Self::remove_from(&mut self.history, frame_id);
            self.history.push_front(frame_id);
        }
    }

    /// Marks whether `frame_id` is a candidate for eviction. A no-op for
    /// a frame that has never been accessed.
    pub fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        if !self.access_count.contains_key(&frame_id) {
            return;
        }
        let was_evictable = *self.evictable.get(&frame_id).unwrap_or(&false);
        if was_evictable == evictable {
            return;
        }
        self.evictable.insert(frame_id, evictable);
        if evictable {
            self.evictable_count += 1;
        } else {
            self.evictable_count -= 1;
        }
    }

    fn scan_evictable(&self, list: &VecDeque<FrameId>) -> Option<FrameId> {
        list.iter()
            .rev()
            .find(|&&frame_id| *self.evictable.get(&frame_id).unwrap_or(&false))
            .copied()
    }

    /// Returns the frame to evict, per the history-then-cache,
    /// oldest-first scan order, without removing its bookkeeping (the
    /// caller must still call [`Self::remove`]).
    pub fn evict(&self) -> Option<FrameId> {
        self.scan_evictable(&self.history)
            .or_else(|| self.scan_evictable(&self.cache))
    }

    /// Drops all bookkeeping for `frame_id`. Errors if it is not
    /// currently evictable (a pinned frame must never be forgotten).
    pub fn remove(&mut self, frame_id: FrameId) -> Result<(), ReplacerError> {
        let is_evictable = *self.evictable.get(&frame_id).unwrap_or(&false);
        if !is_evictable {
            return Err(ReplacerError::NotEvictable(frame_id));
        }
        let count = *self.access_count.get(&frame_id).unwrap_or(&0);
        if count < self.k {
            Self::remove_from(&mut self.history, frame_id);
        } else {
            Self::remove_from(&mut self.cache, frame_id);
        }
        self.access_count.remove(&frame_id);
        self.evictable.remove(&frame_id);
        self.evictable_count -= 1;
        Ok(())
    }

    pub fn evictable_count(&self) -> usize {
        self.evictable_count
    }
}
