//! Arena-backed doubly-linked recency list.
//!
//! Slots live in a single `Vec` and refer to their neighbours by index, so
//! the prev/next cycle through the sentinels never needs shared ownership.
//! Index 0 is the head sentinel (most recently used end) and index 1 is the
//! tail sentinel (least recently used end). Freed slots are recycled.

use crate::error::CacheError;

/// Head sentinel (most recently used end).
pub(crate) const HEAD: usize = 0;
/// Tail sentinel (least recently used end).
pub(crate) const TAIL: usize = 1;

/// A single arena slot. Sentinels carry no entry.
struct Slot<K, V> {
    entry: Option<(K, V)>,
    prev: usize,
    next: usize,
}

impl<K, V> Slot<K, V> {
    fn sentinel() -> Self {
        Self {
            entry: None,
            prev: HEAD,
            next: TAIL,
        }
    }
}

/// Recency ordering over key/value entries, addressed by slot index.
pub(crate) struct OrderList<K, V> {
    slots: Vec<Slot<K, V>>,
    free: Vec<usize>,
    len: usize,
}

impl<K, V> OrderList<K, V> {
    /// Creates an empty list with room for `capacity` entries plus sentinels.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity.saturating_add(2));
        slots.push(Slot::sentinel());
        slots.push(Slot::sentinel());

        Self {
            slots,
            free: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Stores a new entry and links it right after the head.
    /// Returns the slot index now holding it.
    pub(crate) fn push_front(&mut self, key: K, value: V) -> usize {
        let idx = self.alloc(key, value);
        self.link_front(idx);
        self.len += 1;
        idx
    }

    /// Marks `idx` as most recently used.
    pub(crate) fn move_to_front(&mut self, idx: usize) {
        if self.slots[HEAD].next == idx {
            return;
        }
        self.unlink(idx);
        self.link_front(idx);
    }

    /// Index of the least recently used entry, if any.
    pub(crate) fn back(&self) -> Option<usize> {
        match self.slots[TAIL].prev {
            HEAD => None,
            idx => Some(idx),
        }
    }

    /// Detaches and returns the least recently used entry.
    pub(crate) fn pop_back(&mut self) -> Option<(K, V)> {
        let idx = self.back()?;
        self.remove(idx)
    }

    /// Detaches the entry at `idx` and recycles its slot.
    pub(crate) fn remove(&mut self, idx: usize) -> Option<(K, V)> {
        if idx == HEAD || idx == TAIL {
            return None;
        }
        let entry = self.slots.get_mut(idx)?.entry.take()?;
        self.unlink(idx);
        self.free.push(idx);
        self.len -= 1;
        Some(entry)
    }

    pub(crate) fn key(&self, idx: usize) -> Option<&K> {
        self.slots.get(idx)?.entry.as_ref().map(|(k, _)| k)
    }

    pub(crate) fn value(&self, idx: usize) -> Option<&V> {
        self.slots.get(idx)?.entry.as_ref().map(|(_, v)| v)
    }

    pub(crate) fn value_mut(&mut self, idx: usize) -> Option<&mut V> {
        self.slots.get_mut(idx)?.entry.as_mut().map(|(_, v)| v)
    }

    /// Drops every entry. Allocated slot storage is kept for reuse.
    pub(crate) fn clear(&mut self) {
        self.slots.truncate(2);
        self.slots[HEAD] = Slot::sentinel();
        self.slots[TAIL] = Slot::sentinel();
        self.free.clear();
        self.len = 0;
    }

    /// Iterates entries from most to least recently used.
    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            front: self.slots[HEAD].next,
            back: self.slots[TAIL].prev,
            remaining: self.len,
        }
    }

    /// Walks the list in both directions and checks link symmetry, sentinel
    /// placement and the recorded length. Returns the number of entries.
    pub(crate) fn check_links(&self) -> Result<usize, CacheError> {
        let slot_count = self.slots.len();
        let mut count = 0;
        let mut prev = HEAD;
        let mut cur = self.slots[HEAD].next;

        while cur != TAIL {
            if cur >= slot_count || cur == HEAD {
                return Err(CacheError::Corrupted(format!(
                    "forward link from slot {} points at {}",
                    prev, cur
                )));
            }
            let slot = &self.slots[cur];
            if slot.prev != prev {
                return Err(CacheError::Corrupted(format!(
                    "slot {} has prev {} but is reached from {}",
                    cur, slot.prev, prev
                )));
            }
            if slot.entry.is_none() {
                return Err(CacheError::Corrupted(format!(
                    "linked slot {} holds no entry",
                    cur
                )));
            }
            count += 1;
            if count > slot_count {
                return Err(CacheError::Corrupted("cycle in recency list".to_string()));
            }
            prev = cur;
            cur = slot.next;
        }

        if self.slots[TAIL].prev != prev {
            return Err(CacheError::Corrupted(format!(
                "tail sentinel points back at {} instead of {}",
                self.slots[TAIL].prev, prev
            )));
        }
        if self.slots[HEAD].entry.is_some() || self.slots[TAIL].entry.is_some() {
            return Err(CacheError::Corrupted("sentinel holds an entry".to_string()));
        }
        if count != self.len {
            return Err(CacheError::Corrupted(format!(
                "list walk found {} entries but length is {}",
                count, self.len
            )));
        }

        Ok(count)
    }

    fn alloc(&mut self, key: K, value: V) -> usize {
        let slot = Slot {
            entry: Some((key, value)),
            prev: HEAD,
            next: TAIL,
        };
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        }
    }

    fn unlink(&mut self, idx: usize) {
        let prev = self.slots[idx].prev;
        let next = self.slots[idx].next;

        self.slots[prev].next = next;
        self.slots[next].prev = prev;
    }

    fn link_front(&mut self, idx: usize) {
        let head_next = self.slots[HEAD].next;

        self.slots[idx].prev = HEAD;
        self.slots[idx].next = head_next;

        self.slots[HEAD].next = idx;
        self.slots[head_next].prev = idx;
    }
}

/// Borrowing iterator over `(key, value)` pairs, most recently used first.
pub struct Iter<'a, K, V> {
    slots: &'a [Slot<K, V>],
    front: usize,
    back: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let slot = &self.slots[self.front];
        self.front = slot.next;
        self.remaining -= 1;
        slot.entry.as_ref().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let slot = &self.slots[self.back];
        self.back = slot.prev;
        self.remaining -= 1;
        slot.entry.as_ref().map(|(k, v)| (k, v))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
