use ringlog_api::{Location, Record, StoreError};

/// Number of records kept when nothing else is configured.
pub const DEFAULT_CAPACITY: usize = 10;

// ═══════════════════════════════════════════════════════════════
//  EntryStore
// ═══════════════════════════════════════════════════════════════

/// Fixed-size ring of records. Keeps the newest `capacity` records;
/// inserting into a full ring overwrites the oldest one.
///
/// `in_offs` is the slot the next record goes to, `out_offs` the slot of
/// the oldest retained record. They are equal both when the ring is empty
/// and when it is full, `full` tells the two apart.
pub struct EntryStore {
    slots: Box<[Option<Record>]>,
    in_offs: usize,
    out_offs: usize,
    full: bool,
}

impl EntryStore {
    pub fn new(capacity: usize) -> Result<Self, StoreError> {
        if capacity == 0 {
            return Err(StoreError::ZeroCapacity);
        }
        Ok(Self {
            slots: (0..capacity).map(|_| None).collect(),
            in_offs: 0,
            out_offs: 0,
            full: false,
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        if self.full {
            self.capacity()
        } else {
            (self.in_offs + self.capacity() - self.out_offs) % self.capacity()
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.full && self.in_offs == self.out_offs
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Insert `record` as the newest entry.
    ///
    /// Returns the evicted oldest record when the ring was already full.
    pub fn add(&mut self, record: Record) -> Option<Record> {
        let evicted = self.slots[self.in_offs].replace(record);
        debug_assert_eq!(evicted.is_some(), self.full);

        self.in_offs = (self.in_offs + 1) % self.capacity();
        if self.full {
            self.out_offs = self.in_offs;
        }
        self.full = self.in_offs == self.out_offs;
        evicted
    }

    /// Record at retention index `index` (0 = oldest).
    pub fn get(&self, index: usize) -> Option<&Record> {
        if index >= self.len() {
            return None;
        }
        self.slots[(self.out_offs + index) % self.capacity()].as_ref()
    }

    /// Retained records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Record> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Length of the concatenation of all retained records.
    pub fn total_len(&self) -> usize {
        self.iter().map(Record::len).sum()
    }

    /// Resolve a flat offset into (retention index, offset inside record).
    pub fn locate(&self, offset: usize) -> Option<Location> {
        let mut start = 0;
        for (record_index, record) in self.iter().enumerate() {
            let end = start + record.len();
            if offset < end {
                return Some(Location { record_index, byte_offset: offset - start });
            }
            start = end;
        }
        None
    }

    /// Record containing flat `offset` and the offset inside it, or `None`
    /// when `offset` is at or beyond the end of retained data.
    pub fn find(&self, offset: usize) -> Option<(&Record, usize)> {
        let loc = self.locate(offset)?;
        self.get(loc.record_index).map(|r| (r, loc.byte_offset))
    }

    /// Drop every retained record. Returns how many were released.
    pub fn clear(&mut self) -> usize {
        let released = self.slots.iter_mut().filter_map(Option::take).count();
        self.in_offs = 0;
        self.out_offs = 0;
        self.full = false;
        released
    }
}

impl std::fmt::Debug for EntryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStore")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("in_offs", &self.in_offs)
            .field("out_offs", &self.out_offs)
            .field("full", &self.full)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(store: &EntryStore) -> Vec<&[u8]> {
        store.iter().map(Record::as_bytes).collect()
    }

    #[test]
    fn zero_capacity_rejected() {
        assert_eq!(EntryStore::new(0).unwrap_err(), StoreError::ZeroCapacity);
    }

    #[test]
    fn empty_store_finds_nothing() {
        let store = EntryStore::new(4).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.total_len(), 0);
        for offset in [0, 1, 100] {
            assert!(store.find(offset).is_none());
        }
    }

    #[test]
    fn add_below_capacity_evicts_nothing() {
        let mut store = EntryStore::new(3).unwrap();
        assert!(store.add(Record::from("a\n")).is_none());
        assert!(store.add(Record::from("b\n")).is_none());
        assert_eq!(store.len(), 2);
        assert!(!store.is_full());
        assert_eq!(contents(&store), vec![&b"a\n"[..], b"b\n"]);
    }

    #[test]
    fn overwrite_oldest_on_full_store() {
        let mut store = EntryStore::new(3).unwrap();
        for r in ["aaa\n", "bb\n", "c\n"] {
            assert!(store.add(Record::from(r)).is_none());
        }
        assert!(store.is_full());

        let evicted = store.add(Record::from("ddd\n"));
        assert_eq!(evicted, Some(Record::from("aaa\n")));
        assert_eq!(store.len(), 3);
        assert_eq!(contents(&store), vec![&b"bb\n"[..], b"c\n", b"ddd\n"]);
    }

    #[test]
    fn never_exceeds_capacity_and_keeps_newest() {
        let cap = 4;
        let mut store = EntryStore::new(cap).unwrap();
        for i in 0..23usize {
            let evicted = store.add(Record::from(format!("{i}\n").into_bytes()));
            assert!(store.len() <= cap);
            if i >= cap {
                let expected = format!("{}\n", i - cap);
                assert_eq!(evicted.unwrap().as_bytes(), expected.as_bytes());
            }
        }
        // 23 commits, capacity 4: oldest retained is commit #19.
        let (first, intra) = store.find(0).unwrap();
        assert_eq!(first.as_bytes(), b"19\n");
        assert_eq!(intra, 0);
    }

    #[test]
    fn find_walks_records_in_retention_order() {
        let mut store = EntryStore::new(3).unwrap();
        for r in ["aaa\n", "bb\n", "c\n", "ddd\n"] {
            store.add(Record::from(r));
        }
        // "bb\nc\nddd\n"
        let (rec, intra) = store.find(0).unwrap();
        assert_eq!((rec.as_bytes(), intra), (&b"bb\n"[..], 0));
        let (rec, intra) = store.find(4).unwrap();
        assert_eq!((rec.as_bytes(), intra), (&b"c\n"[..], 1));
        let (rec, intra) = store.find(8).unwrap();
        assert_eq!((rec.as_bytes(), intra), (&b"ddd\n"[..], 3));
        assert!(store.find(9).is_none());
        assert!(store.find(usize::MAX).is_none());
    }

    #[test]
    fn zero_length_records_are_retained_but_never_found() {
        let mut store = EntryStore::new(3).unwrap();
        store.add(Record::from("x"));
        store.add(Record::default());
        store.add(Record::from("y"));
        assert_eq!(store.len(), 3);
        assert_eq!(store.locate(1), Some(Location { record_index: 2, byte_offset: 0 }));
    }

    #[test]
    fn clear_releases_everything() {
        let mut store = EntryStore::new(2).unwrap();
        for r in ["a", "b", "c"] {
            store.add(Record::from(r));
        }
        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
        assert!(store.add(Record::from("z")).is_none());
        assert_eq!(contents(&store), vec![&b"z"[..]]);
    }
}
