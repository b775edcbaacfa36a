use std::sync::OnceLock;

/// Compression result for one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Bytes read from the input file.
    pub input_len: u64,
    /// zlib stream for the file.
    pub data: Vec<u8>,
}

impl Slot {
    /// Length of the compressed payload, as written in the record header.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Fixed-length table of write-once slots, one per file index.
///
/// Workers publish into distinct indices without locking; the archiver takes
/// ownership of the whole table once every worker has been joined.
#[derive(Debug)]
pub struct SlotTable {
    slots: Vec<OnceLock<Slot>>,
}

impl SlotTable {
    pub fn new(len: usize) -> Self {
        Self { slots: (0..len).map(|_| OnceLock::new()).collect() }
    }

    /// Stores the result for `index`.
    ///
    /// Returns the slot back if the index is out of range or already filled.
    pub fn store(&self, index: usize, slot: Slot) -> Result<(), Slot> {
        match self.slots.get(index) {
            Some(cell) => cell.set(slot),
            None => Err(slot),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Consumes the table, yielding each slot in index order. Empty slots come out as `None`.
    pub fn into_slots(self) -> impl Iterator<Item = Option<Slot>> {
        self.slots.into_iter().map(OnceLock::into_inner)
    }
}
