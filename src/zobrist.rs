//! Zobrist hashing and the search tree's position table.
//!
//! ## Keys
//! One random 64-bit key per (colour, point), one per ko point and one for
//! "White to move". A position's hash is the XOR of the keys that apply, so
//! placing and removing a stone are the same operation and undo is exact.
//! Two positions are considered equal when their hashes are equal; with 64
//! bits the collision risk is accepted.
//!
//! ## Node table
//! [`NodeHashTable`] maps (hash, colour to move, move number) to a node slot
//! index. Slots are claimed with a compare-and-swap on the entry state, so
//! exactly one worker creates the node for a given position.

use std::hint;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, AtomicU32, AtomicU64, AtomicUsize, Ordering};

use crate::board::{Color, Point};
use crate::constants::{BOARD_MAX, TREE_FILL_LIMIT};

/// Seed of the key generator, fixed so hashes are stable across runs.
const HASH_SEED: u64 = 0x2545_f491_4f6c_dd1d;

/// The Zobrist key set.
pub struct ZobristKeys {
    stone: [[u64; BOARD_MAX]; 2],
    ko: [u64; BOARD_MAX],
    side: u64,
}

static KEYS: OnceLock<Box<ZobristKeys>> = OnceLock::new();

/// The process-wide key set.
#[inline]
pub fn keys() -> &'static ZobristKeys {
    KEYS.get_or_init(make_keys)
}

fn make_keys() -> Box<ZobristKeys> {
    let mut rng = fastrand::Rng::with_seed(HASH_SEED);
    let mut keys = Box::new(ZobristKeys {
        stone: [[0; BOARD_MAX]; 2],
        ko: [0; BOARD_MAX],
        side: 0,
    });
    for table in keys.stone.iter_mut() {
        table.iter_mut().for_each(|k| *k = rng.u64(..));
    }
    keys.ko.iter_mut().for_each(|k| *k = rng.u64(..));
    keys.side = rng.u64(..);
    keys
}

impl ZobristKeys {
    #[inline]
    pub fn stone(&self, color: Color, pt: Point) -> u64 {
        self.stone[color.index()][pt]
    }

    #[inline]
    pub fn ko(&self, pt: Point) -> u64 {
        self.ko[pt]
    }

    /// Key XORed in while White is to move.
    #[inline]
    pub fn side(&self) -> u64 {
        self.side
    }
}

// =============================================================================
// Node hash table
// =============================================================================

const FREE: u8 = 0;
const WRITING: u8 = 1;
const TAKEN: u8 = 2;
/// Evicted slot. Lookups walk past it; claims may reuse it.
const DELETED: u8 = 3;

/// One slot of the node table.
#[derive(Default)]
struct HashEntry {
    hash: AtomicU64,
    color: AtomicU8,
    moves: AtomicU32,
    /// In-use flag: FREE, WRITING (key being published), TAKEN or DELETED.
    state: AtomicU8,
}

impl HashEntry {
    fn matches(&self, hash: u64, color: Color, moves: u32) -> bool {
        self.hash.load(Ordering::Relaxed) == hash
            && self.color.load(Ordering::Relaxed) == color.index() as u8
            && self.moves.load(Ordering::Relaxed) == moves
    }
}

/// Outcome of [`NodeHashTable::find_or_claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// A node for this position already has (or is getting) this slot.
    Found(usize),
    /// The caller owns this fresh slot and must create the node.
    Claimed(usize),
    /// No slot is available.
    Full,
}

/// Open-addressing table from positions to node slots.
pub struct NodeHashTable {
    entries: Box<[HashEntry]>,
    mask: usize,
    used: AtomicUsize,
}

impl NodeHashTable {
    /// Create a table with at least `capacity` slots (rounded up to a power of two).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2).next_power_of_two();
        let entries = (0..capacity).map(|_| HashEntry::default()).collect();
        Self {
            entries,
            mask: capacity - 1,
            used: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn used(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }

    /// Whether new nodes may still be created.
    pub fn has_room(&self) -> bool {
        (self.used() as f64) < self.capacity() as f64 * TREE_FILL_LIMIT
    }

    /// Find the slot of a published position.
    pub fn find(&self, hash: u64, color: Color, moves: u32) -> Option<usize> {
        let start = hash as usize & self.mask;
        for i in 0..self.entries.len() {
            let idx = (start + i) & self.mask;
            let entry = &self.entries[idx];
            match entry.state.load(Ordering::Acquire) {
                FREE => return None,
                TAKEN if entry.matches(hash, color, moves) => return Some(idx),
                _ => {}
            }
        }
        None
    }

    /// Find the slot for a position, claiming a vacant one if it is not present.
    ///
    /// The whole chain up to the first free slot is scanned before claiming,
    /// so a position stored behind a deleted slot is found rather than
    /// duplicated. The first vacant slot of the chain is the one claimed.
    pub fn find_or_claim(&self, hash: u64, color: Color, moves: u32) -> Lookup {
        let start = hash as usize & self.mask;
        loop {
            let mut vacant = None;
            for i in 0..self.entries.len() {
                let idx = (start + i) & self.mask;
                let entry = &self.entries[idx];
                let state = loop {
                    match entry.state.load(Ordering::Acquire) {
                        WRITING => hint::spin_loop(),
                        state => break state,
                    }
                };
                match state {
                    TAKEN => {
                        if entry.matches(hash, color, moves) {
                            return Lookup::Found(idx);
                        }
                    }
                    DELETED => {
                        if vacant.is_none() {
                            vacant = Some(idx);
                        }
                    }
                    _ => {
                        if vacant.is_none() {
                            vacant = Some(idx);
                        }
                        break;
                    }
                }
            }

            let Some(idx) = vacant else {
                return Lookup::Full;
            };
            let entry = &self.entries[idx];
            let state = entry.state.load(Ordering::Acquire);
            if (state == FREE || state == DELETED)
                && entry
                    .state
                    .compare_exchange(state, WRITING, Ordering::Acquire, Ordering::Relaxed)
                    .is_ok()
            {
                entry.hash.store(hash, Ordering::Relaxed);
                entry.color.store(color.index() as u8, Ordering::Relaxed);
                entry.moves.store(moves, Ordering::Relaxed);
                entry.state.store(TAKEN, Ordering::Release);
                self.used.fetch_add(1, Ordering::Relaxed);
                return Lookup::Claimed(idx);
            }
            // Another worker took the slot first, possibly for this position.
        }
    }

    /// Evict every position recorded before move number `moves`.
    ///
    /// `evict` is called with each freed slot index. Returns the number of
    /// evicted entries. Evicted slots stay in their chains as deleted
    /// markers, except where nothing lies behind them.
    pub fn delete_old(&mut self, moves: u32, mut evict: impl FnMut(usize)) -> usize {
        let mut count = 0;
        for (idx, entry) in self.entries.iter_mut().enumerate() {
            if *entry.state.get_mut() == TAKEN && *entry.moves.get_mut() < moves {
                *entry.state.get_mut() = DELETED;
                evict(idx);
                count += 1;
            }
        }
        *self.used.get_mut() -= count;
        self.free_chain_tails();
        count
    }

    /// Turn deleted slots directly in front of a free slot back into free ones.
    ///
    /// Every lookup that reaches such a slot would stop at the free slot next.
    fn free_chain_tails(&mut self) {
        let len = self.entries.len();
        for start in 0..len {
            if *self.entries[start].state.get_mut() != FREE {
                continue;
            }
            let mut idx = (start + len - 1) & self.mask;
            while idx != start && *self.entries[idx].state.get_mut() == DELETED {
                *self.entries[idx].state.get_mut() = FREE;
                idx = (idx + len - 1) & self.mask;
            }
        }
    }

    /// Free every slot.
    pub fn clear(&mut self, mut evict: impl FnMut(usize)) {
        for (idx, entry) in self.entries.iter_mut().enumerate() {
            if *entry.state.get_mut() == TAKEN {
                evict(idx);
            }
            *entry.state.get_mut() = FREE;
        }
        *self.used.get_mut() = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_keys_are_distinct_and_stable() {
        let k = keys();
        assert_ne!(k.stone(Color::Black, 30), k.stone(Color::White, 30));
        assert_ne!(k.stone(Color::Black, 30), k.stone(Color::Black, 31));
        assert_ne!(k.side(), 0);
        assert_eq!(make_keys().side(), k.side());
    }

    #[test]
    fn test_claim_then_find() {
        let table = NodeHashTable::new(8);
        let idx = match table.find_or_claim(42, Color::Black, 3) {
            Lookup::Claimed(i) => i,
            other => panic!("expected a claim, got {other:?}"),
        };
        assert_eq!(table.find_or_claim(42, Color::Black, 3), Lookup::Found(idx));
        assert_eq!(table.find(42, Color::Black, 3), Some(idx));
        assert_eq!(table.find(42, Color::White, 3), None);
        assert_eq!(table.used(), 1);
    }

    #[test]
    fn test_table_full() {
        let table = NodeHashTable::new(2);
        assert!(matches!(table.find_or_claim(1, Color::Black, 0), Lookup::Claimed(_)));
        assert!(matches!(table.find_or_claim(2, Color::Black, 0), Lookup::Claimed(_)));
        assert_eq!(table.find_or_claim(3, Color::Black, 0), Lookup::Full);
        assert!(!table.has_room());
    }

    #[test]
    fn test_delete_old() {
        let mut table = NodeHashTable::new(16);
        table.find_or_claim(1, Color::Black, 0);
        table.find_or_claim(2, Color::White, 1);
        table.find_or_claim(3, Color::Black, 2);
        let mut evicted = Vec::new();
        assert_eq!(table.delete_old(2, |i| evicted.push(i)), 2);
        assert_eq!(evicted.len(), 2);
        assert_eq!(table.used(), 1);
        assert!(table.find(3, Color::Black, 2).is_some());
        assert!(table.find(1, Color::Black, 0).is_none());
    }

    #[test]
    fn test_colliding_entry_survives_eviction_of_its_predecessor() {
        // 1 and 9 share their first slot in an 8-slot table.
        let mut table = NodeHashTable::new(8);
        assert_eq!(table.find_or_claim(1, Color::Black, 0), Lookup::Claimed(1));
        assert_eq!(table.find_or_claim(9, Color::White, 5), Lookup::Claimed(2));
        assert_eq!(table.delete_old(1, |_| {}), 1);
        assert_eq!(table.entries[1].state.load(Ordering::Relaxed), DELETED);

        assert_eq!(table.find(9, Color::White, 5), Some(2));
        assert_eq!(table.find_or_claim(9, Color::White, 5), Lookup::Found(2));
        assert_eq!(table.used(), 1);

        // A new colliding position reuses the deleted slot.
        assert_eq!(table.find_or_claim(17, Color::Black, 6), Lookup::Claimed(1));
        assert_eq!(table.find(9, Color::White, 5), Some(2));
        assert_eq!(table.used(), 2);
    }

    #[test]
    fn test_deleted_slots_at_chain_end_become_free() {
        let mut table = NodeHashTable::new(8);
        table.find_or_claim(1, Color::Black, 0);
        table.find_or_claim(9, Color::White, 1);
        table.find_or_claim(4, Color::Black, 3);
        assert_eq!(table.delete_old(2, |_| {}), 2);
        for idx in [1, 2] {
            assert_eq!(table.entries[idx].state.load(Ordering::Relaxed), FREE);
        }
        assert_eq!(table.find(4, Color::Black, 3), Some(4));
        assert_eq!(table.used(), 1);
    }

    #[test]
    fn test_concurrent_claim_has_single_winner() {
        let table = Arc::new(NodeHashTable::new(64));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let table = Arc::clone(&table);
                thread::spawn(move || table.find_or_claim(0xabcd, Color::White, 7))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let claims = results.iter().filter(|r| matches!(r, Lookup::Claimed(_))).count();
        assert_eq!(claims, 1);
        assert_eq!(table.used(), 1);
    }
}
