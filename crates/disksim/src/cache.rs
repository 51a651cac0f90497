//! Buffer cache with a two-segment LRU replacement policy.

use std::collections::{BTreeMap, HashMap};

use disksim_core::{log_debug, log_info, Id, SimulationContext};

use crate::events::{CacheHit, CacheMiss};
use crate::request::OpKind;

/// Segment a cached block currently belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Blocks referenced exactly once since insertion.
    Cold,
    /// Blocks referenced more than once.
    Hot,
}

struct Block {
    stamp: u64,
    segment: Segment,
    dirty: bool,
}

/// Buffer cache mapping sector addresses to cached blocks.
///
/// The cache is split into a cold segment holding blocks referenced once and a
/// hot segment holding re-referenced blocks, so that a burst of one-shot
/// accesses cannot flush out frequently used blocks. New blocks always enter
/// the cold segment; a repeat reference promotes a cold block to the hot
/// segment. Eviction takes the least recently used cold block first and falls
/// back to the hot segment only when the cold segment is empty. The hot
/// segment is bounded: promoting into a full hot segment demotes its least
/// recently used block back to the cold segment.
///
/// Dirty blocks are evicted without a flush: in this model writes always
/// succeed immediately, which is a deliberate simplification.
pub struct BufferCache {
    capacity: usize,
    hot_capacity: usize,
    blocks: HashMap<u64, Block>,
    // recency stamp -> sector; first entry is the LRU of the segment
    cold: BTreeMap<u64, u64>,
    hot: BTreeMap<u64, u64>,
    next_stamp: u64,
    stats: Id,
    ctx: SimulationContext,
}

impl BufferCache {
    /// Creates a cache with `capacity` buffers total, of which at most
    /// `hot_capacity` may sit in the hot segment.
    ///
    /// Inputs are pre-validated by the configuration layer:
    /// `capacity > 0`, `hot_capacity < capacity`.
    pub fn new(capacity: usize, hot_capacity: usize, stats: Id, ctx: SimulationContext) -> Self {
        Self {
            capacity,
            hot_capacity,
            blocks: HashMap::new(),
            cold: BTreeMap::new(),
            hot: BTreeMap::new(),
            next_stamp: 0,
            stats,
            ctx,
        }
    }

    fn stamp(&mut self) -> u64 {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        stamp
    }

    /// Looks up a sector on behalf of process `pid` and returns whether it was
    /// a hit. A cold block is promoted to the hot segment, a hot block is
    /// refreshed as most recently used. A write marks the block dirty.
    ///
    /// Every lookup emits a [`CacheHit`] or [`CacheMiss`] observation event.
    pub fn lookup(&mut self, sector: u64, pid: u32, op: OpKind) -> bool {
        if self.blocks.contains_key(&sector) {
            log_info!(self.ctx, "HIT sector {}", sector);
            self.ctx.emit_now(CacheHit { pid, sector }, self.stats);
            self.touch(sector, op == OpKind::Write);
            true
        } else {
            log_info!(self.ctx, "MISS sector {}", sector);
            self.ctx.emit_now(CacheMiss { pid, sector }, self.stats);
            false
        }
    }

    fn touch(&mut self, sector: u64, mark_dirty: bool) {
        let new_stamp = self.stamp();
        let block = self.blocks.get_mut(&sector).unwrap();
        if mark_dirty {
            block.dirty = true;
        }
        match block.segment {
            Segment::Hot => {
                let old = block.stamp;
                block.stamp = new_stamp;
                self.hot.remove(&old);
                self.hot.insert(new_stamp, sector);
            }
            Segment::Cold => {
                let old = block.stamp;
                block.segment = Segment::Hot;
                block.stamp = new_stamp;
                self.cold.remove(&old);
                self.hot.insert(new_stamp, sector);
                log_debug!(self.ctx, "promoted sector {} to hot segment", sector);
                if self.hot.len() > self.hot_capacity {
                    self.demote_hot_lru();
                }
            }
        }
    }

    // Moves the LRU hot block back to the cold segment as its MRU entry.
    fn demote_hot_lru(&mut self) {
        let (&stamp, &moved) = self.hot.iter().next().unwrap();
        self.hot.remove(&stamp);
        let new_stamp = self.stamp();
        self.cold.insert(new_stamp, moved);
        let block = self.blocks.get_mut(&moved).unwrap();
        block.segment = Segment::Cold;
        block.stamp = new_stamp;
        log_debug!(self.ctx, "moved sector {} from hot to cold segment", moved);
    }

    /// Inserts a block for a sector whose miss was just resolved by the disk.
    /// The block enters the cold segment as most recently used; when the cache
    /// is full, the cold LRU block is evicted first, the hot LRU block only if
    /// the cold segment is empty.
    ///
    /// If the sector was already inserted while this request waited in the
    /// disk queue (two processes missing on the same sector), the existing
    /// block is kept and only its dirty flag is updated.
    pub fn insert(&mut self, sector: u64, dirty: bool) {
        if let Some(block) = self.blocks.get_mut(&sector) {
            block.dirty |= dirty;
            return;
        }
        if self.blocks.len() == self.capacity {
            self.evict();
        }
        let stamp = self.stamp();
        self.cold.insert(stamp, sector);
        self.blocks.insert(
            sector,
            Block {
                stamp,
                segment: Segment::Cold,
                dirty,
            },
        );
        log_debug!(self.ctx, "added sector {} to cold segment", sector);
    }

    fn evict(&mut self) {
        let (stamp, victim, segment) = if let Some((&stamp, &sector)) = self.cold.iter().next() {
            (stamp, sector, Segment::Cold)
        } else {
            let (&stamp, &sector) = self.hot.iter().next().expect("eviction from an empty cache");
            (stamp, sector, Segment::Hot)
        };
        match segment {
            Segment::Cold => {
                self.cold.remove(&stamp);
                log_info!(self.ctx, "evicted sector {} from cold segment", victim);
            }
            Segment::Hot => {
                self.hot.remove(&stamp);
                log_info!(self.ctx, "evicted sector {} from hot segment", victim);
            }
        }
        // dirty blocks are dropped without a flush, see the type-level note
        self.blocks.remove(&victim);
    }

    /// Returns whether the sector is currently cached.
    pub fn contains(&self, sector: u64) -> bool {
        self.blocks.contains_key(&sector)
    }

    /// Returns the segment of a cached sector, if present.
    pub fn segment_of(&self, sector: u64) -> Option<Segment> {
        self.blocks.get(&sector).map(|b| b.segment)
    }

    /// Returns whether a cached sector is marked dirty.
    pub fn is_dirty(&self, sector: u64) -> bool {
        self.blocks.get(&sector).map_or(false, |b| b.dirty)
    }

    /// Number of blocks currently cached.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns whether the cache holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of blocks in the cold segment.
    pub fn cold_len(&self) -> usize {
        self.cold.len()
    }

    /// Number of blocks in the hot segment.
    pub fn hot_len(&self) -> usize {
        self.hot.len()
    }
}
