// crates/alnpack-core/src/rank.rs

//! Second-stage symbol ranking: MTF-1 or weighted frequency count.
//!
//! Both variants maintain a permutation of the 128-byte alphabet, reset to
//! a fixed gap-first ordering at the start of every column, and map each
//! symbol to its current list position (forward) or back (reverse).
//! Several workers run in parallel; each consumes whole columns and emits
//! at the same priority, so the downstream queue restores order.

use crate::queue::OrderedQueue;
use crate::types::{Column, Variant};
use anyhow::{ensure, Result};

const ALPHABET: usize = 128;

/// The fixed initial list: gaps first, then letters, `*`, and whatever is
/// left of the 7-bit range in ascending order.
fn legal_symbols() -> Vec<u8> {
    let mut v = Vec::with_capacity(ALPHABET);
    v.push(b'-');
    v.push(b'.');
    v.extend(b'A'..=b'Z');
    v.extend(b'a'..=b'z');
    v.push(b'*');
    let mut present = [false; ALPHABET];
    for &c in &v {
        present[c as usize] = true;
    }
    for c in 0..ALPHABET as u8 {
        if !present[c as usize] {
            v.push(c);
        }
    }
    v
}

/// Capability set of the second stage: reset per column, symbol→rank,
/// rank→symbol. The codec picks the implementation at construction.
pub trait SymbolRanker: Send {
    /// Restore the initial list ordering before a new column.
    fn reset(&mut self, column_height: usize);
    /// Current rank of `symbol`, updating the list.
    fn rank_of(&mut self, symbol: u8) -> u8;
    /// Symbol at `rank`, updating the list.
    fn symbol_at(&mut self, rank: u8) -> u8;
}

impl Variant {
    /// Build one ranker instance of this variant.
    #[must_use]
    pub fn ranker(self) -> Box<dyn SymbolRanker> {
        match self {
            Self::Mtf => Box::new(Mtf1::new()),
            Self::Wfc => Box::new(Wfc::new()),
        }
    }
}

/* ------------------------------- MTF-1 -------------------------------- */

/// Move-to-front, `-1` variant: a symbol re-seen at position 1 moves to the
/// front; any other recurrence moves to position 1 first.
pub struct Mtf1 {
    list: [u8; ALPHABET],
    pos: [u8; ALPHABET],
    init_list: [u8; ALPHABET],
    init_pos: [u8; ALPHABET],
}

impl Default for Mtf1 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mtf1 {
    /// Ranker over the standard alignment alphabet.
    #[must_use]
    pub fn new() -> Self {
        let mut list = [0u8; ALPHABET];
        let mut pos = [0u8; ALPHABET];
        for (i, &c) in legal_symbols().iter().enumerate() {
            list[i] = c;
            pos[c as usize] = i as u8;
        }
        Self {
            list,
            pos,
            init_list: list,
            init_pos: pos,
        }
    }

    fn promote(&mut self, from: usize) {
        if from == 0 {
            return;
        }
        let sym = self.list[from];
        if from == 1 {
            self.list[1] = self.list[0];
            self.list[0] = sym;
            self.pos[self.list[0] as usize] = 0;
            self.pos[self.list[1] as usize] = 1;
        } else {
            for i in (2..=from).rev() {
                self.list[i] = self.list[i - 1];
                self.pos[self.list[i] as usize] = i as u8;
            }
            self.list[1] = sym;
            self.pos[sym as usize] = 1;
        }
    }
}

impl SymbolRanker for Mtf1 {
    fn reset(&mut self, _column_height: usize) {
        self.list = self.init_list;
        self.pos = self.init_pos;
    }

    fn rank_of(&mut self, symbol: u8) -> u8 {
        let r = self.pos[symbol as usize];
        self.promote(r as usize);
        r
    }

    fn symbol_at(&mut self, rank: u8) -> u8 {
        let sym = self.list[rank as usize];
        self.promote(rank as usize);
        sym
    }
}

/* -------------------------------- WFC --------------------------------- */

/// History window of the weighted frequency count.
const WFC_WINDOW: usize = 16384;
/// Base divisor of the decay function `1 / (p·k·ramp(k))`.
const WFC_P: f64 = 4.0;
/// Ramp steps of the decay function: at each age the divisor gains a factor.
const WFC_RAMP: [(usize, f64); 9] = [
    (4, 1.4),
    (8, 1.1),
    (16, 1.1),
    (32, 1.1),
    (64, 1.1),
    (1024, 1.1),
    (2048, 1.1),
    (4096, 4.0),
    (16384, 4.0),
];

/// Discretise the decay into `(age boundary, weight delta)` pairs: the
/// divisor is floored to a power of two, and only the ages where that
/// power changes contribute an update, so one inserted symbol touches a
/// handful of list entries instead of the whole window.
fn decay_updates() -> Vec<(u32, i32)> {
    let floor_pow2 = |x: f64| -> i64 {
        let mut v = x as i64;
        while v & (v - 1) != 0 {
            v &= v - 1;
        }
        v
    };

    let divisor = |age: usize| -> f64 {
        let mut d = WFC_P * age as f64;
        for &(k, m) in &WFC_RAMP {
            if age >= k {
                d *= m;
            }
        }
        d
    };

    let max_div = floor_pow2(divisor(WFC_WINDOW));
    let mut updates = vec![(1u32, max_div as i32)];
    let mut prev_div = 1i64; // age 1 contributes weight 1, divisor 1
    for age in 2..=WFC_WINDOW {
        let cur_div = floor_pow2(divisor(age));
        if cur_div != prev_div {
            updates.push((age as u32, (max_div / cur_div - max_div / prev_div) as i32));
            prev_div = cur_div;
        }
    }
    let sum: i32 = updates.iter().map(|&(_, d)| d).sum();
    updates.push((WFC_WINDOW as u32 + 1, -sum));
    updates
}

/// Weighted-frequency-count ranking: symbols ordered by decayed
/// recent-use weight.
pub struct Wfc {
    entries: Vec<(u8, i32)>, // (symbol, weight), descending by weight
    pos: [u8; ALPHABET],
    init_entries: Vec<(u8, i32)>,
    init_pos: [u8; ALPHABET],
    history: Vec<u8>,
    history_pos: usize,
    history_size: usize,
    active_updates: usize,
    updates: Vec<(u32, i32)>,
}

impl Default for Wfc {
    fn default() -> Self {
        Self::new()
    }
}

impl Wfc {
    /// Ranker over the standard alignment alphabet.
    #[must_use]
    pub fn new() -> Self {
        let entries: Vec<(u8, i32)> = legal_symbols().into_iter().map(|c| (c, 0)).collect();
        let mut pos = [0u8; ALPHABET];
        for (i, &(c, _)) in entries.iter().enumerate() {
            pos[c as usize] = i as u8;
        }
        Self {
            init_entries: entries.clone(),
            init_pos: pos,
            entries,
            pos,
            history: Vec::new(),
            history_pos: 0,
            history_size: 0,
            active_updates: 0,
            updates: decay_updates(),
        }
    }

    /// Fold `symbol` into the history and rebalance the touched entries.
    fn insert(&mut self, symbol: u8) {
        self.history[self.history_pos] = symbol;
        self.history_pos += 1;
        if self.history_size < WFC_WINDOW {
            self.history_size += 1;
            if self.active_updates < self.updates.len()
                && self.history_size == self.updates[self.active_updates].0 as usize
            {
                self.active_updates += 1;
            }
        }

        // Coalesce consecutive boundary hits on the same symbol so each
        // distinct symbol is re-positioned once.
        let mut cur_sym = symbol;
        let mut cur_delta = self.updates[0].1;
        for i in 1..self.active_updates {
            let (age, delta) = self.updates[i];
            let aged_sym = self.history[self.history_pos - age as usize];
            if aged_sym == cur_sym {
                cur_delta += delta;
            } else {
                self.apply(cur_sym, cur_delta);
                cur_sym = aged_sym;
                cur_delta = delta;
            }
        }
        self.apply(cur_sym, cur_delta);
    }

    fn apply(&mut self, symbol: u8, delta: i32) {
        let p = self.pos[symbol as usize] as usize;
        self.entries[p].1 += delta;
        if delta < 0 {
            self.sink(p);
        } else {
            self.float(p);
        }
    }

    /// Bubble toward the front while the weight is at least the neighbour's.
    fn float(&mut self, from: usize) {
        let mut i = from;
        while i > 0 && self.entries[i].1 >= self.entries[i - 1].1 {
            self.entries.swap(i, i - 1);
            self.pos.swap(
                self.entries[i].0 as usize,
                self.entries[i - 1].0 as usize,
            );
            i -= 1;
        }
    }

    /// Bubble toward the back while strictly lighter than the neighbour.
    fn sink(&mut self, from: usize) {
        let mut i = from;
        while i + 1 < self.entries.len() && self.entries[i].1 < self.entries[i + 1].1 {
            self.entries.swap(i, i + 1);
            self.pos.swap(
                self.entries[i].0 as usize,
                self.entries[i + 1].0 as usize,
            );
            i += 1;
        }
    }
}

impl SymbolRanker for Wfc {
    fn reset(&mut self, column_height: usize) {
        self.history_pos = 0;
        self.history_size = 0;
        self.active_updates = 0;
        self.entries.clone_from(&self.init_entries);
        self.pos = self.init_pos;
        if self.history.len() < column_height {
            self.history.resize(column_height, 0);
        }
    }

    fn rank_of(&mut self, symbol: u8) -> u8 {
        let r = self.pos[symbol as usize];
        self.insert(symbol);
        r
    }

    fn symbol_at(&mut self, rank: u8) -> u8 {
        let sym = self.entries[rank as usize].0;
        self.insert(sym);
        sym
    }
}

/* --------------------------- stage workers ----------------------------- */

/// Direction a ranking worker runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RankDirection {
    /// Symbols → ranks (compression).
    Forward,
    /// Ranks → symbols (decompression).
    Reverse,
}

/// Queue worker mapping whole columns through `ranker`. Each worker of the
/// fan-out calls this once and owns its ranker; the output queue is
/// constructed with the worker count as its producer count.
pub fn run(
    direction: RankDirection,
    ranker: &mut dyn SymbolRanker,
    input: &OrderedQueue<Column>,
    output: &OrderedQueue<Column>,
) -> Result<()> {
    let res = run_inner(direction, ranker, input, output);
    output.mark_completed();
    res
}

fn run_inner(
    direction: RankDirection,
    ranker: &mut dyn SymbolRanker,
    input: &OrderedQueue<Column>,
    output: &OrderedQueue<Column>,
) -> Result<()> {
    while let Some((priority, col)) = input.pop() {
        ranker.reset(col.len());
        let mut dest = Vec::with_capacity(col.len());
        match direction {
            RankDirection::Forward => {
                for &c in &col {
                    ensure!(c < 128, "sequence byte {c:#04x} outside the 7-bit alphabet");
                    dest.push(ranker.rank_of(c));
                }
            }
            RankDirection::Reverse => {
                for &r in &col {
                    ensure!(r < 128, "rank byte {r:#04x} outside the list");
                    dest.push(ranker.symbol_at(r));
                }
            }
        }
        output.push(priority, dest);
    }
    Ok(())
}
