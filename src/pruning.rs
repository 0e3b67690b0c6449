//! Pattern databases used as admissible heuristics by the solver.

use crate::{
    FACT_UNTIL_19,
    puzzle::{
        OrbitDef, PuzzleDef, PuzzleState,
        slice_puzzle::{exact_hasher_orbit_bytes, orientation_rank, permutation_rank},
    },
    start, success, working,
};
use log::{debug, info};
use std::time::Instant;
use thiserror::Error;

/// Marks a slot that no visited state has ranked to.
const UNKNOWN: u8 = 0xFF;

/// A deterministic mapping from a puzzle state, or a projection of it, to a
/// dense table index.
pub trait Ranker<P> {
    fn rank(&self, puzzle_state: &P) -> usize;
}

impl<P, F: Fn(&P) -> usize> Ranker<P> for F {
    fn rank(&self, puzzle_state: &P) -> usize {
        self(puzzle_state)
    }
}

/// Admissible heuristics the solver can be driven by.
pub trait PruningTables<P> {
    /// A lower bound on the number of moves needed to solve `puzzle_state`.
    fn admissible_heuristic(&self, puzzle_state: &P) -> u8;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PruningTableError {
    #[error("Pruning tables must have at least one slot")]
    ZeroTableSize,
    #[error("Max depth {0} collides with the unknown slot sentinel, it must be at most 253")]
    MaxDepthTooLarge(u8),
    #[error("Orbit index {orbit_index} is out of range for a puzzle with {orbit_count} orbits")]
    OrbitIndexOutOfRange {
        orbit_index: usize,
        orbit_count: usize,
    },
    #[error("The coordinate of an orbit with {0} pieces has too many values to index")]
    CoordinateTooLarge(u8),
}

/// Which part of an orbit an `OrbitRanker` looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitCoordinate {
    Permutation,
    Orientation,
    Exact,
}

/// Ranks a single orbit of a puzzle. Ranking a projection gives a smaller
/// table with a looser bound.
#[derive(Debug, Clone)]
pub struct OrbitRanker {
    orbit_index: usize,
    orbit_defs: Box<[OrbitDef]>,
    coordinate: OrbitCoordinate,
    table_size: usize,
}

impl OrbitRanker {
    /// # Errors
    ///
    /// If `orbit_index` does not name an orbit of `puzzle_def`, or if the
    /// coordinate's range does not fit in a `usize`.
    pub fn new<P: PuzzleState>(
        puzzle_def: &PuzzleDef<P>,
        orbit_index: usize,
        coordinate: OrbitCoordinate,
    ) -> Result<Self, PruningTableError> {
        let orbit_def = *puzzle_def.orbit_defs.get(orbit_index).ok_or(
            PruningTableError::OrbitIndexOutOfRange {
                orbit_index,
                orbit_count: puzzle_def.orbit_defs.len(),
            },
        )?;
        let piece_count = orbit_def.piece_count.get();
        let too_large = PruningTableError::CoordinateTooLarge(piece_count);

        let permutation_count = FACT_UNTIL_19
            .get(usize::from(piece_count))
            .copied()
            .ok_or(too_large.clone())?;
        let orientation_count = u64::from(orbit_def.orientation_count.get())
            .checked_pow(u32::from(piece_count) - 1)
            .ok_or(too_large.clone())?;
        let table_size = match coordinate {
            OrbitCoordinate::Permutation => Some(permutation_count),
            OrbitCoordinate::Orientation => Some(orientation_count),
            OrbitCoordinate::Exact => permutation_count.checked_mul(orientation_count),
        }
        .and_then(|table_size| usize::try_from(table_size).ok())
        .ok_or(too_large)?;

        Ok(Self {
            orbit_index,
            orbit_defs: puzzle_def.orbit_defs.clone(),
            coordinate,
            table_size,
        })
    }

    /// The number of distinct ranks of this coordinate.
    #[must_use]
    pub fn table_size(&self) -> usize {
        self.table_size
    }

    #[must_use]
    pub fn coordinate(&self) -> OrbitCoordinate {
        self.coordinate
    }
}

impl<P: PuzzleState> Ranker<P> for OrbitRanker {
    fn rank(&self, puzzle_state: &P) -> usize {
        let (perm, ori) = puzzle_state.orbit_bytes(self.orbit_index, &self.orbit_defs);
        let orbit_def = self.orbit_defs[self.orbit_index];
        let rank = match self.coordinate {
            OrbitCoordinate::Permutation => permutation_rank(perm),
            OrbitCoordinate::Orientation => {
                orientation_rank(ori, orbit_def.orientation_count.get())
            }
            OrbitCoordinate::Exact => exact_hasher_orbit_bytes(perm, ori, orbit_def),
        };
        // Unrepresentable ranks are out of range of every table
        usize::try_from(rank).unwrap_or(usize::MAX)
    }
}

/// A pattern database built by breadth-first search. Each slot holds the
/// depth at which a state of that rank was first reached.
#[derive(Debug, Clone)]
pub struct PruningTable<R> {
    table: Box<[u8]>,
    max_depth: u8,
    assigned_count: usize,
    ranker: R,
}

impl<R> PruningTable<R> {
    /// Explore every state within `max_depth` moves of `root` and record the
    /// first depth each rank is reached at. Slots are never overwritten, and
    /// a state whose slot is already set is not expanded again. States that
    /// rank outside of `0..table_size` are neither recorded nor expanded.
    ///
    /// # Errors
    ///
    /// If `table_size` is zero or `max_depth` leaves no room for the unknown
    /// sentinel. See `PruningTableError`.
    pub fn generate<P: PuzzleState>(
        puzzle_def: &PuzzleDef<P>,
        root: &P,
        max_depth: u8,
        table_size: usize,
        ranker: R,
    ) -> Result<Self, PruningTableError>
    where
        R: Ranker<P>,
    {
        if table_size == 0 {
            return Err(PruningTableError::ZeroTableSize);
        }
        if max_depth >= UNKNOWN - 1 {
            return Err(PruningTableError::MaxDepthTooLarge(max_depth));
        }

        info!(
            start!("Generating {} pruning table with {} slots to depth {}"),
            puzzle_def.name, table_size, max_depth
        );
        let start = Instant::now();

        let mut table = vec![UNKNOWN; table_size].into_boxed_slice();
        let mut assigned_count = 0;
        let mut frontier = vec![];
        if let Some(slot) = table.get_mut(ranker.rank(root)) {
            *slot = 0;
            assigned_count += 1;
            frontier.push(root.clone());
        }

        for depth in 1..=max_depth {
            if frontier.is_empty() || assigned_count == table_size {
                break;
            }
            let depth_start = Instant::now();
            let mut next_frontier = vec![];
            for puzzle_state in &frontier {
                for move_ in puzzle_def.moves.iter() {
                    let child = move_.apply(puzzle_state, &puzzle_def.orbit_defs);
                    if let Some(slot) = table.get_mut(ranker.rank(&child))
                        && *slot == UNKNOWN
                    {
                        *slot = depth;
                        assigned_count += 1;
                        next_frontier.push(child);
                    }
                }
            }
            debug!(
                working!("Assigned {} slots at depth {} in {:.3}s"),
                next_frontier.len(),
                depth,
                depth_start.elapsed().as_secs_f64()
            );
            frontier = next_frontier;
        }

        info!(
            success!("Pruning table generated with {} of {} slots assigned in {:.3}s"),
            assigned_count,
            table_size,
            start.elapsed().as_secs_f64()
        );
        Ok(Self {
            table,
            max_depth,
            assigned_count,
            ranker,
        })
    }

    /// The recorded depth of the slot `puzzle_state` ranks to, or
    /// `max_depth + 1` if that slot was never reached.
    pub fn lookup<P>(&self, puzzle_state: &P) -> u8
    where
        R: Ranker<P>,
    {
        match self.table.get(self.ranker.rank(puzzle_state)) {
            Some(&depth) if depth != UNKNOWN => depth,
            _ => self.max_depth + 1,
        }
    }

    /// The number of slots, assigned or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    #[must_use]
    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.assigned_count
    }

    /// How many slots were assigned at each depth, indexed by depth.
    #[must_use]
    pub fn depth_histogram(&self) -> Vec<usize> {
        let mut histogram = vec![0; usize::from(self.max_depth) + 1];
        for &depth in self.table.iter() {
            if depth != UNKNOWN {
                histogram[usize::from(depth)] += 1;
            }
        }
        histogram
    }
}

impl<P, R: Ranker<P>> PruningTables<P> for PruningTable<R> {
    fn admissible_heuristic(&self, puzzle_state: &P) -> u8 {
        self.lookup(puzzle_state)
    }
}

/// No information at all, which turns IDA* into plain iterative deepening.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroTable;

impl<P> PruningTables<P> for ZeroTable {
    fn admissible_heuristic(&self, _puzzle_state: &P) -> u8 {
        0
    }
}

/// The maximum of two admissible heuristics is admissible.
impl<P, A: PruningTables<P>, B: PruningTables<P>> PruningTables<P> for (A, B) {
    fn admissible_heuristic(&self, puzzle_state: &P) -> u8 {
        self.0
            .admissible_heuristic(puzzle_state)
            .max(self.1.admissible_heuristic(puzzle_state))
    }
}
