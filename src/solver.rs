use crate::{
    priority_queue::{BoundedPriorityQueue, BoundedPriorityQueueError},
    pruning::PruningTables,
    puzzle::{PuzzleDef, PuzzleState},
    puzzle_state_history::PuzzleStateHistory,
    start, success, working,
};
use log::{Level, debug, info, log_enabled, trace};
use std::time::{Duration, Instant};
use thiserror::Error;

pub struct IdaStarSolver<'a, P: PuzzleState, T: PruningTables<P>> {
    puzzle_def: &'a PuzzleDef<P>,
    pruning_tables: &'a T,
    search_strategy: SearchStrategy,
    move_ordering: MoveOrdering,
    redundant_move_pruning: bool,
    time_limit: Option<Duration>,
}

/// A child of the node being expanded: its state, the move that reached it,
/// and its heuristic.
type Child<P> = (P, usize, u8);

struct IdaStarSolverMutable<P: PuzzleState> {
    puzzle_state_history: PuzzleStateHistory<P>,
    // One queue per depth, taken while that depth's node is expanded
    child_queues: Vec<BoundedPriorityQueue<Child<P>>>,
    solutions: Vec<Vec<usize>>,
    prune_redundant_moves: bool,
    deadline: Option<Instant>,
    nodes_visited: u64,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SolverError {
    #[error("Time limit exceeded")]
    TimeLimitExceeded,
    #[error("Could not order the children of a node: {0}")]
    MoveOrdering(#[from] BoundedPriorityQueueError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStrategy {
    FirstSolution,
    #[default]
    AllSolutions,
}

/// The order children are searched in. With `SearchStrategy::AllSolutions`
/// this only changes the order solutions are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveOrdering {
    /// Children with the smallest heuristic first, ties in move order.
    #[default]
    Heuristic,
    /// Children in move order.
    MoveIndex,
}

impl<P: PuzzleState> IdaStarSolverMutable<P> {
    fn found_solution(&self) -> bool {
        !self.solutions.is_empty()
    }

    fn check_deadline(&self) -> Result<(), SolverError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(SolverError::TimeLimitExceeded),
            _ => Ok(()),
        }
    }
}

impl<'a, P: PuzzleState, T: PruningTables<P>> IdaStarSolver<'a, P, T> {
    pub fn new(puzzle_def: &'a PuzzleDef<P>, pruning_tables: &'a T) -> Self {
        Self {
            puzzle_def,
            pruning_tables,
            search_strategy: SearchStrategy::default(),
            move_ordering: MoveOrdering::default(),
            redundant_move_pruning: true,
            time_limit: None,
        }
    }

    #[must_use]
    pub fn with_search_strategy(mut self, search_strategy: SearchStrategy) -> Self {
        self.search_strategy = search_strategy;
        self
    }

    #[must_use]
    pub fn with_move_ordering(mut self, move_ordering: MoveOrdering) -> Self {
        self.move_ordering = move_ordering;
        self
    }

    /// Skip children in the same move class as the previous move. Enabled by
    /// default. Such pairs combine into one move or cancel, so no shortest
    /// solution contains one. A search only prunes them when its window cannot
    /// hold a solution shorter than `min_depth`, which is when `min_depth` is at
    /// most the heuristic of the start.
    #[must_use]
    pub fn with_redundant_move_pruning(mut self, redundant_move_pruning: bool) -> Self {
        self.redundant_move_pruning = redundant_move_pruning;
        self
    }

    /// Fail a search once it has run for `time_limit`. The deadline is checked
    /// every time a node is visited.
    #[must_use]
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    /// Whether the child reached by `move_index` repeats the move class of the
    /// move before it.
    fn is_redundant(&self, last_move_index: Option<usize>, move_index: usize) -> bool {
        last_move_index.is_some_and(|last_move_index| {
            self.puzzle_def.moves[last_move_index].move_class_index
                == self.puzzle_def.moves[move_index].move_class_index
        })
    }

    /// Depth-first search below the last state of the history, bounded by
    /// `bound` moves from the root. Every solved state found at exactly
    /// `bound` moves is recorded.
    fn search_for_solution(
        &self,
        mutable: &mut IdaStarSolverMutable<P>,
        bound: usize,
    ) -> Result<(), SolverError> {
        mutable.check_deadline()?;
        if log_enabled!(Level::Debug) {
            mutable.nodes_visited += 1;
        }

        let depth = mutable.puzzle_state_history.depth();
        if depth == bound {
            if self
                .puzzle_def
                .is_solved(mutable.puzzle_state_history.last_state())
            {
                let solution = mutable.puzzle_state_history.create_move_history();
                trace!("Found solution {solution:?}");
                mutable.solutions.push(solution);
            }
            return Ok(());
        }

        match self.move_ordering {
            MoveOrdering::Heuristic => self.search_children_by_heuristic(mutable, bound),
            MoveOrdering::MoveIndex => self.search_children_by_move_index(mutable, bound),
        }
    }

    fn search_children_by_move_index(
        &self,
        mutable: &mut IdaStarSolverMutable<P>,
        bound: usize,
    ) -> Result<(), SolverError> {
        let depth = mutable.puzzle_state_history.depth();
        let last_move_index = mutable.puzzle_state_history.last_move_index();
        for move_index in 0..self.puzzle_def.moves.len() {
            if mutable.prune_redundant_moves && self.is_redundant(last_move_index, move_index) {
                continue;
            }
            mutable
                .puzzle_state_history
                .push_stack(move_index, self.puzzle_def);
            let admissible_heuristic = self
                .pruning_tables
                .admissible_heuristic(mutable.puzzle_state_history.last_state());
            if depth + 1 + usize::from(admissible_heuristic) <= bound {
                let result = self.search_for_solution(mutable, bound);
                if result.is_err()
                    || (self.search_strategy == SearchStrategy::FirstSolution
                        && mutable.found_solution())
                {
                    mutable.puzzle_state_history.pop_stack();
                    return result;
                }
            }
            mutable.puzzle_state_history.pop_stack();
        }
        Ok(())
    }

    fn search_children_by_heuristic(
        &self,
        mutable: &mut IdaStarSolverMutable<P>,
        bound: usize,
    ) -> Result<(), SolverError> {
        let depth = mutable.puzzle_state_history.depth();
        let last_move_index = mutable.puzzle_state_history.last_move_index();
        let mut children = std::mem::replace(
            &mut mutable.child_queues[depth],
            BoundedPriorityQueue::new(0),
        );
        children.clear();

        let last_state = mutable.puzzle_state_history.last_state();
        for (move_index, move_) in self.puzzle_def.moves.iter().enumerate() {
            if mutable.prune_redundant_moves && self.is_redundant(last_move_index, move_index) {
                continue;
            }
            let child = move_.apply(last_state, &self.puzzle_def.orbit_defs);
            let admissible_heuristic = self.pruning_tables.admissible_heuristic(&child);
            if depth + 1 + usize::from(admissible_heuristic) > bound {
                continue;
            }
            children.insert(
                (child, move_index, admissible_heuristic),
                u8::MAX - admissible_heuristic,
            )?;
        }

        let mut result = Ok(());
        while let Ok((child, move_index, _)) = children.pop() {
            mutable.puzzle_state_history.push_state(&child, move_index);
            result = self.search_for_solution(mutable, bound);
            mutable.puzzle_state_history.pop_stack();
            if result.is_err()
                || (self.search_strategy == SearchStrategy::FirstSolution
                    && mutable.found_solution())
            {
                break;
            }
        }
        mutable.child_queues[depth] = children;
        result
    }

    /// Find every shortest solution of `puzzle_state` whose length is within
    /// `min_depth..=max_depth`, or only the first one found with
    /// `SearchStrategy::FirstSolution`. Solutions are lists of move indices
    /// and are reported in the order they are found, which is deterministic.
    /// An empty list means there is no solution in the window.
    ///
    /// # Errors
    ///
    /// If a time limit is set and the search runs past it.
    pub fn search(
        &self,
        puzzle_state: &P,
        min_depth: usize,
        max_depth: usize,
    ) -> Result<Vec<Vec<usize>>, SolverError> {
        if min_depth > max_depth {
            return Ok(vec![]);
        }
        if min_depth == 0 && self.puzzle_def.is_solved(puzzle_state) {
            return Ok(vec![vec![]]);
        }

        info!(start!("Searching for optimal solutions of {}"), self.puzzle_def.name);
        let start = Instant::now();

        let root_heuristic = self.pruning_tables.admissible_heuristic(puzzle_state);
        let mut mutable = IdaStarSolverMutable {
            puzzle_state_history: PuzzleStateHistory::new(puzzle_state),
            child_queues: vec![],
            solutions: vec![],
            // Below the root heuristic there are no solutions at all, so every
            // solution found is a shortest one
            prune_redundant_moves: self.redundant_move_pruning
                && min_depth <= usize::from(root_heuristic),
            deadline: self
                .time_limit
                .and_then(|time_limit| start.checked_add(time_limit)),
            nodes_visited: 0,
        };

        // Smaller bounds would be pruned at the root
        let mut bound = min_depth.max(usize::from(root_heuristic));
        while bound <= max_depth {
            debug!(working!("Searching depth {}..."), bound);
            let depth_start = Instant::now();
            mutable.puzzle_state_history.resize_if_needed(bound);
            if mutable.child_queues.len() < bound {
                mutable.child_queues.resize_with(bound, || {
                    BoundedPriorityQueue::new(self.puzzle_def.moves.len())
                });
            }
            mutable.nodes_visited = 0;

            self.search_for_solution(&mut mutable, bound)?;
            debug!(
                working!("Traversed {} nodes in {:.3}s"),
                mutable.nodes_visited,
                depth_start.elapsed().as_secs_f64()
            );
            if mutable.found_solution() {
                info!(
                    success!("Found {} solutions in {:.3}s at depth {}"),
                    mutable.solutions.len(),
                    start.elapsed().as_secs_f64(),
                    bound
                );
                return Ok(mutable.solutions);
            }
            bound += 1;
        }

        info!(
            success!("No solutions of at most {} moves exist, searched in {:.3}s"),
            max_depth,
            start.elapsed().as_secs_f64()
        );
        Ok(vec![])
    }
}
