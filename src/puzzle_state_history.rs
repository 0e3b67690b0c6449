use crate::puzzle::{PuzzleDef, PuzzleState};

/// The path from the search root to the node being explored, one entry per
/// depth. Entry zero is the root and its move index is meaningless. Buffers
/// are reused across pushes so backtracking never reallocates.
pub struct PuzzleStateHistory<P: PuzzleState> {
    stack: Vec<(P, usize)>,
    stack_pointer: usize,
}

impl<P: PuzzleState> PuzzleStateHistory<P> {
    pub fn new(root: &P) -> Self {
        Self {
            stack: vec![(root.clone(), 0)],
            stack_pointer: 0,
        }
    }

    /// Push a new state onto the stack by composing the given move with the
    /// last state in the stack.
    pub fn push_stack(&mut self, move_index: usize, puzzle_def: &PuzzleDef<P>) {
        self.resize_if_needed(self.stack_pointer + 1);
        let (left, right) = self.stack.split_at_mut(self.stack_pointer + 1);
        let next_entry = &mut right[0];
        next_entry.0.replace_compose(
            &left[self.stack_pointer].0,
            &puzzle_def.moves[move_index].puzzle_state,
            &puzzle_def.orbit_defs,
        );
        next_entry.1 = move_index;
        self.stack_pointer += 1;
    }

    /// Push an already computed state reached by `move_index`.
    pub fn push_state(&mut self, puzzle_state: &P, move_index: usize) {
        self.resize_if_needed(self.stack_pointer + 1);
        let next_entry = &mut self.stack[self.stack_pointer + 1];
        next_entry.0.clone_from(puzzle_state);
        next_entry.1 = move_index;
        self.stack_pointer += 1;
    }

    /// Pop the last state from the stack. The root is never popped.
    pub fn pop_stack(&mut self) {
        debug_assert!(self.stack_pointer > 0);
        self.stack_pointer = self.stack_pointer.saturating_sub(1);
    }

    /// Grow the buffer so that `max_stack_pointer` is a valid entry.
    pub fn resize_if_needed(&mut self, max_stack_pointer: usize) {
        if self.stack.len() <= max_stack_pointer {
            let filler = (self.stack[0].0.clone(), usize::MAX);
            self.stack.resize(max_stack_pointer + 1, filler);
        }
    }

    pub fn last_state(&self) -> &P {
        &self.stack[self.stack_pointer].0
    }

    /// The move that led to the last state, if any.
    pub fn last_move_index(&self) -> Option<usize> {
        (self.stack_pointer > 0).then(|| self.stack[self.stack_pointer].1)
    }

    /// The number of moves between the root and the last state.
    pub fn depth(&self) -> usize {
        self.stack_pointer
    }

    /// Create a new move history from the current state of the stack.
    pub fn create_move_history(&self) -> Vec<usize> {
        (1..=self.stack_pointer).map(|i| self.stack[i].1).collect()
    }
}
