use crate::ksolve::KSolve;
use itertools::Itertools;
use std::{fmt::Debug, num::NonZeroU8};
use thiserror::Error;

pub mod slice_puzzle;

use slice_puzzle::StackPuzzle;

/// A 2x2x2 cube state: one orbit of 8 corners.
pub type Cube2 = StackPuzzle<16>;

/// A 3x3x3 cube state: 8 corners followed by 12 edges.
pub type Cube3 = StackPuzzle<40>;

/// The puzzle state interface at the heart of the solver. States are values:
/// every operation writes into `self` from its arguments and never mutates
/// them, so a state can be shared by every branch of a search that reaches it.
pub trait PuzzleState: Clone + PartialEq + Debug {
    /// Create a puzzle state from validated transformations.
    ///
    /// # Errors
    ///
    /// If the implementor cannot represent the orbits described by
    /// `transformations_meta`.
    fn try_from_transformations_meta(
        transformations_meta: TransformationsMeta<'_>,
    ) -> Result<Self, TransformationsMetaError>;

    /// Compose `a` and `b` into `self`: the state reached by applying `b` to
    /// `a`.
    fn replace_compose(&mut self, a: &Self, b: &Self, orbit_defs: &[OrbitDef]);

    /// Inverse of a puzzle state.
    fn replace_inverse(&mut self, a: &Self, orbit_defs: &[OrbitDef]);

    /// Get the bytes of the specified orbit index in the form (permutation
    /// vector, orientation vector).
    fn orbit_bytes(&self, orbit_index: usize, orbit_defs: &[OrbitDef]) -> (&[u8], &[u8]);
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct OrbitDef {
    pub piece_count: NonZeroU8,
    pub orientation_count: NonZeroU8,
}

/// A generator move. Moves are expanded from the base moves of a `KSolve`
/// definition, so every power of a base move shares its `move_class_index`.
#[derive(Debug, Clone)]
pub struct Move<P: PuzzleState> {
    pub puzzle_state: P,
    pub move_class_index: usize,
    pub order: usize,
    pub name: String,
}

#[derive(Debug)]
pub struct PuzzleDef<P: PuzzleState> {
    pub moves: Box<[Move<P>]>,
    // indicies into moves
    pub move_classes: Box<[usize]>,
    pub orbit_defs: Box<[OrbitDef]>,
    pub name: String,
    solved: P,
}

#[derive(Clone, Copy)]
pub struct TransformationsMeta<'a> {
    transformations: &'a [Vec<(u8, u8)>],
    orbit_defs: &'a [OrbitDef],
}

#[derive(Error, Debug)]
pub enum KSolveConversionError {
    #[error("Set sizes larger than 255 are not supported")]
    SetSizeTooBig,
    #[error("Orientation counts larger than 128 are not supported")]
    OrientationCountTooBig,
    #[error("Could not expand move set, order of a move too high")]
    MoveOrderTooHigh,
    #[error("Invalid transformation while processing the KSolve definition: {0}")]
    TransformsMetaError(#[from] TransformationsMetaError),
}

#[derive(Error, Debug, PartialEq)]
pub enum TransformationsMetaError {
    #[error("Invalid buffer size, expected {expected} bytes but got {actual}")]
    InvalidBufferSize { expected: usize, actual: usize },
    #[error("Invalid set count, expected {expected} sets but got {actual}")]
    InvalidSetCount { expected: usize, actual: usize },
    #[error("Invalid piece count, expected {expected} pieces but got {actual}")]
    InvalidPieceCount { expected: u8, actual: usize },
    #[error(
        "Invalid orientation delta, expected a value between 0 and {expected} but got {actual}"
    )]
    InvalidOrientationDelta { expected: u8, actual: u8 },
    #[error("Permutation out of range, expected a value between 0 and {expected} but got {actual}")]
    PermutationOutOfRange { expected: u8, actual: u8 },
    #[error("Move is invalid: {0:?}")]
    InvalidTransformation(Vec<Vec<(u8, u8)>>),
}

impl<'a> TransformationsMeta<'a> {
    /// Create a `TransformationsMeta` from 0-indexed `transformations` and
    /// `orbit_defs`.
    ///
    /// # Errors
    ///
    /// If the fields of the arguments are not valid. See
    /// `TransformationsMetaError`.
    pub fn new(
        transformations: &'a [Vec<(u8, u8)>],
        orbit_defs: &'a [OrbitDef],
    ) -> Result<Self, TransformationsMetaError> {
        if transformations.len() != orbit_defs.len() {
            return Err(TransformationsMetaError::InvalidSetCount {
                expected: orbit_defs.len(),
                actual: transformations.len(),
            });
        }

        for (transformation, orbit_def) in transformations.iter().zip(orbit_defs) {
            let expected_piece_count = orbit_def.piece_count.get();
            let actual_piece_count = transformation.len();

            if actual_piece_count != expected_piece_count as usize {
                return Err(TransformationsMetaError::InvalidPieceCount {
                    expected: expected_piece_count,
                    actual: actual_piece_count,
                });
            }

            let max_orientation_delta = orbit_def.orientation_count.get() - 1;
            let mut covered_perms = vec![false; expected_piece_count as usize];

            for &(perm, orientation_delta) in transformation {
                if orientation_delta > max_orientation_delta {
                    return Err(TransformationsMetaError::InvalidOrientationDelta {
                        expected: max_orientation_delta,
                        actual: orientation_delta,
                    });
                }

                match covered_perms.get_mut(perm as usize) {
                    Some(covered) => *covered = true,
                    None => {
                        return Err(TransformationsMetaError::PermutationOutOfRange {
                            expected: expected_piece_count - 1,
                            actual: perm,
                        });
                    }
                }
            }

            if covered_perms.iter().any(|&covered| !covered) {
                return Err(TransformationsMetaError::InvalidTransformation(
                    transformations.to_vec(),
                ));
            }
        }

        Ok(Self {
            transformations,
            orbit_defs,
        })
    }

    #[must_use]
    pub fn transformations(&self) -> &'a [Vec<(u8, u8)>] {
        self.transformations
    }

    #[must_use]
    pub fn orbit_defs(&self) -> &'a [OrbitDef] {
        self.orbit_defs
    }
}

impl<P: PuzzleState> Move<P> {
    /// Apply this move to `puzzle_state`, returning the resulting state.
    #[must_use]
    pub fn apply(&self, puzzle_state: &P, orbit_defs: &[OrbitDef]) -> P {
        let mut result = puzzle_state.clone();
        result.replace_compose(puzzle_state, &self.puzzle_state, orbit_defs);
        result
    }
}

fn identity_transformations(orbit_defs: &[OrbitDef]) -> Vec<Vec<(u8, u8)>> {
    orbit_defs
        .iter()
        .map(|orbit_def| {
            (0..orbit_def.piece_count.get())
                .map(|i| (i, 0))
                .collect_vec()
        })
        .collect_vec()
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl<P: PuzzleState> PuzzleDef<P> {
    /// Create a new `PuzzleDef` from a `KSolve` definition. Every base move
    /// `X` of order `k` is expanded into the move class `X, X2, ..., X'`, in
    /// that order, and move identifiers are indices into the expanded list.
    ///
    /// # Errors
    ///
    /// The `KSolve` definition could not be converted to a `PuzzleDef`. See
    /// `KSolveConversionError`.
    pub fn new(ksolve: &KSolve) -> Result<Self, KSolveConversionError> {
        const MAX_MOVE_POWER: usize = 1_000_000;

        let orbit_defs = ksolve
            .sets()
            .iter()
            .map(|ksolve_set| {
                let orientation_count = ksolve_set.orientation_count();
                if orientation_count.get() > 128 {
                    return Err(KSolveConversionError::OrientationCountTooBig);
                }
                Ok(OrbitDef {
                    piece_count: ksolve_set
                        .piece_count()
                        .try_into()
                        .map_err(|_| KSolveConversionError::SetSizeTooBig)?,
                    orientation_count,
                })
            })
            .collect::<Result<Vec<_>, KSolveConversionError>>()?;

        let identity = identity_transformations(&orbit_defs);
        let solved = P::try_from_transformations_meta(TransformationsMeta::new(
            &identity,
            &orbit_defs,
        )?)?;

        let mut moves = Vec::with_capacity(ksolve.moves().len());
        let mut move_classes = Vec::with_capacity(ksolve.moves().len());

        for ksolve_move in ksolve.moves() {
            let transformations = ksolve_move
                .zero_indexed_transformation()
                .into_iter()
                .map(|perm_and_ori| {
                    perm_and_ori
                        .into_iter()
                        .map(|(perm, orientation)| {
                            Ok((
                                u8::try_from(perm)
                                    .map_err(|_| KSolveConversionError::SetSizeTooBig)?,
                                orientation,
                            ))
                        })
                        .collect::<Result<Vec<_>, KSolveConversionError>>()
                })
                .collect::<Result<Vec<_>, KSolveConversionError>>()?;
            let puzzle_state = P::try_from_transformations_meta(TransformationsMeta::new(
                &transformations,
                &orbit_defs,
            )?)?;

            let mut move_powers: Vec<P> = vec![];
            let mut result_1 = solved.clone();
            let mut result_2 = solved.clone();
            loop {
                result_1.replace_compose(&result_2, &puzzle_state, &orbit_defs);
                if result_1 == solved {
                    break;
                }
                if move_powers.len() == MAX_MOVE_POWER {
                    return Err(KSolveConversionError::MoveOrderTooHigh);
                }
                move_powers.push(result_1.clone());
                std::mem::swap(&mut result_1, &mut result_2);
            }

            // An identity move can never be part of an optimal solution
            if move_powers.is_empty() {
                continue;
            }

            let move_class_index = move_classes.len();
            move_classes.push(moves.len());

            let order = move_powers.len() + 1;
            for (j, power) in move_powers.into_iter().enumerate() {
                let exponent = j + 1;
                let mut name = ksolve_move.name().to_owned();
                // Powers past the halfway point are written as inverses
                if order - exponent < exponent {
                    if order - exponent != 1 {
                        name.push_str(&(order - exponent).to_string());
                    }
                    name.push('\'');
                } else if exponent != 1 {
                    name.push_str(&exponent.to_string());
                }
                moves.push(Move {
                    puzzle_state: power,
                    move_class_index,
                    order: order / gcd(order, exponent),
                    name,
                });
            }
        }

        Ok(PuzzleDef {
            moves: moves.into_boxed_slice(),
            move_classes: move_classes.into_boxed_slice(),
            orbit_defs: orbit_defs.into_boxed_slice(),
            name: ksolve.name().to_owned(),
            solved,
        })
    }

    #[must_use]
    pub fn find_move(&self, name: &str) -> Option<(usize, &Move<P>)> {
        self.moves.iter().find_position(|move_| move_.name == name)
    }

    #[must_use]
    pub fn new_solved_state(&self) -> P {
        self.solved.clone()
    }

    #[must_use]
    pub fn solved_state(&self) -> &P {
        &self.solved
    }

    #[must_use]
    pub fn is_solved(&self, puzzle_state: &P) -> bool {
        *puzzle_state == self.solved
    }

    /// Apply the move at `move_index` to `puzzle_state`.
    ///
    /// # Panics
    ///
    /// Panics if `move_index` is out of bounds.
    #[must_use]
    pub fn apply_move(&self, puzzle_state: &P, move_index: usize) -> P {
        self.moves[move_index].apply(puzzle_state, &self.orbit_defs)
    }
}

/// Apply a sequence of move identifiers to `puzzle_state`. Not optimized.
///
/// # Panics
///
/// Panics if a move index is out of bounds.
#[must_use]
pub fn apply_move_indices<P: PuzzleState>(
    puzzle_def: &PuzzleDef<P>,
    puzzle_state: &P,
    move_indices: &[usize],
) -> P {
    let mut result_1 = puzzle_state.clone();
    let mut result_2 = puzzle_state.clone();
    for &move_index in move_indices {
        result_2.replace_compose(
            &result_1,
            &puzzle_def.moves[move_index].puzzle_state,
            &puzzle_def.orbit_defs,
        );
        std::mem::swap(&mut result_1, &mut result_2);
    }
    result_1
}

/// Apply `random_move_count` uniformly random moves to `puzzle_state`.
#[allow(clippy::missing_panics_doc)]
#[must_use]
pub fn apply_random_moves<P: PuzzleState>(
    puzzle_def: &PuzzleDef<P>,
    puzzle_state: &P,
    random_move_count: u32,
) -> P {
    let mut result_1 = puzzle_state.clone();
    let mut result_2 = puzzle_state.clone();
    for _ in 0..random_move_count {
        let Some(move_) = fastrand::choice(puzzle_def.moves.iter()) else {
            break;
        };
        result_1.replace_compose(&result_2, &move_.puzzle_state, &puzzle_def.orbit_defs);
        std::mem::swap(&mut result_2, &mut result_1);
    }
    result_2
}

#[cfg(test)]
mod tests {
    use super::{slice_puzzle::HeapPuzzle, *};
    use crate::ksolve::{KPUZZLE_2X2, KPUZZLE_3X3, KSolveMove, KSolveSet, nonzero_perm};

    fn solved_is_solved<P: PuzzleState>() {
        let cube2_def = PuzzleDef::<P>::new(&KPUZZLE_2X2).unwrap();
        let solved = cube2_def.new_solved_state();
        assert!(cube2_def.is_solved(&solved));
        assert_eq!(&solved, cube2_def.solved_state());
        assert!(!cube2_def.is_solved(&cube2_def.moves[0].puzzle_state));
    }

    #[test]
    fn test_solved_is_solved() {
        solved_is_solved::<Cube2>();
        solved_is_solved::<HeapPuzzle>();
    }

    fn expanded_moves<P: PuzzleState>() {
        let cube2_def = PuzzleDef::<P>::new(&KPUZZLE_2X2).unwrap();
        assert_eq!(
            cube2_def.moves.iter().map(|move_| move_.name.as_str()).collect_vec(),
            ["U", "U2", "U'", "R", "R2", "R'", "F", "F2", "F'"]
        );
        assert_eq!(
            cube2_def.moves.iter().map(|move_| move_.order).collect_vec(),
            [4, 2, 4, 4, 2, 4, 4, 2, 4]
        );
        assert_eq!(
            cube2_def
                .moves
                .iter()
                .map(|move_| move_.move_class_index)
                .collect_vec(),
            [0, 0, 0, 1, 1, 1, 2, 2, 2]
        );
        assert_eq!(&*cube2_def.move_classes, &[0, 3, 6]);
        assert_eq!(cube2_def.find_move("R2").unwrap().0, 4);
        assert!(cube2_def.find_move("D").is_none());
    }

    fn cube3_expanded_moves<P: PuzzleState>() {
        let cube3_def = PuzzleDef::<P>::new(&KPUZZLE_3X3).unwrap();
        assert_eq!(cube3_def.moves.len(), 18);
        assert_eq!(&*cube3_def.move_classes, &[0, 3, 6, 9, 12, 15]);
        assert_eq!(cube3_def.moves[17].name, "B'");
    }

    #[test]
    fn test_expanded_moves() {
        expanded_moves::<Cube2>();
        expanded_moves::<HeapPuzzle>();
        cube3_expanded_moves::<Cube3>();
        cube3_expanded_moves::<HeapPuzzle>();
    }

    fn move_orders<P: PuzzleState>(ksolve: &KSolve) {
        let puzzle_def = PuzzleDef::<P>::new(ksolve).unwrap();
        let solved = puzzle_def.new_solved_state();
        for (move_index, move_) in puzzle_def.moves.iter().enumerate() {
            let mut puzzle_state = solved.clone();
            for power in 1..=move_.order {
                puzzle_state = puzzle_def.apply_move(&puzzle_state, move_index);
                assert_eq!(
                    puzzle_def.is_solved(&puzzle_state),
                    power == move_.order,
                    "{} applied {power} times",
                    move_.name
                );
            }
        }
    }

    #[test]
    fn test_move_orders() {
        move_orders::<Cube2>(&KPUZZLE_2X2);
        move_orders::<Cube3>(&KPUZZLE_3X3);
        move_orders::<HeapPuzzle>(&KPUZZLE_2X2);
        move_orders::<HeapPuzzle>(&KPUZZLE_3X3);
    }

    #[test]
    fn test_quarter_turns_have_order_four() {
        let cube2_def = PuzzleDef::<Cube2>::new(&KPUZZLE_2X2).unwrap();
        let solved = cube2_def.new_solved_state();
        for move_index in [0, 3, 6] {
            let p1 = cube2_def.apply_move(&solved, move_index);
            assert!(!cube2_def.is_solved(&p1));
            let p2 = cube2_def.apply_move(&p1, move_index);
            assert!(!cube2_def.is_solved(&p2));
            let p3 = cube2_def.apply_move(&p2, move_index);
            assert!(!cube2_def.is_solved(&p3));
            let p4 = cube2_def.apply_move(&p3, move_index);
            assert!(cube2_def.is_solved(&p4));
        }
    }

    #[test]
    fn test_apply_does_not_mutate() {
        let cube2_def = PuzzleDef::<Cube2>::new(&KPUZZLE_2X2).unwrap();
        let solved = cube2_def.new_solved_state();
        let before = solved.clone();
        let turned = cube2_def.moves[0].apply(&solved, &cube2_def.orbit_defs);
        assert_eq!(solved, before);
        assert_ne!(turned, solved);
    }

    #[test]
    fn test_inverse() {
        let cube3_def = PuzzleDef::<Cube3>::new(&KPUZZLE_3X3).unwrap();
        let solved = cube3_def.new_solved_state();
        let scrambled = apply_move_indices(&cube3_def, &solved, &[0, 4, 8, 9, 13, 17, 2]);

        let mut inverse = solved.clone();
        inverse.replace_inverse(&scrambled, &cube3_def.orbit_defs);
        let mut composed = solved.clone();
        composed.replace_compose(&scrambled, &inverse, &cube3_def.orbit_defs);
        assert!(cube3_def.is_solved(&composed));
        composed.replace_compose(&inverse, &scrambled, &cube3_def.orbit_defs);
        assert!(cube3_def.is_solved(&composed));

        // U' undoes U
        let u = cube3_def.moves[0].puzzle_state.clone();
        inverse.replace_inverse(&u, &cube3_def.orbit_defs);
        assert_eq!(inverse, cube3_def.moves[2].puzzle_state);
    }

    #[test]
    fn test_half_turns_do_not_commute() {
        let cube3_def = PuzzleDef::<Cube3>::new(&KPUZZLE_3X3).unwrap();
        let solved = cube3_def.new_solved_state();
        let u2_r2_u2 = apply_move_indices(&cube3_def, &solved, &[1, 4, 1]);
        let r2_u2_r2 = apply_move_indices(&cube3_def, &solved, &[4, 1, 4]);
        assert_ne!(u2_r2_u2, r2_u2_r2);

        // Without edges the two sequences agree
        let cube2_def = PuzzleDef::<Cube2>::new(&KPUZZLE_2X2).unwrap();
        let solved = cube2_def.new_solved_state();
        assert_eq!(
            apply_move_indices(&cube2_def, &solved, &[1, 4, 1]),
            apply_move_indices(&cube2_def, &solved, &[4, 1, 4])
        );
    }

    #[test]
    fn test_random_moves_stay_valid() {
        let cube2_def = PuzzleDef::<Cube2>::new(&KPUZZLE_2X2).unwrap();
        let solved = cube2_def.new_solved_state();
        let scrambled = apply_random_moves(&cube2_def, &solved, 20);
        let (perm, ori) = scrambled.orbit_bytes(0, &cube2_def.orbit_defs);
        assert_eq!(perm.iter().copied().sorted().collect_vec(), (0..8_u8).collect_vec());
        assert_eq!(ori.iter().map(|&o| u32::from(o)).sum::<u32>() % 3, 0);
        // The back-down-left corner never moves
        assert_eq!((perm[7], ori[7]), (7, 0));
    }

    #[test]
    fn test_invalid_stack_size() {
        assert!(matches!(
            PuzzleDef::<StackPuzzle<12>>::new(&KPUZZLE_2X2),
            Err(KSolveConversionError::TransformsMetaError(
                TransformationsMetaError::InvalidBufferSize {
                    expected: 16,
                    actual: 12
                }
            ))
        ));
    }

    #[test]
    fn test_transformations_meta_validation() {
        let orbit_defs = [OrbitDef {
            piece_count: 3.try_into().unwrap(),
            orientation_count: 2.try_into().unwrap(),
        }];
        assert!(TransformationsMeta::new(&[vec![(1, 1), (2, 0), (0, 1)]], &orbit_defs).is_ok());
        assert_eq!(
            TransformationsMeta::new(&[vec![(1, 2), (2, 0), (0, 1)]], &orbit_defs)
                .err()
                .unwrap(),
            TransformationsMetaError::InvalidOrientationDelta {
                expected: 1,
                actual: 2
            }
        );
        assert_eq!(
            TransformationsMeta::new(&[vec![(3, 0), (2, 0), (0, 1)]], &orbit_defs)
                .err()
                .unwrap(),
            TransformationsMetaError::PermutationOutOfRange {
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn test_move_order_of_three_cycle() {
        let ksolve = crate::ksolve::KSolve::new(
            "triangle".to_owned(),
            vec![KSolveSet::new(
                "Pieces".to_owned(),
                3.try_into().unwrap(),
                1.try_into().unwrap(),
            )],
            vec![KSolveMove::new(
                "T".to_owned(),
                nonzero_perm(vec![vec![(2, 0), (3, 0), (1, 0)]]),
            )],
        )
        .unwrap();
        let puzzle_def = PuzzleDef::<HeapPuzzle>::new(&ksolve).unwrap();
        assert_eq!(
            puzzle_def.moves.iter().map(|move_| move_.name.as_str()).collect_vec(),
            ["T", "T'"]
        );
        assert!(puzzle_def.moves.iter().all(|move_| move_.order == 3));
    }
}
