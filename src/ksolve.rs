use std::{
    num::{NonZeroU8, NonZeroU16},
    sync::LazyLock,
};
use thiserror::Error;

/// A representation of a puzzle in the KSolve format. We stay consistent with
/// the KSolve format and terminology because it is the lingua-franca of the
/// puzzle theory community.
#[derive(Clone, Debug, PartialEq)]
pub struct KSolve {
    name: String,
    sets: Vec<KSolveSet>,
    moves: Vec<KSolveMove>,
}

/// A piece orbit of a KSolve puzzle, or "Set" to remain consistent with the
/// KSolve terminology
#[derive(Clone, Debug, PartialEq)]
pub struct KSolveSet {
    name: String,
    piece_count: NonZeroU16,
    orientation_count: NonZeroU8,
}

/// A transformation of a KSolve puzzle. A list of (permutation vector,
/// orientation vector) per set, with 1-indexed permutations.
pub type KSolveTransformation = Vec<Vec<(NonZeroU16, u8)>>;

#[derive(Clone, Debug, PartialEq)]
pub struct KSolveMove {
    transformation: KSolveTransformation,
    name: String,
}

#[derive(Error, Debug, PartialEq)]
pub enum KSolveConstructionError {
    #[error("Invalid set count, expected {0} sets but got {1}")]
    InvalidSetCount(usize, usize),
    #[error("Invalid piece count, expected {0} pieces but got {1}")]
    InvalidPieceCount(u16, usize),
    #[error("Invalid orientation delta, expected a value between 0 and {0} but got {1}")]
    InvalidOrientationDelta(u8, u8),
    #[error("Permutation out of range, expected a value between 1 and {0} but got {1}")]
    PermutationOutOfRange(u16, u16),
    #[error("Move is invalid: {0:?}")]
    InvalidMove(KSolveMove),
    #[error("Duplicate move name: {0}")]
    DuplicateMoveName(String),
}

impl KSolve {
    /// Create a KSolve puzzle, validating every move against the sets.
    ///
    /// # Errors
    ///
    /// If a move does not describe a valid transformation of `sets`. See
    /// `KSolveConstructionError`.
    pub fn new(
        name: String,
        sets: Vec<KSolveSet>,
        moves: Vec<KSolveMove>,
    ) -> Result<Self, KSolveConstructionError> {
        let expected_set_count = sets.len();

        for (i, ksolve_move) in moves.iter().enumerate() {
            if moves[..i]
                .iter()
                .any(|other_move| other_move.name == ksolve_move.name)
            {
                return Err(KSolveConstructionError::DuplicateMoveName(
                    ksolve_move.name.clone(),
                ));
            }

            let actual_set_count = ksolve_move.transformation.len();
            if actual_set_count != expected_set_count {
                return Err(KSolveConstructionError::InvalidSetCount(
                    expected_set_count,
                    actual_set_count,
                ));
            }

            for (transformation, ksolve_set) in ksolve_move.transformation.iter().zip(&sets) {
                let expected_piece_count = ksolve_set.piece_count.get();
                let actual_piece_count = transformation.len();

                if actual_piece_count != expected_piece_count as usize {
                    return Err(KSolveConstructionError::InvalidPieceCount(
                        expected_piece_count,
                        actual_piece_count,
                    ));
                }

                let max_orientation_delta = ksolve_set.orientation_count.get() - 1;
                let mut covered_perms = vec![false; expected_piece_count as usize];

                for &(perm, orientation_delta) in transformation {
                    if orientation_delta > max_orientation_delta {
                        return Err(KSolveConstructionError::InvalidOrientationDelta(
                            max_orientation_delta,
                            orientation_delta,
                        ));
                    }

                    match covered_perms.get_mut((perm.get() - 1) as usize) {
                        Some(covered) => *covered = true,
                        None => {
                            return Err(KSolveConstructionError::PermutationOutOfRange(
                                expected_piece_count,
                                perm.get(),
                            ));
                        }
                    }
                }

                if covered_perms.iter().any(|&covered| !covered) {
                    return Err(KSolveConstructionError::InvalidMove(ksolve_move.clone()));
                }
            }
        }

        Ok(KSolve { name, sets, moves })
    }

    /// Get the name of the puzzle
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the sets of pieces on the puzzle
    #[must_use]
    pub fn sets(&self) -> &[KSolveSet] {
        &self.sets
    }

    /// Get the set of available moves on the puzzle
    #[must_use]
    pub fn moves(&self) -> &[KSolveMove] {
        &self.moves
    }
}

impl KSolveSet {
    #[must_use]
    pub fn new(name: String, piece_count: NonZeroU16, orientation_count: NonZeroU8) -> Self {
        Self {
            name,
            piece_count,
            orientation_count,
        }
    }

    /// Get the name of the set
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of pieces in the set
    #[must_use]
    pub fn piece_count(&self) -> NonZeroU16 {
        self.piece_count
    }

    /// Get the orientation modulo of the set
    #[must_use]
    pub fn orientation_count(&self) -> NonZeroU8 {
        self.orientation_count
    }
}

impl KSolveMove {
    #[must_use]
    pub fn new(name: String, transformation: KSolveTransformation) -> Self {
        Self {
            transformation,
            name,
        }
    }

    /// Get the name of the move
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Convenience method for converting KSolve's 1-indexed permutation vectors
    /// to 0-indexed permutation vectors
    #[must_use]
    pub fn zero_indexed_transformation(&self) -> Vec<Vec<(u16, u8)>> {
        self.transformation
            .iter()
            .map(|perm_and_ori| {
                perm_and_ori
                    .iter()
                    .map(|&(p, o)| (p.get() - 1, o))
                    .collect()
            })
            .collect()
    }
}

/// Convert 1-indexed `(perm, ori)` pairs into a `KSolveTransformation`.
///
/// # Panics
///
/// Panics if a permutation entry is zero.
#[must_use]
pub fn nonzero_perm(transformation: Vec<Vec<(u16, u8)>>) -> KSolveTransformation {
    transformation
        .into_iter()
        .map(|perm_and_ori| {
            perm_and_ori
                .into_iter()
                .map(|(p, o)| (p.try_into().unwrap(), o))
                .collect()
        })
        .collect()
}

const CUBE_U_CORNERS: [(u16, u8); 8] = [
    (3, 0),
    (2, 0),
    (6, 0),
    (4, 0),
    (5, 0),
    (7, 0),
    (1, 0),
    (8, 0),
];
const CUBE_R_CORNERS: [(u16, u8); 8] = [
    (2, 1),
    (5, 2),
    (1, 2),
    (4, 0),
    (3, 1),
    (6, 0),
    (7, 0),
    (8, 0),
];
const CUBE_F_CORNERS: [(u16, u8); 8] = [
    (7, 2),
    (1, 1),
    (3, 0),
    (2, 2),
    (5, 0),
    (6, 0),
    (4, 1),
    (8, 0),
];

fn corners_set() -> KSolveSet {
    KSolveSet::new(
        "Corners".to_owned(),
        8.try_into().unwrap(),
        3.try_into().unwrap(),
    )
}

/// The 2x2x2 cube with the `U`, `R` and `F` faces turnable. The back-down-left
/// corner never moves, which fixes the cube's spatial orientation.
pub static KPUZZLE_2X2: LazyLock<KSolve> = LazyLock::new(|| {
    let moves = [
        ("U", CUBE_U_CORNERS),
        ("R", CUBE_R_CORNERS),
        ("F", CUBE_F_CORNERS),
    ]
    .into_iter()
    .map(|(name, corners)| {
        KSolveMove::new(name.to_owned(), nonzero_perm(vec![corners.to_vec()]))
    })
    .collect();
    KSolve::new("2x2x2".to_owned(), vec![corners_set()], moves).unwrap()
});

/// The 3x3x3 cube with every outer face turnable.
pub static KPUZZLE_3X3: LazyLock<KSolve> = LazyLock::new(|| {
    let moves = [
        (
            "U",
            CUBE_U_CORNERS.to_vec(),
            vec![
                (1, 0),
                (2, 0),
                (3, 0),
                (4, 0),
                (5, 0),
                (6, 0),
                (7, 0),
                (11, 0),
                (9, 0),
                (8, 0),
                (12, 0),
                (10, 0),
            ],
        ),
        (
            "R",
            CUBE_R_CORNERS.to_vec(),
            vec![
                (4, 0),
                (2, 0),
                (8, 0),
                (3, 0),
                (5, 0),
                (6, 0),
                (7, 0),
                (1, 0),
                (9, 0),
                (10, 0),
                (11, 0),
                (12, 0),
            ],
        ),
        (
            "F",
            CUBE_F_CORNERS.to_vec(),
            vec![
                (10, 1),
                (1, 1),
                (3, 0),
                (4, 0),
                (2, 1),
                (6, 0),
                (7, 0),
                (8, 0),
                (9, 0),
                (5, 1),
                (11, 0),
                (12, 0),
            ],
        ),
        (
            "D",
            vec![
                (1, 0),
                (4, 0),
                (3, 0),
                (8, 0),
                (2, 0),
                (6, 0),
                (7, 0),
                (5, 0),
            ],
            vec![
                (1, 0),
                (9, 0),
                (3, 0),
                (2, 0),
                (5, 0),
                (4, 0),
                (7, 0),
                (8, 0),
                (6, 0),
                (10, 0),
                (11, 0),
                (12, 0),
            ],
        ),
        (
            "L",
            vec![
                (1, 0),
                (2, 0),
                (3, 0),
                (7, 1),
                (5, 0),
                (8, 1),
                (6, 2),
                (4, 2),
            ],
            vec![
                (1, 0),
                (2, 0),
                (3, 0),
                (4, 0),
                (12, 0),
                (6, 0),
                (9, 0),
                (8, 0),
                (5, 0),
                (10, 0),
                (11, 0),
                (7, 0),
            ],
        ),
        (
            "B",
            vec![
                (1, 0),
                (2, 0),
                (5, 1),
                (4, 0),
                (8, 2),
                (3, 2),
                (7, 0),
                (6, 1),
            ],
            vec![
                (1, 0),
                (2, 0),
                (6, 1),
                (4, 0),
                (5, 0),
                (7, 1),
                (11, 1),
                (8, 0),
                (9, 0),
                (10, 0),
                (3, 1),
                (12, 0),
            ],
        ),
    ]
    .into_iter()
    .map(|(name, corners, edges)| {
        KSolveMove::new(name.to_owned(), nonzero_perm(vec![corners, edges]))
    })
    .collect();
    KSolve::new(
        "3x3x3".to_owned(),
        vec![
            corners_set(),
            KSolveSet::new(
                "Edges".to_owned(),
                12.try_into().unwrap(),
                2.try_into().unwrap(),
            ),
        ],
        moves,
    )
    .unwrap()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic]
    fn test_nonzero_perm() {
        nonzero_perm(vec![
            vec![(0, 0), (2, 0), (3, 0)],
            vec![(1, 0), (2, 0), (3, 0), (4, 0)],
        ]);
    }

    #[test]
    fn test_builtin_puzzles() {
        assert_eq!(KPUZZLE_2X2.name(), "2x2x2");
        assert_eq!(KPUZZLE_2X2.sets().len(), 1);
        assert_eq!(
            KPUZZLE_2X2.moves().iter().map(KSolveMove::name).collect::<Vec<_>>(),
            ["U", "R", "F"]
        );

        assert_eq!(KPUZZLE_3X3.sets().len(), 2);
        assert_eq!(KPUZZLE_3X3.sets()[1].piece_count().get(), 12);
        assert_eq!(KPUZZLE_3X3.moves().len(), 6);
    }

    #[test]
    fn test_zero_indexed_transformation() {
        let ksolve_move = &KPUZZLE_2X2.moves()[0];
        let expected = vec![vec![
            (2, 0),
            (1, 0),
            (5, 0),
            (3, 0),
            (4, 0),
            (6, 0),
            (0, 0),
            (7, 0),
        ]];
        assert_eq!(ksolve_move.zero_indexed_transformation(), expected);
    }

    fn tiny_sets() -> Vec<KSolveSet> {
        vec![KSolveSet::new(
            "la vista".to_owned(),
            3.try_into().unwrap(),
            5.try_into().unwrap(),
        )]
    }

    #[test]
    fn test_valid_construction() {
        let ksolve = KSolve::new(
            "hasta".to_owned(),
            tiny_sets(),
            vec![KSolveMove::new(
                "F".to_owned(),
                nonzero_perm(vec![vec![(2, 4), (3, 0), (1, 1)]]),
            )],
        )
        .unwrap();
        assert_eq!(ksolve.name(), "hasta");
        assert_eq!(ksolve.moves()[0].name(), "F");
    }

    #[test]
    fn test_invalid_construction() {
        let make = |transformation| {
            KSolve::new(
                "hasta".to_owned(),
                tiny_sets(),
                vec![KSolveMove::new("F".to_owned(), nonzero_perm(transformation))],
            )
        };

        assert_eq!(
            make(vec![]).unwrap_err(),
            KSolveConstructionError::InvalidSetCount(1, 0)
        );
        assert_eq!(
            make(vec![vec![(1, 0), (2, 0)]]).unwrap_err(),
            KSolveConstructionError::InvalidPieceCount(3, 2)
        );
        assert_eq!(
            make(vec![vec![(1, 0), (2, 5), (3, 0)]]).unwrap_err(),
            KSolveConstructionError::InvalidOrientationDelta(4, 5)
        );
        assert_eq!(
            make(vec![vec![(1, 0), (2, 0), (4, 0)]]).unwrap_err(),
            KSolveConstructionError::PermutationOutOfRange(3, 4)
        );
        assert!(matches!(
            make(vec![vec![(1, 0), (1, 0), (3, 0)]]).unwrap_err(),
            KSolveConstructionError::InvalidMove(_)
        ));
    }
}
