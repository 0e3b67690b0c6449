//! The default, generic implementation for representing puzzle states. Each
//! orbit is laid out as its permutation vector followed by its orientation
//! vector.

use super::{OrbitDef, PuzzleState, TransformationsMeta, TransformationsMetaError};
use crate::FACT_UNTIL_19;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct StackPuzzle<const N: usize>([u8; N]);

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct HeapPuzzle(Box<[u8]>);

impl<const N: usize> PuzzleState for StackPuzzle<N> {
    fn try_from_transformations_meta(
        transformations_meta: TransformationsMeta<'_>,
    ) -> Result<Self, TransformationsMetaError> {
        let mut slice_orbit_states = [0_u8; N];
        ksolve_move_to_slice(&mut slice_orbit_states, transformations_meta)?;
        Ok(StackPuzzle(slice_orbit_states))
    }

    fn replace_compose(&mut self, a: &Self, b: &Self, orbit_defs: &[OrbitDef]) {
        replace_compose_slice(&mut self.0, &a.0, &b.0, orbit_defs);
    }

    fn replace_inverse(&mut self, a: &Self, orbit_defs: &[OrbitDef]) {
        replace_inverse_slice(&mut self.0, &a.0, orbit_defs);
    }

    fn orbit_bytes(&self, orbit_index: usize, orbit_defs: &[OrbitDef]) -> (&[u8], &[u8]) {
        orbit_bytes_slice(&self.0, orbit_index, orbit_defs)
    }
}

impl PuzzleState for HeapPuzzle {
    fn try_from_transformations_meta(
        transformations_meta: TransformationsMeta<'_>,
    ) -> Result<Self, TransformationsMetaError> {
        let orbit_defs = transformations_meta.orbit_defs();
        let mut slice_orbit_states =
            vec![0_u8; orbit_defs.iter().copied().map(slice_orbit_size).sum::<usize>()]
                .into_boxed_slice();
        ksolve_move_to_slice(&mut slice_orbit_states, transformations_meta)?;
        Ok(HeapPuzzle(slice_orbit_states))
    }

    fn replace_compose(&mut self, a: &Self, b: &Self, orbit_defs: &[OrbitDef]) {
        replace_compose_slice(&mut self.0, &a.0, &b.0, orbit_defs);
    }

    fn replace_inverse(&mut self, a: &Self, orbit_defs: &[OrbitDef]) {
        replace_inverse_slice(&mut self.0, &a.0, orbit_defs);
    }

    fn orbit_bytes(&self, orbit_index: usize, orbit_defs: &[OrbitDef]) -> (&[u8], &[u8]) {
        orbit_bytes_slice(&self.0, orbit_index, orbit_defs)
    }
}

#[must_use]
pub fn slice_orbit_size(orbit_def: OrbitDef) -> usize {
    orbit_def.piece_count.get() as usize * 2
}

/// Populate `slice_orbit_states` with `transformations_meta`.
fn ksolve_move_to_slice(
    slice_orbit_states: &mut [u8],
    transformations_meta: TransformationsMeta,
) -> Result<(), TransformationsMetaError> {
    let orbit_defs = transformations_meta.orbit_defs();
    let expected = orbit_defs.iter().copied().map(slice_orbit_size).sum();
    if slice_orbit_states.len() != expected {
        return Err(TransformationsMetaError::InvalidBufferSize {
            expected,
            actual: slice_orbit_states.len(),
        });
    }

    let mut base = 0;
    for (transformation, &orbit_def) in transformations_meta
        .transformations()
        .iter()
        .zip(orbit_defs)
    {
        let piece_count = orbit_def.piece_count.get() as usize;
        for (i, &(perm, orientation_delta)) in transformation.iter().enumerate() {
            slice_orbit_states[base + i] = perm;
            slice_orbit_states[base + i + piece_count] = orientation_delta;
        }
        base += slice_orbit_size(orbit_def);
    }
    Ok(())
}

fn replace_compose_slice(
    slice_orbit_states_mut: &mut [u8],
    a: &[u8],
    b: &[u8],
    orbit_defs: &[OrbitDef],
) {
    debug_assert_eq!(slice_orbit_states_mut.len(), a.len());
    debug_assert_eq!(a.len(), b.len());

    let mut base = 0;
    for &orbit_def in orbit_defs {
        let piece_count = orbit_def.piece_count.get() as usize;
        let orientation_count = orbit_def.orientation_count.get();
        for i in base..base + piece_count {
            let pos = base + b[i] as usize;
            slice_orbit_states_mut[i] = a[pos];
            // Orientation counts are at most 128, so the sum cannot overflow
            let ori = a[pos + piece_count] + b[i + piece_count];
            slice_orbit_states_mut[i + piece_count] = if ori >= orientation_count {
                ori - orientation_count
            } else {
                ori
            };
        }
        base += slice_orbit_size(orbit_def);
    }
}

fn replace_inverse_slice(slice_orbit_states_mut: &mut [u8], a: &[u8], orbit_defs: &[OrbitDef]) {
    debug_assert_eq!(slice_orbit_states_mut.len(), a.len());

    let mut base = 0;
    for &orbit_def in orbit_defs {
        let piece_count = orbit_def.piece_count.get();
        let orientation_count = orbit_def.orientation_count.get();
        for i in 0..piece_count {
            let base_i = base + i as usize;
            let pos = base + a[base_i] as usize;
            slice_orbit_states_mut[pos] = i;
            slice_orbit_states_mut[pos + piece_count as usize] =
                (orientation_count - a[base_i + piece_count as usize]) % orientation_count;
        }
        base += slice_orbit_size(orbit_def);
    }
}

fn orbit_bytes_slice<'a>(
    slice_orbit_states: &'a [u8],
    orbit_index: usize,
    orbit_defs: &[OrbitDef],
) -> (&'a [u8], &'a [u8]) {
    let base = orbit_defs[..orbit_index]
        .iter()
        .copied()
        .map(slice_orbit_size)
        .sum::<usize>();
    let piece_count = orbit_defs[orbit_index].piece_count.get() as usize;
    slice_orbit_states[base..base + 2 * piece_count].split_at(piece_count)
}

/// The lexicographic rank of a permutation (its Lehmer code), in `0..n!`.
///
/// # Panics
///
/// Panics if the permutation has more than 20 elements.
// TODO: this is quadratic; a bit-counting rank would make it linear
#[must_use]
pub fn permutation_rank(perm: &[u8]) -> u64 {
    let piece_count = perm.len();
    assert!(piece_count <= FACT_UNTIL_19.len());

    let mut rank = 0;
    for i in 0..piece_count.saturating_sub(1) {
        let smaller_after = perm[i + 1..].iter().filter(|&&p| p < perm[i]).count() as u64;
        rank += smaller_after * FACT_UNTIL_19[piece_count - i - 1];
    }
    rank
}

/// The rank of an orientation vector, in `0..orientation_count^(n-1)`. The
/// last orientation is ignored because it is determined by the others on any
/// reachable state.
#[must_use]
pub fn orientation_rank(ori: &[u8], orientation_count: u8) -> u64 {
    ori.iter()
        .take(ori.len().saturating_sub(1))
        .fold(0, |rank, &o| {
            rank * u64::from(orientation_count) + u64::from(o)
        })
}

/// Return an integer that corresponds to a bijective mapping of an orbit's
/// reachable states.
#[must_use]
pub fn exact_hasher_orbit_bytes(perm: &[u8], ori: &[u8], orbit_def: OrbitDef) -> u64 {
    permutation_rank(perm)
        * u64::from(orbit_def.orientation_count.get())
            .pow(u32::from(orbit_def.piece_count.get()) - 1)
        + orientation_rank(ori, orbit_def.orientation_count.get())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ksolve::KPUZZLE_3X3,
        puzzle::{Cube3, PuzzleDef, apply_move_indices},
    };

    #[test]
    fn test_permutation_rank() {
        assert_eq!(permutation_rank(&[0, 1, 2, 3]), 0);
        assert_eq!(permutation_rank(&[0, 1, 3, 2]), 1);
        assert_eq!(permutation_rank(&[1, 0, 2, 3]), 6);
        assert_eq!(permutation_rank(&[3, 2, 1, 0]), 23);
        assert_eq!(permutation_rank(&[]), 0);
    }

    #[test]
    fn test_orientation_rank() {
        assert_eq!(orientation_rank(&[0, 0, 0], 3), 0);
        assert_eq!(orientation_rank(&[2, 1, 0], 3), 7);
        assert_eq!(orientation_rank(&[2, 2, 2], 3), 8);
    }

    #[test]
    fn test_exact_hasher_orbit_bytes() {
        let orbit_def = OrbitDef {
            piece_count: 3.try_into().unwrap(),
            orientation_count: 2.try_into().unwrap(),
        };
        assert_eq!(exact_hasher_orbit_bytes(&[0, 1, 2], &[0, 0, 0], orbit_def), 0);
        assert_eq!(exact_hasher_orbit_bytes(&[0, 1, 2], &[1, 1, 0], orbit_def), 3);
        assert_eq!(exact_hasher_orbit_bytes(&[2, 1, 0], &[1, 0, 1], orbit_def), 22);
    }

    #[test]
    fn test_orbit_bytes() {
        let cube3_def = PuzzleDef::<Cube3>::new(&KPUZZLE_3X3).unwrap();
        let solved = cube3_def.new_solved_state();
        let (perm, ori) = solved.orbit_bytes(1, &cube3_def.orbit_defs);
        assert_eq!(perm, (0..12).collect::<Vec<u8>>());
        assert_eq!(ori, [0; 12]);

        // F flips four edges
        let f = apply_move_indices(&cube3_def, &solved, &[6]);
        let (_, ori) = f.orbit_bytes(1, &cube3_def.orbit_defs);
        assert_eq!(ori.iter().filter(|&&o| o == 1).count(), 4);
        let (perm, _) = f.orbit_bytes(0, &cube3_def.orbit_defs);
        assert_eq!(perm, [6, 0, 2, 1, 4, 5, 3, 7]);
    }
}
