use criterion::{Criterion, criterion_group, criterion_main};
use optimal_solver::{
    ksolve::KPUZZLE_2X2,
    pruning::{OrbitCoordinate, OrbitRanker, PruningTable},
    puzzle::{Cube2, PuzzleDef, apply_move_indices},
    solver::IdaStarSolver,
};
use std::hint::black_box;

fn bench_pruning_table(c: &mut Criterion) {
    let cube2_def = PuzzleDef::<Cube2>::new(&KPUZZLE_2X2).unwrap();
    let solved = cube2_def.new_solved_state();
    let ranker = OrbitRanker::new(&cube2_def, 0, OrbitCoordinate::Permutation).unwrap();

    c.bench_function("pruning/corner_permutation_depth_7", |bch| {
        bch.iter(|| {
            PruningTable::generate(
                &cube2_def,
                black_box(&solved),
                7,
                289_896,
                ranker.clone(),
            )
            .unwrap()
        });
    });
}

fn bench_search(c: &mut Criterion) {
    let cube2_def = PuzzleDef::<Cube2>::new(&KPUZZLE_2X2).unwrap();
    let solved = cube2_def.new_solved_state();
    let ranker = OrbitRanker::new(&cube2_def, 0, OrbitCoordinate::Permutation).unwrap();
    let table = PruningTable::generate(&cube2_def, &solved, 7, 289_896, ranker).unwrap();
    let scrambled = apply_move_indices(&cube2_def, &solved, &[0, 3, 6, 1, 5]);
    let solver = IdaStarSolver::new(&cube2_def, &table);

    c.bench_function("pruning/search_five_moves", |bch| {
        bch.iter(|| solver.search(black_box(&scrambled), 0, 8).unwrap());
    });
}

criterion_group!(pruning, bench_pruning_table, bench_search);
criterion_main!(pruning);
