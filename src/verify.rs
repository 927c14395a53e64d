//! The verifier: cross-checks a candidate grid against a
//! puzzle's constraints without invoking SAT. Used by tests and as a
//! defensive post-check in the driver; must never be disabled in
//! release builds.

use std::collections::HashSet;

use crate::puzzle::{Grid, Puzzle, BOX_SIZE, N};

fn is_permutation_of_one_to_nine(values: &[u8]) -> bool {
    let set: HashSet<u8> = values.iter().copied().collect();
    set.len() == N && values.iter().all(|&v| (1..=9).contains(&v))
}

/// `true` iff `solution` is a valid completion of `puzzle`.
pub fn verify(puzzle: &Puzzle, solution: &Grid) -> bool {
    // Every cell is in [1,9].
    for r in 0..N {
        for c in 0..N {
            let v = solution.0[r][c];
            if !(1..=9).contains(&v) {
                return false;
            }
        }
    }

    // Each row is a permutation of 1..9.
    for r in 0..N {
        if !is_permutation_of_one_to_nine(&solution.0[r]) {
            return false;
        }
    }

    // Each column is a permutation of 1..9.
    for c in 0..N {
        let col: Vec<u8> = (0..N).map(|r| solution.0[r][c]).collect();
        if !is_permutation_of_one_to_nine(&col) {
            return false;
        }
    }

    // Each 3x3 box is a permutation of 1..9.
    for br in 0..BOX_SIZE {
        for bc in 0..BOX_SIZE {
            let mut box_values = Vec::with_capacity(N);
            for ro in 0..BOX_SIZE {
                for co in 0..BOX_SIZE {
                    box_values.push(solution.0[br * BOX_SIZE + ro][bc * BOX_SIZE + co]);
                }
            }
            if !is_permutation_of_one_to_nine(&box_values) {
                return false;
            }
        }
    }

    // Every given is preserved.
    for r in 0..N {
        for c in 0..N {
            let given = puzzle.grid.0[r][c];
            if given != 0 && solution.0[r][c] != given {
                return false;
            }
        }
    }

    // Every cage: distinct values summing to target.
    for cage in &puzzle.cages {
        let values: Vec<u8> = cage.cells.iter().map(|&cell| solution.get(cell)).collect();
        let distinct: HashSet<u8> = values.iter().copied().collect();
        if distinct.len() != values.len() {
            return false;
        }
        let sum: u32 = values.iter().map(|&v| v as u32).sum();
        if sum != cage.sum {
            return false;
        }
    }

    // Every inequality: the ordering holds.
    for ineq in &puzzle.inequalities {
        let a = solution.get(ineq.a);
        let b = solution.get(ineq.b);
        let holds = match ineq.kind {
            crate::puzzle::InequalityKind::Gt => a > b,
            crate::puzzle::InequalityKind::Lt => a < b,
        };
        if !holds {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::{Cage, Cell, InequalityKind};
    use crate::solver::solve;

    fn solved_grid(puzzle: &Puzzle) -> Grid {
        let (solution, _) = solve(puzzle, false);
        assert!(solution.solved);
        solution.grid
    }

    #[test]
    fn verifier_accepts_solver_output_for_standard_puzzle() {
        let puzzle = Puzzle::standard(Grid::empty());
        let grid = solved_grid(&puzzle);
        assert!(verify(&puzzle, &grid));
    }

    #[test]
    fn verifier_rejects_broken_row() {
        let puzzle = Puzzle::standard(Grid::empty());
        let mut grid = solved_grid(&puzzle);
        grid.0[0][0] = grid.0[0][2]; // introduces a duplicate in row 0
        assert!(!verify(&puzzle, &grid));
    }

    #[test]
    fn verifier_rejects_given_violation() {
        let mut given = Grid::empty();
        given.set(Cell::new(0, 0), 7);
        let puzzle = Puzzle::standard(given);
        let mut grid = solved_grid(&puzzle);
        grid.0[0][0] = if grid.0[0][0] == 9 { 8 } else { 9 };
        assert!(!verify(&puzzle, &grid));
    }

    #[test]
    fn verifier_checks_cage_sum_and_distinctness() {
        let cages = vec![Cage::new(vec![Cell::new(0, 0), Cell::new(0, 1)], 3)];
        let puzzle = Puzzle::new(Grid::empty(), cages, vec![]);
        let grid = solved_grid(&puzzle);
        assert!(verify(&puzzle, &grid));
        let sum: u32 = grid.0[0][0] as u32 + grid.0[0][1] as u32;
        assert_eq!(sum, 3);
    }

    #[test]
    fn verifier_checks_inequality() {
        let ineqs = vec![crate::puzzle::Inequality::new(
            Cell::new(0, 0),
            Cell::new(0, 1),
            InequalityKind::Gt,
        )];
        let puzzle = Puzzle::new(Grid::empty(), vec![], ineqs);
        let grid = solved_grid(&puzzle);
        assert!(verify(&puzzle, &grid));
        assert!(grid.get(Cell::new(0, 0)) > grid.get(Cell::new(0, 1)));
    }
}
