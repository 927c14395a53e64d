//! A SAT-based Sudoku solver and generator, supporting standard,
//! Killer (cage), Inequality, and Mixed puzzles.
//!
//! The puzzle is reduced to a Boolean Satisfiability instance (see
//! [`encode`]) and handed to a CDCL solver (`varisat`); the driver in
//! [`solver`] decodes the model back into a grid and, on request,
//! performs a second solve under a blocking clause to determine
//! whether the solution is unique.

pub mod encode;
pub mod error;
pub mod format;
pub mod generator;
pub mod puzzle;
pub mod solver;
pub mod verify;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::PuzzleResult;

/// Largest variable index referenced by any clause; used for the
/// DIMACS header when exporting raw clauses.
fn num_vars(clauses: &[Vec<isize>]) -> usize {
    clauses
        .iter()
        .flat_map(|clause| clause.iter())
        .map(|&lit| lit.unsigned_abs())
        .max()
        .unwrap_or(0)
}

/// Writes a DIMACS CNF file for a clause set. Kept from this crate's
/// SAT-puzzle lineage as a debugging/interop aid behind the CLI's
/// `--cnf-out` flag (see SPEC_FULL.md's "supplemented features").
pub fn write_clauses<P: AsRef<Path>>(output: P, clauses: &[Vec<isize>]) -> PuzzleResult<()> {
    let n = num_vars(clauses);
    let file = File::create(&output)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "p cnf {n} {}", clauses.len())?;
    for clause in clauses {
        for literal in clause {
            write!(writer, "{literal} ")?;
        }
        writeln!(writer, "0")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn num_vars_tracks_largest_magnitude() {
        assert_eq!(num_vars(&[vec![1, -2], vec![3, -729]]), 729);
        assert_eq!(num_vars(&[]), 0);
    }
}

/// Whole-pipeline tests: generate, write/parse through the text format,
/// solve, and verify, end to end.
#[cfg(test)]
mod pipeline_tests {
    use crate::format;
    use crate::generator::{generate, GeneratorConfig};
    use crate::puzzle::{PuzzleType, Uniqueness};
    use crate::solver::solve;
    use crate::verify::verify;

    #[test]
    fn a_generated_mixed_puzzle_survives_a_text_format_round_trip() {
        let config = GeneratorConfig {
            puzzle_type: PuzzleType::Mixed,
            seed: 2026,
            min_cages: 6,
            max_cages: 8,
            min_inequalities: 8,
            max_inequalities: 10,
            min_givens: 6,
            max_givens: 6,
            ..GeneratorConfig::default()
        };
        let (puzzle, solution) = generate(&config);

        let text = format::write(&puzzle, Some(&solution.grid));
        let parsed = format::parse(&text).expect("round-tripped text must re-parse");
        assert_eq!(parsed, puzzle);

        let (resolved, _) = solve(&parsed, true);
        assert!(resolved.solved);
        assert_eq!(resolved.uniqueness, Uniqueness::Unique);
        assert!(verify(&parsed, &resolved.grid));
    }

    #[test]
    fn the_81_char_shorthand_round_trips_a_standard_puzzle() {
        let config = GeneratorConfig {
            puzzle_type: PuzzleType::Standard,
            seed: 7,
            min_givens: 28,
            max_givens: 28,
            ..GeneratorConfig::default()
        };
        let (puzzle, _) = generate(&config);

        let shorthand: String = puzzle
            .grid
            .0
            .iter()
            .flat_map(|row| row.iter())
            .map(|&v| if v == 0 { '.' } else { (b'0' + v) as char })
            .collect();
        let parsed = format::parse(&shorthand).unwrap();
        assert_eq!(parsed.grid, puzzle.grid);
        assert!(parsed.cages.is_empty());
        assert!(parsed.inequalities.is_empty());
    }

    #[test]
    fn same_seed_and_config_yield_a_verifiably_equal_puzzle() {
        let config = GeneratorConfig {
            puzzle_type: PuzzleType::Killer,
            seed: 404,
            min_cages: 5,
            max_cages: 5,
            min_givens: 10,
            max_givens: 10,
            ..GeneratorConfig::default()
        };
        let (first, first_solution) = generate(&config);
        let (second, _) = generate(&config);
        assert_eq!(first, second);
        assert!(verify(&first, &first_solution.grid));
    }
}
