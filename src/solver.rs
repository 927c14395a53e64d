//! The encoder/solver driver: build the formula, invoke
//! the SAT solver, decode the model, and optionally re-solve under a
//! blocking clause to check uniqueness.

use std::time::Instant;

use varisat::{ExtendFormula, Lit, Solver};

use crate::encode::{build_formula, var, var_to_coords, NUM_PRIMARY_VARS};
use crate::puzzle::{Grid, Puzzle, Solution, Uniqueness, N};

/// Variable/clause counts for a solve call, mirroring the `variables`
/// / `clauses` fields of the programmatic JSON result.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolveStats {
    pub variables: usize,
    pub clauses: usize,
}

fn clauses_to_varisat<'a>(solver: &mut Solver<'a>, clauses: &[Vec<isize>]) {
    for clause in clauses {
        let lits: Vec<Lit> = clause.iter().map(|&l| Lit::from_dimacs(l)).collect();
        solver.add_clause(&lits);
    }
}

/// Decode a model into a 9x9 grid. Fatal if more
/// than one value is asserted true for the same cell — that can only
/// happen if the encoding itself is broken.
fn decode_model(model: &[Lit]) -> Grid {
    let mut grid = Grid::empty();
    let mut seen = [[false; N]; N];
    for &lit in model {
        if !lit.is_positive() {
            continue;
        }
        let dimacs = lit.var().to_dimacs() as usize;
        if dimacs > NUM_PRIMARY_VARS {
            continue; // auxiliary variable, not part of the grid
        }
        let (r, c, v) = var_to_coords(dimacs);
        if seen[r][c] {
            panic!(
                "encoding bug: cell ({r}, {c}) has more than one value asserted true in the model"
            );
        }
        seen[r][c] = true;
        grid.0[r][c] = v;
    }
    grid
}

/// Outcome of one SAT invocation: a decoded model, a clean UNSAT, or an
/// internal solver failure (spec §7 treats these as distinct error
/// kinds with distinct diagnostics).
enum SatOutcome {
    Sat(Grid, Vec<Lit>),
    Unsat,
    SolverError(String),
}

/// A single SAT invocation over a fixed clause set. Internal helper
/// shared by the two solve phases (`solve()` itself and the uniqueness
/// re-solve).
fn run_sat(clauses: &[Vec<isize>]) -> SatOutcome {
    let mut solver = Solver::new();
    clauses_to_varisat(&mut solver, clauses);
    match solver.solve() {
        Ok(true) => {
            let model = solver.model().expect("SAT result must carry a model");
            SatOutcome::Sat(decode_model(&model), model)
        }
        Ok(false) => SatOutcome::Unsat,
        Err(e) => {
            let message = e.to_string();
            eprintln!("sat solver error: {message}");
            SatOutcome::SolverError(message)
        }
    }
}

/// Build a blocking clause that forbids exactly the model just found:
/// `OR_{(r,c)} ¬var(r,c,solution[r][c])`.
fn blocking_clause(grid: &Grid) -> Vec<isize> {
    let mut clause = Vec::with_capacity(N * N);
    for r in 0..N {
        for c in 0..N {
            let v = grid.0[r][c];
            if v != 0 {
                clause.push(-var(r, c, v));
            }
        }
    }
    clause
}

/// Solve a puzzle. `check_uniqueness` drives the extra blocking-clause
/// re-solve.
pub fn solve(puzzle: &Puzzle, check_uniqueness: bool) -> (Solution, SolveStats) {
    let (mut clauses, aux_vars) = build_formula(puzzle);
    let stats = SolveStats {
        variables: NUM_PRIMARY_VARS + aux_vars,
        clauses: clauses.len(),
    };

    let start = Instant::now();
    let grid = match run_sat(&clauses) {
        SatOutcome::Sat(grid, _model) => grid,
        SatOutcome::Unsat => {
            let elapsed = start.elapsed().as_secs_f64() * 1000.0;
            let mut solution = Solution::unsolved("no solution exists");
            solution.solve_time_ms = elapsed;
            return (solution, stats);
        }
        SatOutcome::SolverError(message) => {
            let elapsed = start.elapsed().as_secs_f64() * 1000.0;
            let mut solution = Solution::unsolved(format!("sat solver error: {message}"));
            solution.solve_time_ms = elapsed;
            return (solution, stats);
        }
    };

    if !check_uniqueness {
        let elapsed = start.elapsed().as_secs_f64() * 1000.0;
        return (
            Solution {
                grid,
                solved: true,
                uniqueness: Uniqueness::NotChecked,
                solve_time_ms: elapsed,
                message: None,
            },
            stats,
        );
    }

    clauses.push(blocking_clause(&grid));
    let (uniqueness, message) = match run_sat(&clauses) {
        SatOutcome::Sat(..) => (Uniqueness::NotUnique, None),
        SatOutcome::Unsat => (Uniqueness::Unique, None),
        SatOutcome::SolverError(err) => {
            (Uniqueness::NotChecked, Some(format!("sat solver error during uniqueness check: {err}")))
        }
    };
    let elapsed = start.elapsed().as_secs_f64() * 1000.0;

    (
        Solution {
            grid,
            solved: true,
            uniqueness,
            solve_time_ms: elapsed,
            message,
        },
        stats,
    )
}
