//! The puzzle generator: random complete grid, constraint
//! carving, givens, uniqueness repair, and greedy minimization.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};

use crate::puzzle::{
    Cage, Cell, Grid, Inequality, InequalityKind, Puzzle, PuzzleType, Solution, Uniqueness, N,
};
use crate::solver::solve;

/// Tuning knobs for puzzle generation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub puzzle_type: PuzzleType,
    pub min_cages: usize,
    pub max_cages: usize,
    pub min_cage_size: usize,
    pub max_cage_size: usize,
    pub min_inequalities: usize,
    pub max_inequalities: usize,
    pub min_givens: usize,
    pub max_givens: usize,
    /// `0` means time-based (unseeded).
    pub seed: u64,
    pub ensure_unique_solution: bool,
    pub fill_all_cells: bool,
    /// 0-100; controls minimization aggressiveness.
    pub difficulty: u8,
    /// How many random `(cell, value)` givens seed a fresh complete
    /// grid before handing the rest to the solver — a diversity knob,
    /// not a literal to preserve.
    pub random_preseed_count: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            puzzle_type: PuzzleType::Mixed,
            min_cages: 15,
            max_cages: 25,
            min_cage_size: 2,
            max_cage_size: 5,
            min_inequalities: 20,
            max_inequalities: 40,
            min_givens: 0,
            max_givens: 0,
            seed: 0,
            ensure_unique_solution: true,
            fill_all_cells: false,
            difficulty: 50,
            random_preseed_count: 11,
        }
    }
}

const MAX_CAGE_EXPANSION_ATTEMPTS: usize = 100;
const MAX_REPAIR_RETRIES: usize = 10;

fn make_rng(seed: u64) -> StdRng {
    if seed == 0 {
        StdRng::from_os_rng()
    } else {
        StdRng::seed_from_u64(seed)
    }
}

fn wants_cages(t: PuzzleType) -> bool {
    matches!(t, PuzzleType::Killer | PuzzleType::Mixed)
}

fn wants_inequalities(t: PuzzleType) -> bool {
    matches!(t, PuzzleType::Inequality | PuzzleType::Mixed)
}

/// Picks a random complete grid by pre-seeding a handful of mutually
/// consistent `(cell, value)` givens and letting the solver fill in
/// the rest. Biases the otherwise-deterministic CDCL search so that
/// different seeds yield different complete grids.
fn random_complete_grid(config: &GeneratorConfig, rng: &mut StdRng) -> Grid {
    let mut preseed = Grid::empty();
    let mut placed: Vec<(Cell, u8)> = Vec::new();

    let mut attempts = 0;
    while placed.len() < config.random_preseed_count && attempts < config.random_preseed_count * 20 {
        attempts += 1;
        let row = rng.random_range(0..N);
        let col = rng.random_range(0..N);
        let cell = Cell::new(row, col);
        if !preseed.is_empty_cell(cell) {
            continue;
        }
        let value = rng.random_range(1..=9u8);
        let conflicts = placed.iter().any(|&(other, v)| {
            v == value && (other.row == row || other.col == col || other.box_index() == cell.box_index())
        });
        if conflicts {
            continue;
        }
        preseed.set(cell, value);
        placed.push((cell, value));
    }

    let puzzle = Puzzle::standard(preseed);
    let (solution, _) = solve(&puzzle, false);
    assert!(
        solution.solved,
        "encoding bug: mutually-consistent pre-seed givens produced an unsatisfiable puzzle"
    );
    solution.grid
}

fn four_connected_neighbors(cell: Cell) -> Vec<Cell> {
    let mut out = Vec::with_capacity(4);
    if cell.row > 0 {
        out.push(Cell::new(cell.row - 1, cell.col));
    }
    if cell.row + 1 < N {
        out.push(Cell::new(cell.row + 1, cell.col));
    }
    if cell.col > 0 {
        out.push(Cell::new(cell.row, cell.col - 1));
    }
    if cell.col + 1 < N {
        out.push(Cell::new(cell.row, cell.col + 1));
    }
    out
}

/// Grows one cage from a random seed cell, 4-connected, preserving
/// intra-cage value distinctness.
fn grow_cage(
    full_grid: &Grid,
    used: &HashSet<Cell>,
    target_size: usize,
    rng: &mut StdRng,
) -> Option<Vec<Cell>> {
    let available: Vec<Cell> = Grid::cells().filter(|c| !used.contains(c)).collect();
    let seed = *available.choose(rng)?;

    let mut cage_cells = vec![seed];
    let mut cage_values: HashSet<u8> = HashSet::new();
    cage_values.insert(full_grid.get(seed));

    for _ in 0..MAX_CAGE_EXPANSION_ATTEMPTS {
        if cage_cells.len() >= target_size {
            break;
        }
        let candidates: Vec<Cell> = cage_cells
            .iter()
            .flat_map(|&c| four_connected_neighbors(c))
            .filter(|c| !used.contains(c) && !cage_cells.contains(c))
            .filter(|c| !cage_values.contains(&full_grid.get(*c)))
            .collect();
        let Some(&next) = candidates.choose(rng) else {
            break; // no eligible neighbor: stop growth early
        };
        cage_values.insert(full_grid.get(next));
        cage_cells.push(next);
    }

    Some(cage_cells)
}

/// Carves cages from the complete grid until the target count is hit
/// (or, with `fill_all_cells`, until every cell is covered).
fn carve_cages(full_grid: &Grid, config: &GeneratorConfig, rng: &mut StdRng) -> Vec<Cage> {
    let target_count = rng.random_range(config.min_cages..=config.max_cages.max(config.min_cages));
    let mut used: HashSet<Cell> = HashSet::new();
    let mut cages = Vec::new();
    let max_seed_attempts = (target_count + N * N) * 4;

    for _ in 0..max_seed_attempts {
        let need_more = if config.fill_all_cells {
            used.len() < N * N
        } else {
            cages.len() < target_count
        };
        if !need_more {
            break;
        }
        let target_size = rng.random_range(config.min_cage_size..=config.max_cage_size.max(config.min_cage_size));
        let Some(cells) = grow_cage(full_grid, &used, target_size, rng) else {
            break; // no more cells available to seed a cage
        };

        if cells.len() < 2 {
            // A cage this small is only ever acceptable as part of the
            // final coverage pass below; leave the seed cell unused and
            // try a different seed.
            continue;
        }

        let sum: u32 = cells.iter().map(|&c| full_grid.get(c) as u32).sum();
        for &c in &cells {
            used.insert(c);
        }
        cages.push(Cage::new(cells, sum));
    }

    if config.fill_all_cells {
        // Prefer not to emit single-cell cages except to complete
        // coverage. Any cells still uncovered after the main loop
        // become singleton cages here.
        for cell in Grid::cells() {
            if !used.contains(&cell) {
                let value = full_grid.get(cell) as u32;
                cages.push(Cage::new(vec![cell], value));
                used.insert(cell);
            }
        }
    }

    cages
}

/// All 4-connected adjacent cell pairs, each oriented once.
fn adjacent_pairs() -> Vec<(Cell, Cell)> {
    let mut pairs = Vec::new();
    for r in 0..N {
        for c in 0..N {
            if c + 1 < N {
                pairs.push((Cell::new(r, c), Cell::new(r, c + 1)));
            }
            if r + 1 < N {
                pairs.push((Cell::new(r, c), Cell::new(r + 1, c)));
            }
        }
    }
    pairs
}

/// Carves up to `count` inequalities from shuffled adjacent pairs whose
/// complete-grid values differ, skipping any pair already present in
/// `existing`.
fn carve_inequalities(
    full_grid: &Grid,
    count: usize,
    existing: &HashSet<(Cell, Cell)>,
    rng: &mut StdRng,
) -> Vec<Inequality> {
    let mut pairs = adjacent_pairs();
    pairs.shuffle(rng);

    let mut out = Vec::new();
    for (a, b) in pairs {
        if out.len() >= count {
            break;
        }
        if existing.contains(&(a, b)) || existing.contains(&(b, a)) {
            continue;
        }
        let va = full_grid.get(a);
        let vb = full_grid.get(b);
        if va == vb {
            continue;
        }
        let kind = if va > vb { InequalityKind::Gt } else { InequalityKind::Lt };
        out.push(Inequality::new(a, b, kind));
    }
    out
}

fn ineq_pair_set(ineqs: &[Inequality]) -> HashSet<(Cell, Cell)> {
    ineqs.iter().map(|i| (i.a, i.b)).collect()
}

/// Adds up to `count` additional givens chosen from the currently
/// empty cells of `puzzle.grid`. Returns the number actually added.
fn add_random_givens(
    puzzle: &mut Puzzle,
    full_grid: &Grid,
    count: usize,
    rng: &mut StdRng,
) -> usize {
    let mut empty: Vec<Cell> = Grid::cells().filter(|&c| puzzle.grid.is_empty_cell(c)).collect();
    empty.shuffle(rng);
    let n = count.min(empty.len());
    for &cell in &empty[..n] {
        puzzle.grid.set(cell, full_grid.get(cell));
    }
    n
}

/// Produces a variant puzzle and its complete solution, end to end.
pub fn generate(config: &GeneratorConfig) -> (Puzzle, Solution) {
    let mut rng = make_rng(config.seed);
    let full_grid = random_complete_grid(config, &mut rng);

    let mut puzzle = Puzzle::new(Grid::empty(), Vec::new(), Vec::new());

    if wants_cages(config.puzzle_type) {
        puzzle.cages = carve_cages(&full_grid, config, &mut rng);
    }

    if wants_inequalities(config.puzzle_type) {
        let count = rng.random_range(config.min_inequalities..=config.max_inequalities.max(config.min_inequalities));
        puzzle.inequalities = carve_inequalities(&full_grid, count, &HashSet::new(), &mut rng);
    }

    let given_count = rng.random_range(config.min_givens..=config.max_givens.max(config.min_givens));
    add_random_givens(&mut puzzle, &full_grid, given_count, &mut rng);

    if config.ensure_unique_solution {
        repair_uniqueness(&mut puzzle, &full_grid, config, &mut rng);
    }

    let mut solution = Solution {
        grid: full_grid,
        solved: true,
        uniqueness: if config.ensure_unique_solution {
            Uniqueness::Unique
        } else {
            Uniqueness::NotChecked
        },
        solve_time_ms: 0.0,
        message: None,
    };

    minimize(&mut puzzle, config, &mut rng);

    // Re-confirm uniqueness after minimization; the loop only ever
    // keeps a removal when the re-solve proved uniqueness held, so
    // this is expected to already be Unique when requested.
    if config.ensure_unique_solution {
        let (check, _) = solve(&puzzle, true);
        solution.uniqueness = check.uniqueness;
        assert_eq!(
            solution.uniqueness,
            Uniqueness::Unique,
            "encoding bug: minimization left a non-unique puzzle"
        );
    }

    (puzzle, solution)
}

/// Uniqueness repair: while `solve(puzzle, true)` is
/// SAT-and-not-unique, add more constraints, with a bounded number of
/// retries, then fall back to adding givens one at a time. Guaranteed
/// to terminate: once all 81 cells are given the puzzle is trivially
/// unique.
fn repair_uniqueness(
    puzzle: &mut Puzzle,
    full_grid: &Grid,
    config: &GeneratorConfig,
    rng: &mut StdRng,
) {
    let mut retries = 0;
    loop {
        let (result, _) = solve(puzzle, true);
        match result.uniqueness {
            Uniqueness::Unique => return,
            Uniqueness::NotChecked => unreachable!("solve(.., true) always sets uniqueness"),
            Uniqueness::NotUnique => {}
        }
        if !result.solved {
            // An UNSAT puzzle during repair means prior givens/cages
            // conflict; this cannot happen by construction since every
            // carved constraint and given is read off the same
            // complete grid.
            unreachable!("encoding bug: generator produced an unsatisfiable puzzle mid-repair");
        }

        if retries < MAX_REPAIR_RETRIES {
            retries += 1;
            if wants_inequalities(config.puzzle_type) {
                let existing = ineq_pair_set(&puzzle.inequalities);
                let added = carve_inequalities(full_grid, 5, &existing, rng);
                if !added.is_empty() {
                    puzzle.inequalities.extend(added);
                    continue;
                }
            }
            add_random_givens(puzzle, full_grid, 3, rng);
        } else {
            let added = add_random_givens(puzzle, full_grid, 1, rng);
            if added == 0 {
                // All 81 cells are given: trivially unique, loop must
                // exit on the next solve.
            }
        }
    }
}

/// Fraction-of-candidates removal budget for one minimization category:
/// at least one attempt whenever the category is non-empty.
fn removal_attempts(difficulty: u8, candidates: usize) -> usize {
    if candidates == 0 {
        return 0;
    }
    let fraction = difficulty as f64 / 100.0;
    ((fraction * candidates as f64).round() as usize).clamp(1, candidates)
}

/// Greedy minimization under a uniqueness oracle:
/// inequalities first, then cages, then givens.
fn minimize(puzzle: &mut Puzzle, config: &GeneratorConfig, rng: &mut StdRng) {
    minimize_inequalities(puzzle, config, rng);
    minimize_cages(puzzle, config, rng);
    minimize_givens(puzzle, config, rng);
}

fn still_unique(puzzle: &Puzzle) -> bool {
    let (result, _) = solve(puzzle, true);
    result.solved && result.uniqueness == Uniqueness::Unique
}

fn minimize_inequalities(puzzle: &mut Puzzle, config: &GeneratorConfig, rng: &mut StdRng) {
    let mut order: Vec<usize> = (0..puzzle.inequalities.len()).collect();
    order.shuffle(rng);
    let attempts = removal_attempts(config.difficulty, order.len());

    let mut removed: HashSet<usize> = HashSet::new();
    for &idx in order.iter().take(attempts) {
        let without: Vec<Inequality> = puzzle
            .inequalities
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != idx && !removed.contains(&i))
            .map(|(_, &ineq)| ineq)
            .collect();
        let candidate = Puzzle::new(puzzle.grid.clone(), puzzle.cages.clone(), without);
        if still_unique(&candidate) {
            removed.insert(idx);
        }
    }

    if !removed.is_empty() {
        puzzle.inequalities = puzzle
            .inequalities
            .iter()
            .enumerate()
            .filter(|&(i, _)| !removed.contains(&i))
            .map(|(_, &ineq)| ineq)
            .collect();
    }
}

fn minimize_cages(puzzle: &mut Puzzle, config: &GeneratorConfig, rng: &mut StdRng) {
    let mut order: Vec<usize> = (0..puzzle.cages.len()).collect();
    order.shuffle(rng);
    let attempts = removal_attempts(config.difficulty, order.len());

    let mut removed: HashSet<usize> = HashSet::new();
    for &idx in order.iter().take(attempts) {
        let without: Vec<Cage> = puzzle
            .cages
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != idx && !removed.contains(&i))
            .map(|(_, cage)| cage.clone())
            .collect();
        let candidate = Puzzle::new(puzzle.grid.clone(), without, puzzle.inequalities.clone());
        if still_unique(&candidate) {
            removed.insert(idx);
        }
    }

    if !removed.is_empty() {
        puzzle.cages = puzzle
            .cages
            .iter()
            .enumerate()
            .filter(|&(i, _)| !removed.contains(&i))
            .map(|(_, cage)| cage.clone())
            .collect();
    }
}

fn minimize_givens(puzzle: &mut Puzzle, config: &GeneratorConfig, rng: &mut StdRng) {
    let mut given_cells: Vec<Cell> = Grid::cells().filter(|&c| !puzzle.grid.is_empty_cell(c)).collect();
    given_cells.shuffle(rng);
    let attempts = removal_attempts(config.difficulty, given_cells.len());

    for &cell in given_cells.iter().take(attempts) {
        let original = puzzle.grid.get(cell);
        puzzle.grid.set(cell, 0);
        if !still_unique(puzzle) {
            puzzle.grid.set(cell, original);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::verify;

    /// `true` iff `cells` forms a single 4-connected component. Checks
    /// the generator's cage-growth invariant (spec §8).
    fn is_four_connected(cells: &[Cell]) -> bool {
        if cells.is_empty() {
            return true;
        }
        let set: HashSet<Cell> = cells.iter().copied().collect();
        let mut seen: HashSet<Cell> = HashSet::new();
        let mut stack = vec![cells[0]];
        seen.insert(cells[0]);
        while let Some(cell) = stack.pop() {
            for neighbor in four_connected_neighbors(cell) {
                if set.contains(&neighbor) && seen.insert(neighbor) {
                    stack.push(neighbor);
                }
            }
        }
        seen.len() == cells.len()
    }

    #[test]
    fn generated_standard_puzzle_verifies_and_is_unique() {
        let config = GeneratorConfig {
            puzzle_type: PuzzleType::Standard,
            seed: 42,
            min_givens: 30,
            max_givens: 35,
            ..Default::default()
        };
        let (puzzle, solution) = generate(&config);
        assert!(verify(&puzzle, &solution.grid));
        assert_eq!(solution.uniqueness, Uniqueness::Unique);
    }

    #[test]
    fn generated_killer_puzzle_verifies() {
        let config = GeneratorConfig {
            puzzle_type: PuzzleType::Killer,
            seed: 7,
            min_cages: 10,
            max_cages: 12,
            min_cage_size: 2,
            max_cage_size: 3,
            min_givens: 10,
            max_givens: 10,
            ..Default::default()
        };
        let (puzzle, solution) = generate(&config);
        assert!(verify(&puzzle, &solution.grid));
        assert!(!puzzle.cages.is_empty());
    }

    #[test]
    fn generated_inequality_puzzle_verifies() {
        let config = GeneratorConfig {
            puzzle_type: PuzzleType::Inequality,
            seed: 99,
            min_inequalities: 15,
            max_inequalities: 18,
            min_givens: 15,
            max_givens: 15,
            ..Default::default()
        };
        let (puzzle, solution) = generate(&config);
        assert!(verify(&puzzle, &solution.grid));
        assert!(!puzzle.inequalities.is_empty());
    }

    #[test]
    fn seed_determinism_reproduces_solution_and_counts() {
        let config = GeneratorConfig {
            puzzle_type: PuzzleType::Mixed,
            seed: 1234,
            min_cages: 8,
            max_cages: 8,
            min_inequalities: 10,
            max_inequalities: 10,
            min_givens: 5,
            max_givens: 5,
            ..Default::default()
        };
        let (p1, s1) = generate(&config);
        let (p2, s2) = generate(&config);
        assert_eq!(s1.grid, s2.grid);
        assert_eq!(p1.cages.len(), p2.cages.len());
        assert_eq!(p1.inequalities.len(), p2.inequalities.len());
    }

    #[test]
    fn fill_all_cells_covers_every_cell_with_connected_cages() {
        let config = GeneratorConfig {
            puzzle_type: PuzzleType::Killer,
            seed: 5,
            fill_all_cells: true,
            min_cages: 10,
            max_cages: 15,
            ..Default::default()
        };
        let (puzzle, _) = generate(&config);
        let covered: HashSet<Cell> = puzzle.cages.iter().flat_map(|c| c.cells.clone()).collect();
        assert_eq!(covered.len(), N * N);
    }

    #[test]
    fn generated_cages_are_four_connected_when_not_filling_every_cell() {
        let config = GeneratorConfig {
            puzzle_type: PuzzleType::Mixed,
            seed: 11,
            fill_all_cells: false,
            min_cages: 15,
            max_cages: 20,
            min_cage_size: 2,
            max_cage_size: 5,
            ..Default::default()
        };
        let (puzzle, _) = generate(&config);
        assert!(!puzzle.cages.is_empty());
        for cage in &puzzle.cages {
            assert!(
                is_four_connected(&cage.cells),
                "cage {:?} is not 4-connected",
                cage.cells
            );
        }
    }
}
