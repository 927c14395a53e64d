use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use sudoku_sat::encode::build_formula;
use sudoku_sat::format;
use sudoku_sat::generator::{generate, GeneratorConfig};
use sudoku_sat::puzzle::{PuzzleType, Uniqueness};
use sudoku_sat::solver::solve;
use sudoku_sat::verify::verify;

#[derive(Parser)]
#[command(author, version, about = "A SAT-based Sudoku solver and generator", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a puzzle read from a file, or from an inline string.
    Solve {
        /// Path to a puzzle file (custom text format, or an 81-char string).
        file: Option<PathBuf>,
        /// An inline 81-character puzzle string, instead of a file.
        #[arg(long)]
        string: Option<String>,
        /// Perform the extra blocking-clause re-solve to check uniqueness.
        #[arg(short, long)]
        unique: bool,
        /// Write the raw CNF clauses to PATH (debug aid).
        #[arg(long, value_name = "PATH")]
        cnf_out: Option<PathBuf>,
        /// Emit the programmatic JSON result instead of a pretty board.
        #[arg(long)]
        json: bool,
    },
    /// Generate a new puzzle of the requested variant.
    Generate {
        #[arg(long, value_enum, default_value_t = VariantArg::Mixed)]
        r#type: VariantArg,
        #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], default_values_t = [15, 25])]
        cages: Vec<usize>,
        #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], default_values_t = [20, 40])]
        ineq: Vec<usize>,
        #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], default_values_t = [0, 0])]
        givens: Vec<usize>,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Where to write the puzzle (default: stdout).
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Also write the complete solution as a SOLUTION section.
        #[arg(long)]
        with_solution: bool,
        /// Cages must cover every cell.
        #[arg(long)]
        fill_all: bool,
        /// Skip the uniqueness repair/guarantee.
        #[arg(long)]
        no_unique: bool,
        /// Minimization aggressiveness, 0-100.
        #[arg(long, default_value_t = 50)]
        difficulty: u8,
        /// Write the raw CNF clauses of the final puzzle to PATH.
        #[arg(long, value_name = "PATH")]
        cnf_out: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Copy, Clone, Debug)]
enum VariantArg {
    Standard,
    Killer,
    Inequality,
    Mixed,
}

impl From<VariantArg> for PuzzleType {
    fn from(v: VariantArg) -> Self {
        match v {
            VariantArg::Standard => PuzzleType::Standard,
            VariantArg::Killer => PuzzleType::Killer,
            VariantArg::Inequality => PuzzleType::Inequality,
            VariantArg::Mixed => PuzzleType::Mixed,
        }
    }
}

/// The programmatic/JSON solve result.
#[derive(Serialize)]
struct SolveResultJson {
    solved: bool,
    #[serde(rename = "solveTimeMs")]
    solve_time_ms: f64,
    variables: usize,
    clauses: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    uniqueness: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    grid: Option<Vec<Vec<u8>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn uniqueness_str(u: Uniqueness) -> Option<&'static str> {
    match u {
        Uniqueness::NotChecked => Some("unknown"),
        Uniqueness::Unique => Some("unique"),
        Uniqueness::NotUnique => Some("not_unique"),
    }
}

fn run_solve(
    file: Option<PathBuf>,
    string: Option<String>,
    unique: bool,
    cnf_out: Option<PathBuf>,
    json: bool,
) -> Result<bool> {
    let text = match (string, file) {
        (Some(s), _) => s,
        (None, Some(path)) => fs::read_to_string(&path)
            .with_context(|| format!("reading puzzle file '{}'", path.display()))?,
        (None, None) => bail!("provide a puzzle file or --string \"<81 chars>\""),
    };

    let puzzle = format::parse(&text)?;
    eprintln!("Loaded a {} puzzle", puzzle.puzzle_type());

    if let Some(path) = &cnf_out {
        let (clauses, _) = build_formula(&puzzle);
        sudoku_sat::write_clauses(path, &clauses)?;
        eprintln!("Wrote {} clauses to '{}'", clauses.len(), path.display());
    }

    let (solution, stats) = solve(&puzzle, unique);
    eprintln!(
        "variables={} clauses={} solve_time_ms={:.3}",
        stats.variables, stats.clauses, solution.solve_time_ms
    );

    if solution.solved {
        assert!(
            verify(&puzzle, &solution.grid),
            "encoding bug: a decoded model failed verification"
        );
    }

    if json {
        let result = SolveResultJson {
            solved: solution.solved,
            solve_time_ms: solution.solve_time_ms,
            variables: stats.variables,
            clauses: stats.clauses,
            uniqueness: if unique { uniqueness_str(solution.uniqueness) } else { None },
            grid: solution.solved.then(|| solution.grid.0.iter().map(|r| r.to_vec()).collect()),
            error: solution.message.clone(),
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if solution.solved {
        println!("{}", solution.grid);
        if unique {
            println!("uniqueness: {:?}", solution.uniqueness);
        }
    } else {
        println!("{}", solution.message.as_deref().unwrap_or("no solution exists"));
    }

    Ok(solution.solved)
}

fn run_generate(
    variant: VariantArg,
    cages: Vec<usize>,
    ineq: Vec<usize>,
    givens: Vec<usize>,
    seed: u64,
    output: Option<PathBuf>,
    with_solution: bool,
    fill_all: bool,
    no_unique: bool,
    difficulty: u8,
    cnf_out: Option<PathBuf>,
) -> Result<()> {
    let config = GeneratorConfig {
        puzzle_type: variant.into(),
        min_cages: cages[0],
        max_cages: cages[1],
        min_inequalities: ineq[0],
        max_inequalities: ineq[1],
        min_givens: givens[0],
        max_givens: givens[1],
        seed,
        ensure_unique_solution: !no_unique,
        fill_all_cells: fill_all,
        difficulty,
        ..GeneratorConfig::default()
    };

    eprintln!("Generating a {:?} puzzle (seed={seed})...", config.puzzle_type);
    let (puzzle, solution) = generate(&config);
    eprintln!(
        "cages={} inequalities={} givens={} uniqueness={:?}",
        puzzle.cages.len(),
        puzzle.inequalities.len(),
        crate::count_givens(&puzzle),
        solution.uniqueness,
    );

    if let Some(path) = &cnf_out {
        let (clauses, _) = build_formula(&puzzle);
        sudoku_sat::write_clauses(path, &clauses)?;
    }

    let text = format::write(&puzzle, with_solution.then_some(&solution.grid));
    match output {
        Some(path) => fs::write(&path, text).with_context(|| format!("writing '{}'", path.display()))?,
        None => print!("{text}"),
    }

    Ok(())
}

fn count_givens(puzzle: &sudoku_sat::puzzle::Puzzle) -> usize {
    sudoku_sat::puzzle::Grid::cells()
        .filter(|&c| !puzzle.grid.is_empty_cell(c))
        .count()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Solve { file, string, unique, cnf_out, json } => {
            let solved = run_solve(file, string, unique, cnf_out, json)?;
            if !solved {
                std::process::exit(1);
            }
        }
        Commands::Generate {
            r#type,
            cages,
            ineq,
            givens,
            seed,
            output,
            with_solution,
            fill_all,
            no_unique,
            difficulty,
            cnf_out,
        } => {
            run_generate(
                r#type, cages, ineq, givens, seed, output, with_solution, fill_all, no_unique,
                difficulty, cnf_out,
            )?;
        }
    }
    Ok(())
}
