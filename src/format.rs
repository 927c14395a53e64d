//! A line-oriented text format for puzzles: read and write.
//!
//! Covers the multi-section `GRID`/`CAGES`/`INEQUALITIES`/`SOLUTION`
//! form and the 81-char single-line auto-detected shorthand.

use std::fmt::Write as _;

use crate::error::{PuzzleError, PuzzleResult};
use crate::puzzle::{Cage, Cell, Grid, Inequality, InequalityKind, Puzzle, N};

fn parse_empty_or_digit(tok: &str) -> PuzzleResult<u8> {
    if tok.len() != 1 {
        return Err(PuzzleError::Parse(format!("expected a single character, got '{tok}'")));
    }
    match tok.chars().next().unwrap() {
        '0' | '.' | '_' | '*' => Ok(0),
        d @ '1'..='9' => Ok(d.to_digit(10).unwrap() as u8),
        other => Err(PuzzleError::Parse(format!("invalid grid character '{other}'"))),
    }
}

/// Parses a grid from 9 whitespace-tokenized lines.
fn parse_grid_lines<'a>(lines: impl Iterator<Item = &'a str>) -> PuzzleResult<Grid> {
    let mut grid = Grid::empty();
    let mut row = 0;
    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        if row >= N {
            return Err(PuzzleError::Parse("too many rows in GRID section".into()));
        }
        if tokens.len() != N {
            return Err(PuzzleError::Parse(format!(
                "row {row} has {} tokens, expected {N}",
                tokens.len()
            )));
        }
        for (col, tok) in tokens.iter().enumerate() {
            grid.0[row][col] = parse_empty_or_digit(tok)?;
        }
        row += 1;
        if row == N {
            break;
        }
    }
    if row != N {
        return Err(PuzzleError::Parse(format!("GRID section has only {row} rows, expected {N}")));
    }
    Ok(grid)
}

/// Tries to parse `text` as the 81-character single-line grid form:
/// digits `1..9` and `.`/`0` for blanks, any other character skipped.
/// Auto-detected when the filtered character count is exactly 81.
fn try_parse_single_line(text: &str) -> Option<Grid> {
    let chars: Vec<char> = text
        .chars()
        .filter(|&c| c.is_ascii_digit() || c == '.')
        .collect();
    if chars.len() != N * N {
        return None;
    }
    let mut grid = Grid::empty();
    for (idx, &ch) in chars.iter().enumerate() {
        let r = idx / N;
        let c = idx % N;
        grid.0[r][c] = match ch {
            '.' | '0' => 0,
            '1'..='9' => ch.to_digit(10).unwrap() as u8,
            _ => unreachable!(),
        };
    }
    Some(grid)
}

fn parse_cage_line(line: &str) -> PuzzleResult<Cage> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 || (tokens.len() - 1) % 2 != 0 {
        return Err(PuzzleError::Parse(format!("malformed cage line: '{line}'")));
    }
    let sum: u32 = tokens[0]
        .parse()
        .map_err(|_| PuzzleError::Parse(format!("invalid cage sum '{}'", tokens[0])))?;
    let mut cells = Vec::new();
    let mut i = 1;
    while i < tokens.len() {
        let r: usize = tokens[i]
            .parse()
            .map_err(|_| PuzzleError::Parse(format!("invalid cage row '{}'", tokens[i])))?;
        let c: usize = tokens[i + 1]
            .parse()
            .map_err(|_| PuzzleError::Parse(format!("invalid cage col '{}'", tokens[i + 1])))?;
        if r >= N || c >= N {
            return Err(PuzzleError::Parse(format!("cage cell ({r}, {c}) out of bounds")));
        }
        cells.push(Cell::new(r, c));
        i += 2;
    }
    Ok(Cage::new(cells, sum))
}

fn parse_inequality_line(line: &str) -> PuzzleResult<Inequality> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 5 {
        return Err(PuzzleError::Parse(format!("malformed inequality line: '{line}'")));
    }
    let r1: usize = tokens[0]
        .parse()
        .map_err(|_| PuzzleError::Parse(format!("invalid row '{}'", tokens[0])))?;
    let c1: usize = tokens[1]
        .parse()
        .map_err(|_| PuzzleError::Parse(format!("invalid col '{}'", tokens[1])))?;
    let kind = match tokens[2].to_ascii_lowercase().as_str() {
        ">" | "gt" => InequalityKind::Gt,
        "<" | "lt" => InequalityKind::Lt,
        other => return Err(PuzzleError::Parse(format!("invalid inequality operator '{other}'"))),
    };
    let r2: usize = tokens[3]
        .parse()
        .map_err(|_| PuzzleError::Parse(format!("invalid row '{}'", tokens[3])))?;
    let c2: usize = tokens[4]
        .parse()
        .map_err(|_| PuzzleError::Parse(format!("invalid col '{}'", tokens[4])))?;
    if r1 >= N || c1 >= N || r2 >= N || c2 >= N {
        return Err(PuzzleError::Parse("inequality cell out of bounds".into()));
    }
    Ok(Inequality::new(Cell::new(r1, c1), Cell::new(r2, c2), kind))
}

/// Parses the custom text format, or its 81-char single-line shorthand
/// (auto-detected). The `SOLUTION` section, if present, is ignored on
/// read.
pub fn parse(text: &str) -> PuzzleResult<Puzzle> {
    if let Some(grid) = try_parse_single_line(text) {
        return Ok(Puzzle::standard(grid));
    }

    #[derive(PartialEq)]
    enum Section {
        None,
        Grid,
        Cages,
        Inequalities,
        Solution,
    }

    let mut section = Section::None;
    let mut grid_lines: Vec<&str> = Vec::new();
    let mut cages = Vec::new();
    let mut inequalities = Vec::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        match line.to_ascii_uppercase().as_str() {
            "GRID" => {
                section = Section::Grid;
                continue;
            }
            "CAGES" => {
                section = Section::Cages;
                continue;
            }
            "INEQUALITIES" => {
                section = Section::Inequalities;
                continue;
            }
            "SOLUTION" => {
                section = Section::Solution;
                continue;
            }
            _ => {}
        }
        match section {
            Section::Grid => grid_lines.push(line),
            Section::Cages => cages.push(parse_cage_line(line)?),
            Section::Inequalities => inequalities.push(parse_inequality_line(line)?),
            Section::Solution => {} // ignored on read
            Section::None => {
                return Err(PuzzleError::Parse(format!(
                    "line outside of any section: '{line}'"
                )));
            }
        }
    }

    if grid_lines.is_empty() {
        return Err(PuzzleError::Parse("missing GRID section".into()));
    }
    let grid = parse_grid_lines(grid_lines.into_iter())?;

    Ok(Puzzle::new(grid, cages, inequalities))
}

/// Writes the custom text format. `solution`, when given, is emitted
/// as the optional `SOLUTION` section.
pub fn write(puzzle: &Puzzle, solution: Option<&Grid>) -> String {
    let mut out = String::new();
    out.push_str("GRID\n");
    for row in puzzle.grid.0.iter() {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(out, "{}", line.join(" ")).unwrap();
    }

    if !puzzle.cages.is_empty() {
        out.push_str("\nCAGES\n");
        for cage in &puzzle.cages {
            let mut parts = vec![cage.sum.to_string()];
            for cell in &cage.cells {
                parts.push(cell.row.to_string());
                parts.push(cell.col.to_string());
            }
            writeln!(out, "{}", parts.join(" ")).unwrap();
        }
    }

    if !puzzle.inequalities.is_empty() {
        out.push_str("\nINEQUALITIES\n");
        for ineq in &puzzle.inequalities {
            let op = match ineq.kind {
                InequalityKind::Gt => ">",
                InequalityKind::Lt => "<",
            };
            writeln!(
                out,
                "{} {} {} {} {}",
                ineq.a.row, ineq.a.col, op, ineq.b.row, ineq.b.col
            )
            .unwrap();
        }
    }

    if let Some(solution) = solution {
        out.push_str("\nSOLUTION\n");
        for row in solution.0.iter() {
            let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(out, "{}", line.join(" ")).unwrap();
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_line_grid() {
        let line = ".".repeat(81);
        let puzzle = parse(&line).unwrap();
        assert_eq!(puzzle.grid, Grid::empty());
    }

    #[test]
    fn round_trips_a_mixed_puzzle() {
        let mut grid = Grid::empty();
        grid.set(Cell::new(0, 0), 5);
        let cages = vec![Cage::new(vec![Cell::new(1, 0), Cell::new(1, 1)], 9)];
        let ineqs = vec![Inequality::new(Cell::new(2, 0), Cell::new(2, 1), InequalityKind::Lt)];
        let puzzle = Puzzle::new(grid, cages, ineqs);

        let text = write(&puzzle, None);
        let parsed = parse(&text).unwrap();

        assert_eq!(parsed.grid, puzzle.grid);
        assert_eq!(parsed.cages, puzzle.cages);
        assert_eq!(parsed.inequalities, puzzle.inequalities);
    }

    #[test]
    fn solution_section_is_ignored_on_read() {
        let grid = Grid::empty();
        let puzzle = Puzzle::standard(grid.clone());
        let text = write(&puzzle, Some(&grid));
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed, puzzle);
    }

    #[test]
    fn rejects_malformed_cage_line() {
        let text = "GRID\n".to_string()
            + &"0 0 0 0 0 0 0 0 0\n".repeat(9)
            + "CAGES\nnotanumber 0 0\n";
        assert!(parse(&text).is_err());
    }

    #[test]
    fn accepts_gt_lt_spelled_out() {
        let text = "GRID\n".to_string()
            + &"0 0 0 0 0 0 0 0 0\n".repeat(9)
            + "INEQUALITIES\n0 0 gt 0 1\n1 0 lt 1 1\n";
        let puzzle = parse(&text).unwrap();
        assert_eq!(puzzle.inequalities.len(), 2);
        assert_eq!(puzzle.inequalities[0].kind, InequalityKind::Gt);
        assert_eq!(puzzle.inequalities[1].kind, InequalityKind::Lt);
    }
}
