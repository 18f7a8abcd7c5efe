//! Readers for the `.fg`, `.tab`, and `.em` text formats.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use credence_core::errors::SolverError;

use crate::factor::Factor;

/// Rows of observed variable states; `None` marks a missing value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceTable {
    pub vars: Vec<usize>,
    pub rows: Vec<Vec<Option<bool>>>,
}

/// A parameter factor to re-estimate, and the variable it is a belief over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamFactor {
    pub factor: usize,
    pub var: usize,
}

fn read(path: &Path) -> Result<String, SolverError> {
    fs::read_to_string(path).map_err(|e| SolverError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

pub fn parse_fg(path: &Path) -> Result<Vec<Factor>, SolverError> {
    parse_fg_str(&read(path)?, &path.display().to_string())
}

/// Blank lines and `#` comments are skipped.
pub fn parse_fg_str(text: &str, label: &str) -> Result<Vec<Factor>, SolverError> {
    let mut lines = Lines::new(text, label);
    let count: usize = lines.single()?;
    let mut factors = Vec::with_capacity(count);
    for _ in 0..count {
        let nvars: usize = lines.single()?;
        let vars: Vec<usize> = lines.list()?;
        let cards: Vec<usize> = lines.list()?;
        if vars.len() != nvars || cards.len() != nvars {
            return Err(lines.error(format!(
                "expected {nvars} variables and cardinalities, got {} and {}",
                vars.len(),
                cards.len()
            )));
        }
        let nnz: usize = lines.single()?;
        let mut entries = Vec::with_capacity(nnz);
        for _ in 0..nnz {
            let (line_no, line) = lines.next_line()?;
            let mut parts = line.split_whitespace();
            let state = parts.next().and_then(|s| s.parse::<u64>().ok());
            let weight = parts.next().and_then(|s| s.parse::<f64>().ok());
            match (state, weight, parts.next()) {
                (Some(state), Some(weight), None) => entries.push((state, weight)),
                _ => {
                    return Err(SolverError::Parse {
                        path: label.to_string(),
                        line: line_no,
                        message: format!("malformed entry '{line}'"),
                    })
                }
            }
        }
        factors.push(Factor::new(vars, cards, entries));
    }
    Ok(factors)
}

pub fn parse_tab(path: &Path) -> Result<EvidenceTable, SolverError> {
    parse_tab_str(&read(path)?, &path.display().to_string())
}

/// Header of tab-separated variable ids, a blank line, then one row per line.
pub fn parse_tab_str(text: &str, label: &str) -> Result<EvidenceTable, SolverError> {
    let mut lines = text.lines();
    let header = lines.next().unwrap_or("");
    let vars = if header.trim().is_empty() {
        Vec::new()
    } else {
        header
            .split('\t')
            .map(|v| {
                v.trim().parse::<usize>().map_err(|_| SolverError::Parse {
                    path: label.to_string(),
                    line: 1,
                    message: format!("bad variable label '{v}'"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?
    };
    // skip the separator line
    lines.next();

    let mut rows = Vec::new();
    for (i, line) in lines.enumerate() {
        let line_no = i + 3;
        if vars.is_empty() {
            rows.push(Vec::new());
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != vars.len() {
            return Err(SolverError::Parse {
                path: label.to_string(),
                line: line_no,
                message: format!("expected {} fields, got {}", vars.len(), fields.len()),
            });
        }
        let row = fields
            .iter()
            .map(|f| match f.trim() {
                "" => Ok(None),
                "1" => Ok(Some(true)),
                "0" => Ok(Some(false)),
                other => Err(SolverError::Parse {
                    path: label.to_string(),
                    line: line_no,
                    message: format!("bad binary value '{other}'"),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }
    Ok(EvidenceTable { vars, rows })
}

pub fn parse_em(path: &Path) -> Result<Vec<ParamFactor>, SolverError> {
    parse_em_str(&read(path)?, &path.display().to_string())
}

/// Every maximisation step is flattened; each shared-parameter line names a
/// factor index and its variable.
pub fn parse_em_str(text: &str, label: &str) -> Result<Vec<ParamFactor>, SolverError> {
    let mut lines = Lines::new(text, label);
    let steps: usize = lines.single()?;
    let mut params = Vec::new();
    for _ in 0..steps {
        let blocks: usize = lines.single()?;
        for _ in 0..blocks {
            let (_, estimator) = lines.next_line()?;
            if !estimator.starts_with("CondProbEstimation") {
                return Err(lines.error(format!("unsupported estimator '{estimator}'")));
            }
            let shared: usize = lines.single()?;
            for _ in 0..shared {
                let ids: Vec<usize> = lines.list()?;
                match ids.as_slice() {
                    [factor, var] => params.push(ParamFactor {
                        factor: *factor,
                        var: *var,
                    }),
                    _ => return Err(lines.error("expected 'factor<TAB>var'".to_string())),
                }
            }
        }
    }
    Ok(params)
}

/// Non-empty, non-comment lines with 1-based line numbers.
struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
    label: &'a str,
    last: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str, label: &'a str) -> Self {
        Self {
            inner: text.lines().enumerate(),
            label,
            last: 0,
        }
    }

    fn next_line(&mut self) -> Result<(usize, &'a str), SolverError> {
        for (i, line) in self.inner.by_ref() {
            let line = line.trim();
            self.last = i + 1;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            return Ok((i + 1, line));
        }
        Err(self.error("unexpected end of file".to_string()))
    }

    fn single<T: FromStr>(&mut self) -> Result<T, SolverError> {
        let (_, line) = self.next_line()?;
        line.parse()
            .map_err(|_| self.error(format!("expected a number, got '{line}'")))
    }

    fn list<T: FromStr>(&mut self) -> Result<Vec<T>, SolverError> {
        let (_, line) = self.next_line()?;
        line.split_whitespace()
            .map(|tok| {
                tok.parse()
                    .map_err(|_| self.error(format!("bad number '{tok}'")))
            })
            .collect()
    }

    fn error(&self, message: String) -> SolverError {
        SolverError::Parse {
            path: self.label.to_string(),
            line: self.last,
            message,
        }
    }
}
