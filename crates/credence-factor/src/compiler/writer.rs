//! Text writers for `.fg` factor graphs, `.tab` evidence, and `.em` specs.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use credence_core::errors::CompileError;

use super::FactorGraphSpec;
use crate::factor::Factor;

impl FactorGraphSpec {
    /// Write the factor count, then each factor after a blank line.
    pub fn write_fg(&self, path: &Path) -> Result<(), CompileError> {
        write_lines(path, |w| self.render(w))?;
        tracing::debug!(path = %path.display(), factors = self.num_factors(), "factor graph written");
        Ok(())
    }

    /// The `.fg` text, mostly for tests and debugging.
    pub fn to_fg_string(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.render(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn render(&self, w: &mut impl Write) -> io::Result<()> {
        writeln!(w, "{}", self.num_factors())?;
        for factor in self.factors() {
            writeln!(w)?;
            write_factor(w, &factor)?;
        }
        Ok(())
    }
}

fn write_factor(w: &mut impl Write, factor: &Factor) -> io::Result<()> {
    writeln!(w, "{}", factor.vars().len())?;
    writeln!(w, "{}", join(factor.vars()))?;
    writeln!(w, "{}", join(factor.cards()))?;
    writeln!(w, "{}", factor.entries().len())?;
    for (state, weight) in factor.entries() {
        writeln!(w, "{state} {weight}")?;
    }
    Ok(())
}

fn join(values: &[usize]) -> String {
    values
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// EM evidence: the tab-joined variable header, a blank line, then one row
/// per observation with an empty field for a missing value.
pub fn write_tab(
    path: &Path,
    header_vars: &[usize],
    rows: &[Vec<Option<bool>>],
) -> Result<(), CompileError> {
    write_lines(path, |w| {
        let header: Vec<String> = header_vars.iter().map(usize::to_string).collect();
        writeln!(w, "{}", header.join("\t"))?;
        writeln!(w)?;
        for row in rows {
            let fields: Vec<&str> = row
                .iter()
                .map(|v| match v {
                    Some(true) => "1",
                    Some(false) => "0",
                    None => "",
                })
                .collect();
            writeln!(w, "{}", fields.join("\t"))?;
        }
        Ok(())
    })
}

/// EM spec: one maximisation step over `params`, each estimated on its own.
pub fn write_em(path: &Path, params: &[usize]) -> Result<(), CompileError> {
    write_lines(path, |w| {
        writeln!(w, "1")?;
        writeln!(w)?;
        writeln!(w, "{}", params.len())?;
        for dist_id in params {
            writeln!(w, "CondProbEstimation [target_dim=2,total_dim=2]")?;
            writeln!(w, "1")?;
            writeln!(w, "{dist_id}\t{dist_id}")?;
        }
        Ok(())
    })
}

fn write_lines(
    path: &Path,
    body: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>,
) -> Result<(), CompileError> {
    let io_error = |e: io::Error| CompileError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    };
    let mut w = BufWriter::new(File::create(path).map_err(io_error)?);
    body(&mut w).map_err(io_error)?;
    w.flush().map_err(io_error)
}
