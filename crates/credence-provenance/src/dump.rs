//! Plain-text provenance dictionaries.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use credence_core::errors::ProvenanceError;

use crate::provenance::{ProvId, Provenance};

pub const TUPLE_DICT_FILE: &str = "tuple_dict.txt";
pub const RULE_DICT_FILE: &str = "rule_dict.txt";
pub const CONS_PRUNED_FILE: &str = "cons_pruned.txt";
pub const BASE_QUERIES_FILE: &str = "base_queries.txt";

impl Provenance {
    /// Write the tuple, rule, clause, and query dictionaries into `dir`.
    pub fn dump(&self, dir: &Path) -> Result<(), ProvenanceError> {
        std::fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

        let mut lines =
            Vec::with_capacity(self.inputs().len() + self.hidden().len() + self.outputs().len());
        for (k, t) in self.inputs().iter().enumerate() {
            lines.push(format!("{}:\t{t}", ProvId::Input(k)));
        }
        for (k, t) in self.hidden().iter().enumerate() {
            lines.push(format!("{}:\t{t}", ProvId::Hidden(k)));
        }
        for (k, t) in self.outputs().iter().enumerate() {
            lines.push(format!("{}:\t{t}", ProvId::Output(k)));
        }
        write_lines(&dir.join(TUPLE_DICT_FILE), &lines)?;

        let rules: Vec<String> = self
            .rule_infos()
            .iter()
            .enumerate()
            .map(|(k, info)| format!("{}:\t{info}", ProvId::Rule(k)))
            .collect();
        write_lines(&dir.join(RULE_DICT_FILE), &rules)?;

        let clauses = (0..self.clauses().len())
            .map(|k| self.clause_detail(k))
            .collect::<Result<Vec<_>, _>>()?;
        write_lines(&dir.join(CONS_PRUNED_FILE), &clauses)?;

        write_lines(&dir.join(BASE_QUERIES_FILE), &self.output_ids())?;

        tracing::debug!(name = self.name(), dir = %dir.display(), "provenance dumped");
        Ok(())
    }
}

fn write_lines(path: &Path, lines: &[String]) -> Result<(), ProvenanceError> {
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{line}").map_err(|e| io_error(path, e))?;
    }
    writer.flush().map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, err: std::io::Error) -> ProvenanceError {
    ProvenanceError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
