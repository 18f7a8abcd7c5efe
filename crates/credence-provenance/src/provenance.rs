//! Immutable pruned provenance with stable ids.

use std::fmt;
use std::str::FromStr;

use credence_core::errors::ProvenanceError;
use credence_core::types::collections::{FxHashMap, FxIndexMap};
use credence_core::types::{ConstraintItem, Tuple};

/// Typed form of the string ids handed to downstream crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProvId {
    Input(usize),
    Output(usize),
    Hidden(usize),
    Clause(usize),
    Rule(usize),
}

impl ProvId {
    pub fn is_tuple(&self) -> bool {
        matches!(self, Self::Input(_) | Self::Output(_) | Self::Hidden(_))
    }
}

impl fmt::Display for ProvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(k) => write!(f, "I{k}"),
            Self::Output(k) => write!(f, "O{k}"),
            Self::Hidden(k) => write!(f, "H{k}"),
            Self::Clause(k) => write!(f, "D{k}"),
            Self::Rule(k) => write!(f, "R{k}"),
        }
    }
}

impl FromStr for ProvId {
    type Err = ProvenanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ProvenanceError::UnknownId { id: s.to_string() };
        let mut chars = s.chars();
        let tag = chars.next().ok_or_else(unknown)?;
        let rest = chars.as_str();
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(unknown());
        }
        let k: usize = rest.parse().map_err(|_| unknown())?;
        match tag {
            'I' => Ok(Self::Input(k)),
            'O' => Ok(Self::Output(k)),
            'H' => Ok(Self::Hidden(k)),
            'D' => Ok(Self::Clause(k)),
            'R' => Ok(Self::Rule(k)),
            _ => Err(unknown()),
        }
    }
}

/// The acyclic, observation-relevant subset of a derivation forest.
///
/// Tuples referenced by the retained clauses fall into exactly one of the
/// input, output, and hidden partitions.
#[derive(Debug, Clone)]
pub struct Provenance {
    name: String,
    clauses: Vec<ConstraintItem>,
    inputs: Vec<Tuple>,
    outputs: Vec<Tuple>,
    hidden: Vec<Tuple>,
    tuple_ids: FxHashMap<Tuple, ProvId>,
    rule_infos: Vec<String>,
}

impl Provenance {
    /// `universe` lists every referenced tuple in first-seen order; tuples in
    /// neither `inputs` nor `outputs` become hidden.
    pub(crate) fn new(
        name: String,
        universe: Vec<Tuple>,
        inputs: Vec<Tuple>,
        outputs: Vec<Tuple>,
        clauses: Vec<ConstraintItem>,
        rule_infos: Vec<String>,
    ) -> Self {
        let mut tuple_ids = FxHashMap::default();
        for (k, t) in inputs.iter().enumerate() {
            tuple_ids.insert(t.clone(), ProvId::Input(k));
        }
        for (k, t) in outputs.iter().enumerate() {
            tuple_ids.insert(t.clone(), ProvId::Output(k));
        }
        let hidden: Vec<Tuple> = universe
            .into_iter()
            .filter(|t| !tuple_ids.contains_key(t))
            .collect();
        for (k, t) in hidden.iter().enumerate() {
            tuple_ids.insert(t.clone(), ProvId::Hidden(k));
        }
        Self {
            name,
            clauses,
            inputs,
            outputs,
            hidden,
            tuple_ids,
            rule_infos,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tuple_prov_id(&self, tuple: &Tuple) -> Option<ProvId> {
        self.tuple_ids.get(tuple).copied()
    }

    pub fn tuple_id(&self, tuple: &Tuple) -> Result<String, ProvenanceError> {
        self.tuple_prov_id(tuple)
            .map(|id| id.to_string())
            .ok_or_else(|| ProvenanceError::UnknownTuple {
                tuple: tuple.to_string(),
            })
    }

    pub fn clause_id(&self, index: usize) -> Result<String, ProvenanceError> {
        if index < self.clauses.len() {
            Ok(ProvId::Clause(index).to_string())
        } else {
            Err(ProvenanceError::UnknownId {
                id: ProvId::Clause(index).to_string(),
            })
        }
    }

    pub fn decode_tuple(&self, id: &str) -> Result<&Tuple, ProvenanceError> {
        let unknown = || ProvenanceError::UnknownId { id: id.to_string() };
        let found = match id.parse::<ProvId>()? {
            ProvId::Input(k) => self.inputs.get(k),
            ProvId::Output(k) => self.outputs.get(k),
            ProvId::Hidden(k) => self.hidden.get(k),
            ProvId::Clause(_) | ProvId::Rule(_) => None,
        };
        found.ok_or_else(unknown)
    }

    pub fn decode_clause(&self, id: &str) -> Result<&ConstraintItem, ProvenanceError> {
        let found = match id.parse::<ProvId>()? {
            ProvId::Clause(k) => self.clauses.get(k),
            _ => None,
        };
        found.ok_or_else(|| ProvenanceError::UnknownId { id: id.to_string() })
    }

    /// Human-readable expansion of any id.
    pub fn unfold_id(&self, id: &str) -> Result<String, ProvenanceError> {
        let parsed = id.parse::<ProvId>()?;
        match parsed {
            ProvId::Clause(k) => self.clause_detail(k),
            ProvId::Rule(_) => Ok(id.to_string()),
            _ => Ok(format!("{id}: {}", self.decode_tuple(id)?)),
        }
    }

    /// `R<rule>-D<k> : [NOT ]head=[NOT ]b1,b2` with encoded ids.
    pub(crate) fn clause_detail(&self, index: usize) -> Result<String, ProvenanceError> {
        let clause = self
            .clauses
            .get(index)
            .ok_or_else(|| ProvenanceError::UnknownId {
                id: ProvId::Clause(index).to_string(),
            })?;
        let mut line = format!("R{}-D{index} : ", clause.rule_id());
        if !clause.head_sign() {
            line.push_str("NOT ");
        }
        line.push_str(&self.tuple_id(clause.head())?);
        line.push('=');
        for (j, lit) in clause.body().iter().enumerate() {
            if j > 0 {
                line.push(',');
            }
            if !lit.positive {
                line.push_str("NOT ");
            }
            line.push_str(&self.tuple_id(&lit.tuple)?);
        }
        Ok(line)
    }

    /// Head id to the ids of the clauses deriving it, in clause order.
    pub fn head_to_clauses(&self) -> FxIndexMap<String, Vec<String>> {
        let mut map: FxIndexMap<String, Vec<String>> = FxIndexMap::default();
        for (k, clause) in self.clauses.iter().enumerate() {
            if let Some(head) = self.tuple_prov_id(clause.head()) {
                map.entry(head.to_string())
                    .or_default()
                    .push(ProvId::Clause(k).to_string());
            }
        }
        map
    }

    /// Clause id to the ids of its body tuples, in body order.
    pub fn clause_to_body(&self) -> FxIndexMap<String, Vec<String>> {
        self.clauses
            .iter()
            .enumerate()
            .map(|(k, clause)| {
                let body = clause
                    .body_tuples()
                    .filter_map(|t| self.tuple_prov_id(t))
                    .map(|id| id.to_string())
                    .collect();
                (ProvId::Clause(k).to_string(), body)
            })
            .collect()
    }

    pub fn clause_ids(&self) -> Vec<String> {
        (0..self.clauses.len())
            .map(|k| ProvId::Clause(k).to_string())
            .collect()
    }

    pub fn input_ids(&self) -> Vec<String> {
        (0..self.inputs.len())
            .map(|k| ProvId::Input(k).to_string())
            .collect()
    }

    pub fn output_ids(&self) -> Vec<String> {
        (0..self.outputs.len())
            .map(|k| ProvId::Output(k).to_string())
            .collect()
    }

    pub fn hidden_ids(&self) -> Vec<String> {
        (0..self.hidden.len())
            .map(|k| ProvId::Hidden(k).to_string())
            .collect()
    }

    pub fn clauses(&self) -> &[ConstraintItem] {
        &self.clauses
    }

    pub fn inputs(&self) -> &[Tuple] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Tuple] {
        &self.outputs
    }

    pub fn hidden(&self) -> &[Tuple] {
        &self.hidden
    }

    pub fn rule_infos(&self) -> &[String] {
        &self.rule_infos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prov_id_round_trip_forms() {
        for s in ["I0", "O12", "H3", "D7", "R1"] {
            assert_eq!(s.parse::<ProvId>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_prov_id_rejects_garbage() {
        for s in ["", "X1", "I", "I-1", "D1a", "R+2"] {
            assert!(s.parse::<ProvId>().is_err(), "{s} should not parse");
        }
    }

    #[test]
    fn test_hidden_excludes_inputs_and_outputs() {
        let i = Tuple::new("I", [1]);
        let h = Tuple::new("H", [2]);
        let o = Tuple::new("O", [0]);
        let prov = Provenance::new(
            "p".into(),
            vec![o.clone(), h.clone(), i.clone()],
            vec![i.clone()],
            vec![o.clone()],
            vec![
                ConstraintItem::positive(0, h.clone(), vec![i.clone()]),
                ConstraintItem::positive(1, o.clone(), vec![h.clone()]),
            ],
            Vec::new(),
        );
        assert_eq!(prov.hidden(), &[h.clone()]);
        assert_eq!(prov.tuple_id(&h).unwrap(), "H0");
        assert_eq!(prov.unfold_id("I0").unwrap(), "I0: I(1)");
        assert_eq!(prov.unfold_id("D1").unwrap(), "R1-D1 : O0=H0");
        assert_eq!(prov.unfold_id("R5").unwrap(), "R5");
        assert!(prov.decode_clause("D2").is_err());
        assert!(prov.decode_tuple("D0").is_err());
    }
}
