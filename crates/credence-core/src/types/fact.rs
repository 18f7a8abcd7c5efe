//! Fact model: ground tuples and the derivations linking them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::errors::ProvenanceError;

/// One ground atom: a relation name plus ordered domain indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tuple {
    relation: String,
    attributes: SmallVec<[u32; 4]>,
}

impl Tuple {
    pub fn new(relation: impl Into<String>, attributes: impl IntoIterator<Item = u32>) -> Self {
        Self {
            relation: relation.into(),
            attributes: attributes.into_iter().collect(),
        }
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn attributes(&self) -> &[u32] {
        &self.attributes
    }

    pub fn arity(&self) -> usize {
        self.attributes.len()
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.relation)?;
        for (i, attr) in self.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{attr}")?;
        }
        f.write_str(")")
    }
}

/// Parses the display form, e.g. `VH(2,3)` or `Empty()`.
impl FromStr for Tuple {
    type Err = ProvenanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ProvenanceError::MalformedTuple {
            input: s.to_string(),
        };
        let s_trim = s.trim();
        let (relation, rest) = s_trim.split_once('(').ok_or_else(malformed)?;
        let inner = rest.strip_suffix(')').ok_or_else(malformed)?;
        if relation.is_empty() {
            return Err(malformed());
        }
        let mut attributes = SmallVec::new();
        if !inner.trim().is_empty() {
            for part in inner.split(',') {
                attributes.push(part.trim().parse::<u32>().map_err(|_| malformed())?);
            }
        }
        Ok(Self {
            relation: relation.to_string(),
            attributes,
        })
    }
}

/// A body entry of a derivation: a tuple with its polarity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub tuple: Tuple,
    pub positive: bool,
}

/// One grounded rule instance: `head := body_1 * body_2 * ... * body_n`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintItem {
    rule_id: u32,
    head: Tuple,
    head_sign: bool,
    body: SmallVec<[Literal; 4]>,
}

impl ConstraintItem {
    pub fn new(rule_id: u32, head: Tuple, head_sign: bool, body: Vec<(Tuple, bool)>) -> Self {
        Self {
            rule_id,
            head,
            head_sign,
            body: body
                .into_iter()
                .map(|(tuple, positive)| Literal { tuple, positive })
                .collect(),
        }
    }

    /// A derivation whose head and body literals are all positive.
    pub fn positive(rule_id: u32, head: Tuple, body: Vec<Tuple>) -> Self {
        Self::new(
            rule_id,
            head,
            true,
            body.into_iter().map(|t| (t, true)).collect(),
        )
    }

    /// Builds from parallel tuple/sign lists as reported by a rule engine,
    /// dropping absent body entries together with their sign.
    pub fn from_parts(
        rule_id: u32,
        head: Tuple,
        head_sign: bool,
        subs: Vec<Option<Tuple>>,
        signs: Vec<bool>,
    ) -> Result<Self, ProvenanceError> {
        if subs.len() != signs.len() {
            return Err(ProvenanceError::SignArityMismatch {
                tuples: subs.len(),
                signs: signs.len(),
            });
        }
        let body = subs
            .into_iter()
            .zip(signs)
            .filter_map(|(sub, sign)| sub.map(|t| (t, sign)))
            .collect();
        Ok(Self::new(rule_id, head, head_sign, body))
    }

    pub fn rule_id(&self) -> u32 {
        self.rule_id
    }

    pub fn head(&self) -> &Tuple {
        &self.head
    }

    pub fn head_sign(&self) -> bool {
        self.head_sign
    }

    pub fn body(&self) -> &[Literal] {
        &self.body
    }

    pub fn body_tuples(&self) -> impl Iterator<Item = &Tuple> + '_ {
        self.body.iter().map(|l| &l.tuple)
    }

    pub fn body_signs(&self) -> impl Iterator<Item = bool> + '_ {
        self.body.iter().map(|l| l.positive)
    }
}

impl fmt::Display for ConstraintItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.head_sign {
            f.write_str("!")?;
        }
        write!(f, "{}:=", self.head)?;
        for (i, lit) in self.body.iter().enumerate() {
            if i > 0 {
                f.write_str("*")?;
            }
            if !lit.positive {
                f.write_str("!")?;
            }
            write!(f, "{}", lit.tuple)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_display_and_parse() {
        let t = Tuple::new("VH", [2, 3]);
        assert_eq!(t.to_string(), "VH(2,3)");
        assert_eq!("VH(2,3)".parse::<Tuple>().unwrap(), t);
        assert_eq!("Empty()".parse::<Tuple>().unwrap().arity(), 0);
    }

    #[test]
    fn test_tuple_parse_rejects_garbage() {
        assert!("VH2,3".parse::<Tuple>().is_err());
        assert!("VH(a)".parse::<Tuple>().is_err());
        assert!("(1)".parse::<Tuple>().is_err());
    }

    #[test]
    fn test_from_parts_drops_missing_bodies() {
        let head = Tuple::new("O", [0]);
        let c = ConstraintItem::from_parts(
            7,
            head,
            true,
            vec![Some(Tuple::new("I", [1])), None, Some(Tuple::new("I", [2]))],
            vec![true, true, false],
        )
        .unwrap();
        assert_eq!(c.body().len(), 2);
        assert_eq!(c.body_signs().collect::<Vec<_>>(), vec![true, false]);
        assert_eq!(c.to_string(), "O(0):=I(1)*!I(2)");
    }

    #[test]
    fn test_from_parts_rejects_arity_mismatch() {
        let err = ConstraintItem::from_parts(0, Tuple::new("O", [0]), true, vec![None], vec![])
            .unwrap_err();
        assert!(matches!(err, ProvenanceError::SignArityMismatch { tuples: 1, signs: 0 }));
    }
}
