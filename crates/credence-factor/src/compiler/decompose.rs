//! Phony decomposition of wide clause bodies.

use crate::factor::{self, Factor};

/// A variable of the replica template: a shared parameter, or a block-local
/// id shifted by the replica offset on instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Slot {
    Param(usize),
    Local(usize),
}

impl Slot {
    pub(crate) fn resolve(self, offset: usize) -> usize {
        match self {
            Self::Param(d) => d,
            Self::Local(i) => offset + i,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClauseKind {
    Or,
    And,
}

impl ClauseKind {
    pub(crate) fn factor(self, head: Slot, control: Option<Slot>, body: Vec<Slot>) -> Factor<Slot> {
        match (self, control) {
            (Self::Or, None) => factor::or(head, body),
            (Self::And, None) => factor::and(head, body),
            (Self::Or, Some(c)) => factor::gated_or(head, c, body),
            (Self::And, Some(c)) => factor::gated_and(head, c, body),
        }
    }
}

/// Shrink `body` to at most `limit` variables.
///
/// Each pass splits the body into chunks of `clause_limit`; every full
/// chunk becomes a phony factor of the same kind, a partial tail is carried
/// through. Phony factors are pushed onto `out` and `next_phony` advances
/// by one per phony head.
pub(crate) fn decompose(
    mut body: Vec<Slot>,
    limit: usize,
    clause_limit: usize,
    kind: ClauseKind,
    next_phony: &mut usize,
    out: &mut Vec<Factor<Slot>>,
) -> Vec<Slot> {
    while body.len() > limit {
        let mut heads = Vec::with_capacity(body.len() / clause_limit + clause_limit);
        for chunk in body.chunks(clause_limit) {
            if chunk.len() < clause_limit {
                heads.extend_from_slice(chunk);
                continue;
            }
            let phony = Slot::Local(*next_phony);
            *next_phony += 1;
            tracing::trace!(phony = *next_phony - 1, width = chunk.len(), "phony node created");
            out.push(kind.factor(phony, None, chunk.to_vec()));
            heads.push(phony);
        }
        body = heads;
    }
    body
}
