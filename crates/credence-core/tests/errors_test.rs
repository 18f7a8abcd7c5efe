//! Tests for the Credence error handling system.

use std::collections::HashSet;

use credence_core::errors::error_code::{self, CredenceErrorCode};
use credence_core::errors::*;

/// T0-ERR-01: every error enum carries an error code
#[test]
fn t0_err_01_all_errors_have_error_code() {
    let codes = [
        ProvenanceError::UnknownId { id: "X9".into() }.error_code(),
        GraphError::RedundantNode { node: "n".into() }.error_code(),
        DistributionError::EmptySupport.error_code(),
        CompileError::InvalidClauseLimit { limit: 1 }.error_code(),
        SolverError::InconsistentEvidence.error_code(),
        NetworkError::TimeOutOfRange { time: 3, horizon: 1 }.error_code(),
        DriverError::Cancelled.error_code(),
        ConfigError::FileNotFound { path: "/tmp".into() }.error_code(),
    ];
    for code in codes {
        assert!(!code.is_empty());
    }
}

/// T0-ERR-02: subsystem codes are distinct
#[test]
fn t0_err_02_subsystem_codes_distinct() {
    let codes: HashSet<&str> = [
        error_code::PROVENANCE_ERROR,
        error_code::GRAPH_ERROR,
        error_code::DISTRIBUTION_ERROR,
        error_code::COMPILE_ERROR,
        error_code::SOLVER_ERROR,
        error_code::NETWORK_ERROR,
        error_code::DRIVER_ERROR,
        error_code::CONFIG_ERROR,
    ]
    .into_iter()
    .collect();
    assert_eq!(codes.len(), 8);
}

/// T0-ERR-03: wrapped errors keep the inner code
#[test]
fn t0_err_03_from_conversions_preserve_codes() {
    let net: NetworkError = SolverError::InconsistentEvidence.into();
    assert_eq!(net.error_code(), error_code::INCONSISTENT_EVIDENCE);

    let driver: DriverError = GraphError::OverlappedNode { node: "a".into() }.into();
    assert_eq!(driver.error_code(), error_code::GRAPH_ERROR);

    let top: CredenceError = driver.into();
    assert_eq!(top.error_code(), error_code::GRAPH_ERROR);

    let io: CredenceError = CompileError::Io {
        path: "x.fg".into(),
        message: "denied".into(),
    }
    .into();
    assert_eq!(io.error_code(), error_code::IO_ERROR);
}

/// T0-ERR-04: coded string format
#[test]
fn t0_err_04_coded_string_format() {
    let err = GraphError::UnmetSub {
        head: "H0".into(),
        sub: "I9".into(),
    };
    assert_eq!(err.coded_string(), "[GRAPH_ERROR] unmet sub I9 in head H0");
}

/// T0-ERR-05: role violations are distinguishable
#[test]
fn t0_err_05_graph_errors_distinguishable() {
    let overlapped = GraphError::OverlappedNode { node: "A".into() };
    let redundant = GraphError::RedundantNode { node: "A".into() };
    assert_ne!(overlapped, redundant);
    assert_eq!(overlapped.to_string(), "overlapped node A");
    assert_eq!(redundant.to_string(), "redundant node A");
}
