//! Property tests for Categorical01: T2-CAT-P01 through T2-CAT-P03.

use proptest::prelude::*;

use credence_causal::Categorical01;

fn dist_strategy() -> impl Strategy<Value = Categorical01> {
    prop::collection::vec((0.0_f64..=1.0, 0.01_f64..10.0), 1..6).prop_map(|pairs| {
        let (values, weights): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        Categorical01::with_weights(&values, &weights).unwrap()
    })
}

fn assert_well_formed(d: &Categorical01) -> Result<(), TestCaseError> {
    let total: f64 = d.probabilities().iter().sum();
    prop_assert!((total - 1.0).abs() < 1e-9, "mass {} != 1", total);
    for pair in d.supports().windows(2) {
        prop_assert!(pair[0] < pair[1], "support not strictly sorted");
    }
    for s in d.supports() {
        prop_assert!((0.0..=1.0).contains(s));
    }
    Ok(())
}

// =============================================================================
// T2-CAT-P01: construction normalises and sorts
// =============================================================================
proptest! {
    #[test]
    fn t2_cat_p01_normalised(d in dist_strategy()) {
        assert_well_formed(&d)?;
        prop_assert!((0.0..=1.0).contains(&d.estimation()));
    }
}

// =============================================================================
// T2-CAT-P02: combinators stay well formed
// =============================================================================
proptest! {
    #[test]
    fn t2_cat_p02_combinators_well_formed(a in dist_strategy(), b in dist_strategy()) {
        let or = Categorical01::rev_multiply(Some(&a), Some(&b)).unwrap();
        let and = Categorical01::multiply_dist(Some(&a), Some(&b)).unwrap();
        assert_well_formed(&or)?;
        assert_well_formed(&and)?;
    }
}

// =============================================================================
// T2-CAT-P03: bucketing preserves the mean
// =============================================================================
proptest! {
    #[test]
    fn t2_cat_p03_mean_preserved(a in dist_strategy(), b in dist_strategy()) {
        let and = Categorical01::multiply_dist(Some(&a), Some(&b)).unwrap();
        let expected = a.estimation() * b.estimation();
        prop_assert!((and.estimation() - expected).abs() < 1e-9);
        let or = Categorical01::rev_multiply(Some(&a), Some(&b)).unwrap();
        let expected_or = 1.0 - (1.0 - a.estimation()) * (1.0 - b.estimation());
        prop_assert!((or.estimation() - expected_or).abs() < 1e-9);
    }
}
