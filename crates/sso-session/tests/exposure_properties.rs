//! Property tests for exposure aggregation and reconciliation

use proptest::prelude::*;
use sso_core::{
    serialization::to_json, CallSpec, SessionSpec, Timestamp, TokenCall, TransferSpec, UsageLimit,
    U256,
};
use sso_session::{
    aggregate_exposure, reconcile, session_hash, session_hash_from_json, Exposure, ExposureMap,
};
use sso_testkit::strategies::{
    arb_call_spec, arb_extreme_usage_limit, arb_session, arb_session_spec, arb_spend_attempts,
    arb_transfer_spec,
};
use sso_testkit::{base_token, fresh_state, init_test_tracing, SessionSimulator, SpendAttempt};

/// Replace every limit with a lifetime cap of the same amount
fn force_lifetime(mut spec: SessionSpec) -> SessionSpec {
    let lifetime = |limit: &mut UsageLimit| {
        *limit = UsageLimit::lifetime(limit.limit());
    };
    lifetime(&mut spec.fee_limit);
    for t in &mut spec.transfer_policies {
        lifetime(&mut t.value_limit);
    }
    for c in &mut spec.call_policies {
        lifetime(&mut c.value_limit);
        for k in &mut c.constraints {
            lifetime(&mut k.limit);
        }
    }
    spec
}

fn arb_scenario() -> impl Strategy<Value = (Timestamp, SessionSpec, Vec<SpendAttempt>)> {
    arb_session().prop_flat_map(|(start, spec)| {
        let attempts = arb_spend_attempts(&spec, start, 40);
        (Just(start), Just(spec), attempts)
    })
}

fn arb_lifetime_scenario() -> impl Strategy<Value = (Timestamp, SessionSpec, Vec<SpendAttempt>)> {
    arb_session().prop_flat_map(|(start, spec)| {
        let spec = force_lifetime(spec);
        let attempts = arb_spend_attempts(&spec, start, 40);
        (Just(start), Just(spec), attempts)
    })
}

fn assert_dominates(smaller: &ExposureMap, larger: &ExposureMap) -> Result<(), TestCaseError> {
    for (token, before) in smaller {
        let after = larger.get(token).copied().unwrap_or(Exposure::ZERO);
        prop_assert!(
            *before <= after,
            "exposure of {} decreased from {} to {}",
            token,
            before,
            after
        );
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn aggregation_is_idempotent((start, spec) in arb_session()) {
        let first = aggregate_exposure(&spec, start).unwrap();
        let second = aggregate_exposure(&spec, start).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn adding_a_call_policy_never_decreases_exposure(
        (start, spec) in arb_session(),
        extra in arb_call_spec(),
        position in any::<prop::sample::Index>(),
    ) {
        let before = aggregate_exposure(&spec, start).unwrap();
        let mut grown = spec.clone();
        let at = position.index(grown.call_policies.len() + 1);
        grown.call_policies.insert(at, extra);
        let after = aggregate_exposure(&grown, start).unwrap();
        assert_dominates(&before, &after)?;
    }

    #[test]
    fn adding_a_transfer_policy_never_decreases_exposure(
        (start, spec) in arb_session(),
        extra in arb_transfer_spec(),
    ) {
        let before = aggregate_exposure(&spec, start).unwrap();
        let mut grown = spec.clone();
        grown.transfer_policies.push(extra);
        let after = aggregate_exposure(&grown, start).unwrap();
        assert_dominates(&before, &after)?;
    }

    #[test]
    fn extreme_limits_never_wrap(
        (start, mut spec) in arb_session(),
        fee in arb_extreme_usage_limit(),
        value in arb_extreme_usage_limit(),
    ) {
        spec.fee_limit = fee;
        spec.transfer_policies.push(TransferSpec {
            target: base_token(),
            max_value_per_use: U256::MAX,
            value_limit: value,
        });
        let exposure = aggregate_exposure(&spec, start).unwrap();
        let base = exposure[&base_token()];
        // the total can never be below either contribution
        for limit in [fee, value] {
            if let UsageLimit::Lifetime { limit, .. } = limit {
                prop_assert!(Exposure::Limited(limit) <= base);
            }
        }
    }

    #[test]
    fn simulated_spend_never_exceeds_exposure((start, spec, attempts) in arb_scenario()) {
        init_test_tracing();
        let exposure = aggregate_exposure(&spec, start).unwrap();
        let mut sim = SessionSimulator::new(&spec, start);
        sim.apply_all(&attempts);

        for (token, moved) in sim.moved() {
            match exposure.get(token) {
                Some(Exposure::Unlimited) => {}
                Some(Exposure::Limited(bound)) => prop_assert!(
                    moved <= bound,
                    "moved {} of {} but exposure is {}",
                    moved,
                    token,
                    bound
                ),
                None => prop_assert!(false, "moved {} of untracked token {}", moved, token),
            }
        }
    }

    #[test]
    fn reconciliation_recovers_lifetime_spend((start, spec, attempts) in arb_lifetime_scenario()) {
        let mut sim = SessionSimulator::new(&spec, start);
        sim.apply_all(&attempts);
        let result = reconcile(&spec, &sim.state());

        prop_assert!(result.is_consistent(), "{:?}", result.mismatches);
        prop_assert!(result.skipped.is_empty());
        prop_assert_eq!(
            result.spent.get(&base_token()).copied().unwrap_or_default(),
            sim.moved_of(&base_token())
        );
        // a token whose every policy caps its amount over the lifetime is never under-reported
        for (token, moved) in sim.moved() {
            if *token == base_token() {
                continue;
            }
            let capped = spec
                .call_policies
                .iter()
                .filter(|c| c.target == *token)
                .filter_map(|c| TokenCall::from_selector(&c.selector).map(|call| (c, call)))
                .all(|(c, call)| {
                    c.constraints.iter().any(|k| {
                        k.index == call.amount_index()
                            && matches!(k.limit, UsageLimit::Lifetime { .. })
                    })
                });
            if capped {
                let spent = result.spent.get(token).copied().unwrap_or_default();
                prop_assert!(
                    spent >= *moved,
                    "reconciled {} of {} but moved {}",
                    spent,
                    token,
                    moved
                );
            }
        }
    }

    #[test]
    fn fresh_session_has_spent_nothing(spec in arb_session_spec()) {
        let result = reconcile(&spec, &fresh_state(&spec));
        prop_assert!(result.is_consistent());
        prop_assert!(result.spent.values().all(|v| v.is_zero()));
    }

    #[test]
    fn hash_survives_json(spec in arb_session_spec()) {
        let json = to_json(&spec).unwrap();
        prop_assert_eq!(session_hash(&spec).unwrap(), session_hash_from_json(&json).unwrap());
    }

    #[test]
    fn constraints_only_tighten_token_exposure(
        (start, spec) in arb_session(),
        call in arb_call_spec(),
    ) {
        // dropping constraints from a token policy can only loosen it
        let mut loose = spec.clone();
        loose.call_policies.push(CallSpec { constraints: vec![], ..call.clone() });
        let mut tight = spec;
        tight.call_policies.push(call);

        let loose = aggregate_exposure(&loose, start).unwrap();
        let tight = aggregate_exposure(&tight, start).unwrap();
        assert_dominates(&tight, &loose)?;
    }
}
