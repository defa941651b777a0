//! Canonical JSON format of session specs and states

use assert_matches::assert_matches;
use sso_core::serialization::{from_json, to_json};
use sso_core::{
    Condition, SessionSpec, SessionState, SsoError, Status, UsageLimit, TRANSFER_SELECTOR, U256,
};

const SPEC_JSON: &str = r#"{
    "signer": "0x1111111111111111111111111111111111111111",
    "expiresAt": "1749040108",
    "feeLimit": { "limitType": "Lifetime", "limit": "100000000000000000", "period": "0" },
    "callPolicies": [
        {
            "target": "0x2222222222222222222222222222222222222222",
            "selector": "0xa9059cbb",
            "maxValuePerUse": "0",
            "valueLimit": { "limitType": "Unlimited", "limit": "0", "period": "0" },
            "constraints": [
                {
                    "condition": "Unconstrained",
                    "index": "1",
                    "refValue": "0x0000000000000000000000000000000000000000000000000000000000000000",
                    "limit": { "limitType": "Allowance", "limit": "1000", "period": "86400" }
                }
            ]
        }
    ],
    "transferPolicies": [
        {
            "target": "0x3333333333333333333333333333333333333333",
            "maxValuePerUse": "5",
            "valueLimit": { "limitType": 1, "limit": "50", "period": "0" }
        }
    ]
}"#;

fn sample() -> SessionSpec {
    from_json(SPEC_JSON).unwrap()
}

#[test]
fn parses_canonical_spec() {
    let spec = sample();
    assert_eq!(spec.expires_at, U256::from(1_749_040_108u64));
    assert_eq!(
        spec.fee_limit,
        UsageLimit::lifetime(U256::from(100_000_000_000_000_000u64))
    );
    let call = &spec.call_policies[0];
    assert_eq!(call.selector, TRANSFER_SELECTOR);
    assert_eq!(call.constraints[0].index, 1);
    assert_eq!(call.constraints[0].condition, Condition::Unconstrained);
    assert_eq!(
        call.constraints[0].limit,
        UsageLimit::allowance(U256::from(1000u64), U256::from(86_400u64)).unwrap()
    );
    // numeric discriminant accepted
    assert_eq!(
        spec.transfer_policies[0].value_limit,
        UsageLimit::lifetime(U256::from(50u64))
    );
}

#[test]
fn emits_exact_field_names_and_decimal_strings() {
    let value: serde_json::Value = serde_json::from_str(&to_json(&sample()).unwrap()).unwrap();
    let keys: Vec<&str> = value
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    for key in [
        "signer",
        "expiresAt",
        "feeLimit",
        "callPolicies",
        "transferPolicies",
    ] {
        assert!(keys.contains(&key), "missing {key}");
    }
    assert_eq!(value["expiresAt"], "1749040108");
    assert_eq!(value["feeLimit"]["limitType"], "Lifetime");
    assert_eq!(value["feeLimit"]["limit"], "100000000000000000");
    let constraint = &value["callPolicies"][0]["constraints"][0];
    assert_eq!(constraint["index"], "1");
    assert_eq!(constraint["limit"]["period"], "86400");
    assert!(constraint.get("refValue").is_some());
    assert_eq!(value["callPolicies"][0]["selector"], "0xa9059cbb");
    assert_eq!(value["transferPolicies"][0]["valueLimit"]["limitType"], "Lifetime");
}

#[test]
fn round_trip_preserves_spec() {
    let spec = sample();
    let again: SessionSpec = from_json(&to_json(&spec).unwrap()).unwrap();
    assert_eq!(spec, again);
}

#[test]
fn rejects_non_canonical_numbers() {
    for bad in ["\"01749040108\"", "1749040108", "\"1.749e9\"", "\"-1\"", "\"\""] {
        let json = SPEC_JSON.replace("\"1749040108\"", bad);
        let err = from_json::<SessionSpec>(&json).unwrap_err();
        assert_matches!(err, SsoError::Serialization { .. }, "{bad} accepted");
    }
}

#[test]
fn rejects_invalid_limits() {
    let zero_period = SPEC_JSON.replace("\"86400\"", "\"0\"");
    assert!(from_json::<SessionSpec>(&zero_period).is_err());

    let unknown_type = SPEC_JSON.replace("\"Lifetime\"", "\"Forever\"");
    assert!(from_json::<SessionSpec>(&unknown_type).is_err());
}

#[test]
fn keeps_fields_the_limit_type_ignores() {
    let json = SPEC_JSON
        .replace(
            r#""limitType": "Lifetime", "limit": "100000000000000000", "period": "0""#,
            r#""limitType": "Lifetime", "limit": "100000000000000000", "period": "86400""#,
        )
        .replace(
            r#"{ "limitType": "Unlimited", "limit": "0", "period": "0" }"#,
            r#"{ "limitType": "Unlimited", "limit": "5", "period": "0" }"#,
        );
    let spec: SessionSpec = from_json(&json).unwrap();
    assert_eq!(
        spec.fee_limit,
        UsageLimit::Lifetime {
            limit: U256::from(100_000_000_000_000_000u64),
            ignored_period: U256::from(86_400u64),
        }
    );
    assert_eq!(spec.fee_limit.period(), U256::ZERO);
    assert!(spec.call_policies[0].value_limit.is_unlimited());
    assert_ne!(spec, sample());

    let value: serde_json::Value = serde_json::from_str(&to_json(&spec).unwrap()).unwrap();
    assert_eq!(value["feeLimit"]["period"], "86400");
    assert_eq!(value["callPolicies"][0]["valueLimit"]["limit"], "5");
    let again: SessionSpec = from_json(&to_json(&spec).unwrap()).unwrap();
    assert_eq!(spec, again);
}

#[test]
fn rejects_malformed_address() {
    let json = SPEC_JSON.replace(
        "0x1111111111111111111111111111111111111111",
        "0x11111111111111111111111111111111111111",
    );
    assert!(from_json::<SessionSpec>(&json).is_err());
}

#[test]
fn parses_session_state() {
    let json = r#"{
        "status": 1,
        "feesRemaining": "40",
        "transferValue": [],
        "callValue": [
            {
                "remaining": "7",
                "target": "0x2222222222222222222222222222222222222222",
                "selector": "0xa9059cbb",
                "index": "0"
            }
        ],
        "callParams": []
    }"#;
    let state: SessionState = from_json(json).unwrap();
    assert_eq!(state.status, Status::Active);
    assert_eq!(state.fees_remaining, U256::from(40u64));
    assert_eq!(state.call_value[0].remaining, U256::from(7u64));

    let value: serde_json::Value = serde_json::from_str(&to_json(&state).unwrap()).unwrap();
    assert_eq!(value["status"], "Active");
    assert_eq!(value["feesRemaining"], "40");
}
