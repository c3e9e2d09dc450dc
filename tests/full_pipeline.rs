use obiadmit::{
    admit_message, equivalent, Engine, EngineConfig, IrKind, PipelineError, RejectionKind,
    UscnConfig, COST_THRESHOLD, OBI_CANONICAL_BUFFER_SIZE, WARNING_THRESHOLD,
};

fn engine() -> Engine {
    Engine::with_builtins(EngineConfig::default()).expect("builtin grammar compiles")
}

fn message_with_payload(payload: &str) -> String {
    format!(
        "OBI-PROTOCOL-1.0:SEC:{}SCHEMA:msg.1PAYLOAD|{}|{}AUDIT:1700000000000",
        "A".repeat(64),
        payload.len(),
        payload
    )
}

#[test]
fn happy_path_admits_with_expected_ir_and_cost() {
    let mut engine = engine();
    let admission =
        admit_message(&mut engine, message_with_payload("hello").as_bytes()).expect("admits");

    assert_eq!(
        admission.ir.kinds(),
        vec![
            IrKind::ProtocolMessage,
            IrKind::SecurityContext,
            IrKind::SchemaValidation,
            IrKind::PayloadBlock,
            IrKind::AuditRecord,
        ]
    );
    assert_eq!(admission.final_state, 7);
    assert!(
        admission.cost <= COST_THRESHOLD,
        "happy path should stay autonomous, got {}",
        admission.cost
    );
}

#[test]
fn path_traversal_variants_are_equivalent_and_admit_identically() {
    let cfg = UscnConfig::default();
    assert!(equivalent(b"%2e%2e%2f", b"../", &cfg));

    let plain = message_with_payload("up/../root");
    let encoded = plain.replace("../", "%2e%2e%2f");
    assert_ne!(plain, encoded);

    let mut engine_plain = engine();
    let mut engine_encoded = engine();
    let left = admit_message(&mut engine_plain, plain.as_bytes()).expect("plain admits");
    let right = admit_message(&mut engine_encoded, encoded.as_bytes()).expect("encoded admits");

    assert_eq!(left.ir, right.ir);
    assert_eq!(left.final_state, right.final_state);
}

#[test]
fn token_case_variants_admit_with_identical_ir() {
    let upper = message_with_payload("hello");
    let lower = upper.replace("SEC:", "sec:");
    assert_ne!(upper, lower);

    let mut engine_upper = engine();
    let mut engine_lower = engine();
    let left = admit_message(&mut engine_upper, upper.as_bytes()).expect("uppercase admits");
    let right = admit_message(&mut engine_lower, lower.as_bytes()).expect("lowercase admits");

    assert_eq!(left.ir, right.ir);
}

#[test]
fn short_token_rejects_with_no_match_at_the_token_offset() {
    let mut engine = engine();
    let message = format!(
        "OBI-PROTOCOL-1.0:SEC:{}SCHEMA:msg.1PAYLOAD|5|hello",
        "A".repeat(63)
    );
    let err = admit_message(&mut engine, message.as_bytes()).expect_err("63 hex digits reject");
    let rejection = match err {
        PipelineError::Rejected(rejection) => rejection,
        other => panic!("expected a rejection, got {other}"),
    };
    assert_eq!(rejection.kind, RejectionKind::NoMatch);
    assert_eq!(rejection.position, "obi-protocol-1.0:".len());
}

#[test]
fn budget_exhaustion_rejects_and_keeps_partial_ir() {
    let mut engine = engine();
    let err = admit_message(&mut engine, message_with_payload(&"x".repeat(300)).as_bytes())
        .expect_err("oversized payload exhausts the governance budget");
    let rejection = match err {
        PipelineError::Rejected(rejection) => rejection,
        other => panic!("expected a rejection, got {other}"),
    };
    assert!(matches!(
        rejection.kind,
        RejectionKind::BudgetExceeded { cost } if cost > WARNING_THRESHOLD
    ));
    assert_eq!(
        rejection.partial.kinds(),
        vec![
            IrKind::ProtocolMessage,
            IrKind::SecurityContext,
            IrKind::SchemaValidation,
        ]
    );
}

#[test]
fn overflowing_input_rejects_without_ir() {
    let mut engine = engine();
    let input = vec![b'a'; OBI_CANONICAL_BUFFER_SIZE + 1];
    let err = admit_message(&mut engine, &input).expect_err("overflow");
    let uscn_err = match err {
        PipelineError::Normalize(uscn_err) => uscn_err,
        other => panic!("expected a normalization failure, got {other}"),
    };
    assert_eq!(
        uscn_err,
        obiadmit::UscnError::BufferOverflow {
            limit: OBI_CANONICAL_BUFFER_SIZE
        }
    );
}
