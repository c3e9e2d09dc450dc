use std::str::FromStr;

use obiadmit::{
    admit_message, export_spec, Engine, EngineConfig, ExportError, PatternKind, PipelineError,
    Registry, RegistryError, RejectionKind, SpecFormat, OBI_MAX_PATTERN_LENGTH, OBI_MAX_STATES,
};

fn engine() -> Engine {
    Engine::with_builtins(EngineConfig::default()).expect("builtin grammar compiles")
}

fn expect_rejection(err: PipelineError) -> obiadmit::Rejection {
    match err {
        PipelineError::Rejected(rejection) => rejection,
        other => panic!("expected a rejection, got {other}"),
    }
}

#[test]
fn empty_input_is_rejected_as_invalid() {
    let mut engine = engine();
    let rejection = expect_rejection(admit_message(&mut engine, b"").expect_err("empty input"));
    assert_eq!(rejection.kind, RejectionKind::InvalidInput);
    assert_eq!(rejection.position, 0);
    assert!(rejection.partial.is_empty());
}

#[test]
fn unrecognized_leading_bytes_report_their_offset() {
    let mut engine = engine();
    let rejection =
        expect_rejection(admit_message(&mut engine, b"garbage header").expect_err("rejects"));
    assert_eq!(rejection.kind, RejectionKind::NoMatch);
    assert_eq!(rejection.position, 0);
}

#[test]
fn raw_admission_under_zero_trust_is_unnormalized() {
    let mut engine = engine();
    let rejection = engine
        .admit_raw(b"obi-protocol-1.0:whatever")
        .expect_err("raw path under zero trust");
    assert_eq!(rejection.kind, RejectionKind::Unnormalized);
}

#[test]
fn registry_rejects_oversized_and_malformed_patterns() {
    let mut registry = Registry::with_builtins().expect("builtins compile");

    let oversized = "x".repeat(OBI_MAX_PATTERN_LENGTH + 1);
    assert!(matches!(
        registry.register(PatternKind::DataPayload, &oversized),
        Err(RegistryError::PatternTooLong { .. })
    ));

    assert!(matches!(
        registry.register(PatternKind::DataPayload, "(unclosed"),
        Err(RegistryError::InvalidPattern(_))
    ));
}

#[test]
fn registry_exhaustion_is_an_init_time_error() {
    let mut registry = Registry::new();
    for _ in 0..OBI_MAX_STATES - 1 {
        registry
            .register(PatternKind::CanonicalDelimiter, "x")
            .expect("under the state bound");
    }
    assert!(matches!(
        registry.register(PatternKind::CanonicalDelimiter, "x"),
        Err(RegistryError::Full { .. })
    ));
}

#[test]
fn unsupported_export_formats_are_typed_errors() {
    let engine = engine();

    let err = export_spec(&engine, SpecFormat::CHeader).expect_err("c-header is unimplemented");
    assert!(matches!(
        err,
        PipelineError::Export(ExportError::UnsupportedFormat(_))
    ));

    assert!(matches!(
        SpecFormat::from_str("protobuf"),
        Err(ExportError::UnsupportedFormat(name)) if name == "protobuf"
    ));
}

#[test]
fn rejection_carries_cost_and_parks_the_engine() {
    let mut engine = engine();
    let rejection =
        expect_rejection(admit_message(&mut engine, b"junk").expect_err("junk rejects"));

    // The structural prelude was charged before recognition failed.
    assert!(rejection.cost > 0.0);
    assert!(engine.is_rejected());
    assert!((engine.cost() - rejection.cost).abs() < 1e-12);

    engine.reset();
    assert!(!engine.is_rejected());
}
