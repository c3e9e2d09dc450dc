//! Umbrella crate for the OBI protocol admission engine.
//!
//! The `obiadmit` crate re-exports the normalization (`uscn`), pattern
//! registry (`registry`), and recognition (`engine`) layers so applications
//! can drive the full admission pipeline through a single dependency. The
//! helpers [`admit_message`] and [`export_spec`] orchestrate the stages
//! end-to-end with observability attached, while the stage crates remain
//! usable on their own for embedders that already manage their own
//! instrumentation.
//!
//! ## Quick start
//!
//! ```rust
//! use obiadmit::{admit_message, Engine, EngineConfig, IrKind};
//!
//! # fn demo() -> Result<(), obiadmit::PipelineError> {
//! let mut engine = Engine::with_builtins(EngineConfig::default())?;
//!
//! let message = format!(
//!     "OBI-PROTOCOL-1.0:SEC:{}SCHEMA:msg.1PAYLOAD|5|helloAUDIT:1700000000000",
//!     "A".repeat(64)
//! );
//! let admission = admit_message(&mut engine, message.as_bytes())?;
//!
//! assert_eq!(admission.ir.kinds()[0], IrKind::ProtocolMessage);
//! assert!(admission.cost <= 0.5);
//! # Ok(())
//! # }
//! ```
//!
//! ## Observability
//!
//! Latency and outcomes per stage can be captured by installing an
//! [`AdmissionMetrics`] recorder via [`set_admission_metrics`] and/or an
//! [`AdmissionEventLogger`] with [`set_admission_logger`]. Both hooks
//! receive the origin hash of the raw input and the concrete stage outcome,
//! so deployments can correlate admissions with upstream transport logs
//! without the engine ever learning about the transport. `AdmissionMetrics`
//! suits latency/histogram telemetry; `AdmissionEventLogger` provides
//! structured events for centralized logging, with [`KeyValueLogger`] as a
//! writer-backed default implementation.
//!
//! In typical services these hooks are registered once at startup,
//! alongside construction of the engines that share a pattern registry.
//!
//! ## Errors
//!
//! Failures from any layer converge on [`PipelineError`], which preserves
//! the stage error for downstream handling. A rejected admission is not an
//! exceptional condition: [`PipelineError::Rejected`] carries the full
//! structured [`Rejection`] including its partial IR.

pub use engine::{
    spec_document, transition_cost, Admission, CostAccumulator, DfaState, Engine, EngineConfig,
    ExportError, GovernanceSpec, GovernanceZone, IrKind, IrNode, IrStream, Rejection,
    RejectionKind, SpecDocument, SpecFormat, StateSpec, StateTable, Transition, TransitionSpec,
    TransitionValidator, UscnMappingSpec, COST_THRESHOLD, PROTOCOL_VERSION, REJECTED_STATE,
    SPEC_SCHEMA_VERSION, WARNING_THRESHOLD,
};
pub use registry::{
    BuiltinPattern, Pattern, PatternKind, Registry, RegistryError, BUILTIN_PATTERNS,
    OBI_MAX_PATTERN_LENGTH, OBI_MAX_STATES, OBI_MAX_TRANSITIONS, START_STATE_NAME,
};
pub use uscn::{
    equivalent, fold_whitespace, hash_origin_bytes, longest_match, normalize, CanonicalBuffer,
    EncodingRule, RiskClass, UscnConfig, UscnError, ENCODING_RULES, OBI_CANONICAL_BUFFER_SIZE,
};

pub mod config;

use chrono::{SecondsFormat, Utc};
use std::error::Error;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, OnceLock, RwLock};
use std::time::{Duration, Instant};

/// Errors that can occur while driving an input through the pipeline.
#[derive(Debug, Clone)]
pub enum PipelineError {
    /// Normalization failed before recognition began.
    Normalize(UscnError),
    /// The engine refused the admission.
    Rejected(Rejection),
    /// Registry or state-table construction failed.
    Registry(RegistryError),
    /// Spec export failed.
    Export(ExportError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Normalize(err) => write!(f, "normalization failure: {err}"),
            PipelineError::Rejected(err) => write!(f, "admission rejected: {err}"),
            PipelineError::Registry(err) => write!(f, "registry failure: {err}"),
            PipelineError::Export(err) => write!(f, "export failure: {err}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Normalize(err) => Some(err),
            PipelineError::Rejected(err) => Some(err),
            PipelineError::Registry(err) => Some(err),
            PipelineError::Export(err) => Some(err),
        }
    }
}

impl From<UscnError> for PipelineError {
    fn from(value: UscnError) -> Self {
        PipelineError::Normalize(value)
    }
}

impl From<Rejection> for PipelineError {
    fn from(value: Rejection) -> Self {
        PipelineError::Rejected(value)
    }
}

impl From<RegistryError> for PipelineError {
    fn from(value: RegistryError) -> Self {
        PipelineError::Registry(value)
    }
}

impl From<ExportError> for PipelineError {
    fn from(value: ExportError) -> Self {
        PipelineError::Export(value)
    }
}

/// Metrics observer for pipeline stages.
pub trait AdmissionMetrics: Send + Sync {
    fn record_normalize(&self, latency: Duration, result: Result<(), UscnError>);
    fn record_admit(&self, latency: Duration, result: Result<(), Rejection>);
    fn record_export(&self, latency: Duration, result: Result<(), ExportError>);
}

/// Processing stage captured in observability events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionStage {
    Normalize,
    Recognize,
    Export,
}

impl fmt::Display for AdmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdmissionStage::Normalize => "normalize",
            AdmissionStage::Recognize => "recognize",
            AdmissionStage::Export => "export",
        };
        f.write_str(name)
    }
}

/// Outcome of a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Success,
    Failure,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StageStatus::Success => "success",
            StageStatus::Failure => "failure",
        };
        f.write_str(label)
    }
}

/// Structured observation describing the outcome of a pipeline stage.
#[derive(Debug, Clone)]
pub struct StageEvent {
    pub stage: AdmissionStage,
    pub status: StageStatus,
    pub latency: Duration,
    /// Version-aware hash of the raw input driving this admission, when the
    /// stage had one to report.
    pub origin_hash: Option<String>,
    pub error: Option<String>,
}

impl StageEvent {
    fn from_outcome(
        stage: AdmissionStage,
        origin_hash: Option<String>,
        latency: Duration,
        error: Option<String>,
    ) -> Self {
        let status = if error.is_some() {
            StageStatus::Failure
        } else {
            StageStatus::Success
        };
        Self {
            stage,
            status,
            latency,
            origin_hash,
            error,
        }
    }

    fn format_key_values(&self, include_timestamp: bool) -> String {
        let mut parts = Vec::new();
        if include_timestamp {
            let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            parts.push(format!("timestamp=\"{ts}\""));
        }
        let stage = self.stage;
        parts.push(format!("stage={stage}"));
        let status = self.status;
        parts.push(format!("status={status}"));
        let latency_us = self.latency.as_micros();
        parts.push(format!("latency_us={latency_us}"));
        if let Some(origin) = &self.origin_hash {
            parts.push(format!("origin=\"{origin}\""));
        }
        if let Some(error) = &self.error {
            let error = escape_kv(error);
            parts.push(format!("error=\"{error}\""));
        }
        parts.join(" ")
    }
}

fn escape_kv(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Hook for emitting structured events per pipeline stage.
pub trait AdmissionEventLogger: Send + Sync {
    fn log(&self, event: &StageEvent);
}

/// Simple key-value logger that writes structured events to any writer.
pub struct KeyValueLogger {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    include_timestamp: bool,
}

impl KeyValueLogger {
    /// Create a logger that writes to stdout.
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Create a logger backed by the provided writer.
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
            include_timestamp: true,
        }
    }

    /// Toggle timestamp emission for the structured log line.
    pub fn with_timestamps(mut self, include_timestamp: bool) -> Self {
        self.include_timestamp = include_timestamp;
        self
    }
}

impl AdmissionEventLogger for KeyValueLogger {
    fn log(&self, event: &StageEvent) {
        if let Ok(mut writer) = self.writer.lock() {
            let line = event.format_key_values(self.include_timestamp);
            let _ = writeln!(writer, "{line}");
        }
    }
}

/// Install or clear the global admission metrics recorder.
pub fn set_admission_metrics(recorder: Option<Arc<dyn AdmissionMetrics>>) {
    let lock = metrics_lock();
    let mut guard = lock
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn AdmissionMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn AdmissionMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn AdmissionMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the structured admission event logger.
pub fn set_admission_logger(logger: Option<Arc<dyn AdmissionEventLogger>>) {
    let lock = logger_lock();
    let mut guard = lock
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = logger;
}

fn logger_lock() -> &'static RwLock<Option<Arc<dyn AdmissionEventLogger>>> {
    static LOGGER: OnceLock<RwLock<Option<Arc<dyn AdmissionEventLogger>>>> = OnceLock::new();
    LOGGER.get_or_init(|| RwLock::new(None))
}

fn admission_logger() -> Option<Arc<dyn AdmissionEventLogger>> {
    let guard = logger_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

struct StageSpan {
    recorder: Option<Arc<dyn AdmissionMetrics>>,
    logger: Option<Arc<dyn AdmissionEventLogger>>,
    stage: AdmissionStage,
    origin_hash: Option<String>,
    start: Instant,
}

impl StageSpan {
    fn start(stage: AdmissionStage, origin_hash: Option<String>) -> Option<Self> {
        let recorder = metrics_recorder();
        let logger = admission_logger();
        if recorder.is_none() && logger.is_none() {
            return None;
        }
        Some(Self {
            recorder,
            logger,
            stage,
            origin_hash,
            start: Instant::now(),
        })
    }

    fn set_origin(&mut self, origin_hash: &str) {
        self.origin_hash = Some(origin_hash.to_owned());
    }

    fn record_normalize(self, result: Result<(), UscnError>) {
        let latency = self.start.elapsed();
        self.emit_event(latency, result.as_ref().err().map(|e| e.to_string()));
        if let Some(recorder) = self.recorder {
            recorder.record_normalize(latency, result);
        }
    }

    fn record_admit(self, result: Result<(), Rejection>) {
        let latency = self.start.elapsed();
        self.emit_event(latency, result.as_ref().err().map(|e| e.to_string()));
        if let Some(recorder) = self.recorder {
            recorder.record_admit(latency, result);
        }
    }

    fn record_export(self, result: Result<(), ExportError>) {
        let latency = self.start.elapsed();
        self.emit_event(latency, result.as_ref().err().map(|e| e.to_string()));
        if let Some(recorder) = self.recorder {
            recorder.record_export(latency, result);
        }
    }

    fn emit_event(&self, latency: Duration, error: Option<String>) {
        if let Some(logger) = self.logger.as_ref() {
            let event =
                StageEvent::from_outcome(self.stage, self.origin_hash.clone(), latency, error);
            logger.log(&event);
        }
    }
}

/// Drive raw bytes through normalization and recognition on `engine`.
///
/// Both stages report to the installed metrics recorder and event logger.
/// The canonical buffer is dropped before this function returns; the IR in
/// the returned [`Admission`] owns copies of everything it references.
pub fn admit_message(engine: &mut Engine, input: &[u8]) -> Result<Admission, PipelineError> {
    // --- Normalize stage ---
    let mut normalize_span = StageSpan::start(AdmissionStage::Normalize, None);
    let canonical = match normalize(input, &engine.config().uscn) {
        Ok(buffer) => {
            if let Some(span) = normalize_span.as_mut() {
                span.set_origin(&buffer.origin_hash);
            }
            if let Some(span) = normalize_span.take() {
                span.record_normalize(Ok(()));
            }
            buffer
        }
        Err(err) => {
            if let Some(span) = normalize_span.take() {
                span.record_normalize(Err(err.clone()));
            }
            return Err(PipelineError::Normalize(err));
        }
    };

    // --- Recognize stage ---
    let mut admit_span = StageSpan::start(
        AdmissionStage::Recognize,
        Some(canonical.origin_hash.clone()),
    );
    match engine.admit_canonical(&canonical) {
        Ok(admission) => {
            if let Some(span) = admit_span.take() {
                span.record_admit(Ok(()));
            }
            Ok(admission)
        }
        Err(rejection) => {
            if let Some(span) = admit_span.take() {
                span.record_admit(Err(rejection.clone()));
            }
            Err(PipelineError::Rejected(rejection))
        }
    }
}

/// Serialize `engine`'s recognizer spec with observability attached.
pub fn export_spec(engine: &Engine, format: SpecFormat) -> Result<String, PipelineError> {
    let mut span = StageSpan::start(AdmissionStage::Export, None);
    match engine.export_spec(format) {
        Ok(document) => {
            if let Some(span) = span.take() {
                span.record_export(Ok(()));
            }
            Ok(document)
        }
        Err(err) => {
            if let Some(span) = span.take() {
                span.record_export(Err(err.clone()));
            }
            Err(PipelineError::Export(err))
        }
    }
}
