#![forbid(unsafe_code)]

//! Structured logging emitted by the field engine.
//!
//! Verifies levels and fields of the commit, veto, replay and rejection
//! events, and that listener fan-out runs inside `styleform.notify`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use styleform_core::{DataType, FieldKind};
use styleform_runtime::{Field, FieldRegistry, UndoContext};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Capture infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    fields: HashMap<String, String>,
    parent_span_name: Option<String>,
}

#[derive(Default)]
struct Captured {
    spans: Vec<CapturedSpan>,
    events: Vec<CapturedEvent>,
}

struct SpanCapture {
    captured: Arc<Mutex<Captured>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for SpanCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        self.captured.lock().unwrap().spans.push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.get("message").cloned().unwrap_or_default();
        let parent_span_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span| span.name().to_string());
        self.captured.lock().unwrap().events.push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            fields,
            parent_span_name,
        });
    }
}

fn with_captured_tracing(f: impl FnOnce()) -> Captured {
    let captured = Arc::new(Mutex::new(Captured::default()));
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(SpanCapture {
            captured: Arc::clone(&captured),
        });
    tracing::subscriber::with_default(subscriber, || {
        tracing::callsite::rebuild_interest_cache();
        f();
    });
    let mut guard = captured.lock().unwrap();
    std::mem::take(&mut *guard)
}

fn events_with<'a>(captured: &'a Captured, message: &str) -> Vec<&'a CapturedEvent> {
    captured
        .events
        .iter()
        .filter(|e| e.message == message)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn commit_is_logged_at_debug_with_before_and_after() {
    let captured = with_captured_tracing(|| {
        let ctx = UndoContext::new();
        let registry = FieldRegistry::new(&ctx);
        let field = registry.add(FieldKind::StrokeWidth, Field::new(DataType::Double));
        field.populate(2.0);
    });

    let commits = events_with(&captured, "field value committed");
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].level, tracing::Level::DEBUG);
    assert_eq!(commits[0].fields.get("field").map(String::as_str), Some("stroke_width"));
    assert_eq!(commits[0].fields.get("before").map(String::as_str), Some("0.0"));
    assert_eq!(commits[0].fields.get("after").map(String::as_str), Some("2.0"));
    assert_eq!(events_with(&captured, "undo entry recorded").len(), 1);
}

#[test]
fn no_op_is_trace_only() {
    let captured = with_captured_tracing(|| {
        let ctx = UndoContext::new();
        let registry = FieldRegistry::new(&ctx);
        let field = registry.add(FieldKind::Label, Field::new(DataType::String));
        field.populate("");
    });
    let no_ops = events_with(&captured, "populate left value unchanged");
    assert_eq!(no_ops.len(), 1);
    assert_eq!(no_ops[0].level, tracing::Level::TRACE);
    assert!(events_with(&captured, "field value committed").is_empty());
}

#[test]
fn rejected_input_is_a_warning() {
    let captured = with_captured_tracing(|| {
        let ctx = UndoContext::new();
        let registry = FieldRegistry::new(&ctx);
        let field = registry.add(FieldKind::FillColour, Field::new(DataType::Colour));
        field.populate("red");
    });
    let warnings: Vec<_> = captured
        .events
        .iter()
        .filter(|e| e.level == tracing::Level::WARN)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].fields.contains_key("error"));
}

#[test]
fn veto_reason_is_reported() {
    let captured = with_captured_tracing(|| {
        let ctx = UndoContext::new();
        let registry = FieldRegistry::new(&ctx);
        let field = registry.add(FieldKind::Name, Field::new(DataType::String));
        ctx.set_population_check(|| true);
        field.populate("x");
    });
    let vetoes = events_with(&captured, "undo entry not recorded");
    assert_eq!(vetoes.len(), 1);
    assert_eq!(
        vetoes[0].fields.get("reason").map(String::as_str),
        Some("population_check")
    );
}

#[test]
fn listeners_run_inside_notify_span() {
    let captured = with_captured_tracing(|| {
        let ctx = UndoContext::new();
        let registry = FieldRegistry::new(&ctx);
        let field = registry.add(FieldKind::Size, Field::new(DataType::Integer));
        let _a = field.subscribe(|_| tracing::info!("listener a"));
        let _b = field.subscribe(|_| tracing::info!("listener b"));
        field.populate(3);
        ctx.undo();
    });

    let spans: Vec<_> = captured
        .spans
        .iter()
        .filter(|s| s.name == "styleform.notify")
        .collect();
    assert_eq!(spans.len(), 2, "one span per commit and per replay");
    assert_eq!(spans[0].fields.get("listeners").map(String::as_str), Some("2"));
    assert_eq!(spans[0].fields.get("field").map(String::as_str), Some("size"));

    for event in events_with(&captured, "listener a") {
        assert_eq!(event.parent_span_name.as_deref(), Some("styleform.notify"));
    }
    assert_eq!(events_with(&captured, "replaying undo entry").len(), 1);
}

#[test]
fn recording_guard_is_reported_by_its_own_name() {
    let captured = with_captured_tracing(|| {
        let ctx = UndoContext::new();
        let registry = FieldRegistry::new(&ctx);
        let field = registry.add(FieldKind::Name, Field::new(DataType::String));
        let _recording = ctx.suppress_recording();
        field.populate("x");
    });
    let vetoes = events_with(&captured, "undo entry not recorded");
    assert_eq!(vetoes.len(), 1);
    assert_eq!(
        vetoes[0].fields.get("reason").map(String::as_str),
        Some("recording_suppressed")
    );
}
