//! Span capture for asserting on the spans the resolver emits.
//!
//! Provides a `SpanCaptureLayer` that records span names, levels, parents
//! and fields, including fields recorded after the span was created.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::span::{Attributes, Id, Record};
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// A recorded span.
#[derive(Debug, Clone)]
pub struct CapturedSpan {
    pub id: u64,
    pub name: &'static str,
    pub level: tracing::Level,
    pub fields: HashMap<String, String>,
    pub parent_name: Option<String>,
}

/// Shared storage for captured spans.
#[derive(Debug, Clone, Default)]
pub struct SpanStore(Arc<Mutex<Vec<CapturedSpan>>>);

impl SpanStore {
    /// Span names in order of creation.
    pub fn span_names(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().iter().map(|s| s.name).collect()
    }

    pub fn has_span(&self, name: &str) -> bool {
        self.0.lock().unwrap().iter().any(|s| s.name == name)
    }

    /// The first span with the given name, if any.
    pub fn find_span(&self, name: &str) -> Option<CapturedSpan> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.name == name)
            .cloned()
    }

    /// A field of the first span with the given name.
    pub fn field(&self, span: &str, field: &str) -> Option<String> {
        self.find_span(span)?.fields.get(field).cloned()
    }
}

struct SpanCaptureLayer {
    store: SpanStore,
}

struct FieldVisitor<'a>(&'a mut HashMap<String, String>);

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }
}

impl<S> Layer<S> for SpanCaptureLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut fields = HashMap::new();
        attrs.record(&mut FieldVisitor(&mut fields));

        let parent_name = attrs
            .parent()
            .and_then(|pid| ctx.span(pid))
            .map(|span| span.name().to_string())
            .or_else(|| ctx.lookup_current().map(|span| span.name().to_string()));

        let meta = attrs.metadata();
        self.store.0.lock().unwrap().push(CapturedSpan {
            id: id.into_u64(),
            name: meta.name(),
            level: *meta.level(),
            fields,
            parent_name,
        });
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
        let mut spans = self.store.0.lock().unwrap();
        if let Some(span) = spans.iter_mut().rev().find(|s| s.id == id.into_u64()) {
            values.record(&mut FieldVisitor(&mut span.fields));
        }
    }
}

/// Install a span-capturing subscriber for the current thread.
///
/// Hold the guard for the duration of the test. Use a `current_thread`
/// runtime so spans from all async work land on this thread.
pub fn init_test_tracing() -> (SpanStore, tracing::subscriber::DefaultGuard) {
    use tracing_subscriber::layer::SubscriberExt;

    let store = SpanStore::default();
    let subscriber = tracing_subscriber::registry().with(SpanCaptureLayer {
        store: store.clone(),
    });
    let guard = tracing::subscriber::set_default(subscriber);
    (store, guard)
}
