use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// SUTS v4.0 uyumlu tek satır JSON log formatı.
/// Her satırda servis kimliği ve node bilgisi sabit olarak bulunur.
pub struct SutsFormatter {
    service_name: String,
    service_version: String,
    env: String,
    node_name: String,
}

impl SutsFormatter {
    pub fn new(service_name: String, service_version: String, env: String, node_name: String) -> Self {
        Self { service_name, service_version, env, node_name }
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    event_code: Option<String>,
    attributes: Map<String, Value>,
}

impl Visit for FieldCollector {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.attributes.insert(field.name().to_string(), json!(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.attributes.insert(field.name().to_string(), json!(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.attributes.insert(field.name().to_string(), json!(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.attributes.insert(field.name().to_string(), json!(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            "event" => self.event_code = Some(value.to_string()),
            name => {
                self.attributes.insert(name.to_string(), json!(value));
            }
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{:?}", value);
        match field.name() {
            "message" => self.message = Some(rendered),
            "event" => self.event_code = Some(rendered.trim_matches('"').to_string()),
            name => {
                self.attributes.insert(name.to_string(), json!(rendered));
            }
        }
    }
}

impl<S, N> FormatEvent<S, N> for SutsFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let meta = event.metadata();
        let mut line = Map::new();
        line.insert(
            "timestamp".to_string(),
            json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        line.insert("severity".to_string(), json!(meta.level().to_string()));
        line.insert(
            "service".to_string(),
            json!({
                "name": self.service_name,
                "version": self.service_version,
                "env": self.env,
            }),
        );
        line.insert("node".to_string(), json!({ "name": self.node_name }));
        if let Some(code) = fields.event_code {
            line.insert("event".to_string(), json!(code));
        }
        line.insert("message".to_string(), json!(fields.message.unwrap_or_default()));
        line.insert("target".to_string(), json!(meta.target()));
        if !fields.attributes.is_empty() {
            line.insert("attributes".to_string(), Value::Object(fields.attributes));
        }

        writeln!(writer, "{}", Value::Object(line))
    }
}
