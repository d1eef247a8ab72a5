//! Request-scoped structured logging.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use gambit_core::{LogFormat, RequestId};
use serde::Serialize;
use serde_json::Value;

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// One rendered event. Extra fields are flattened into the JSON object.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
    /// Microseconds since the logger was created.
    pub elapsed_us: u64,
}

impl LogEntry {
    /// Single-line JSON object.
    pub fn json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }

    /// `[request] message (Nus) | key=value ...`
    pub fn human_line(&self) -> String {
        let mut line = format!(
            "[{}] {} ({}us)",
            self.request_id, self.message, self.elapsed_us
        );

        let mut fields = self.fields.iter();
        if let Some((key, value)) = fields.next() {
            line.push_str(" | ");
            push_field(&mut line, key, value);
            for (key, value) in fields {
                line.push(' ');
                push_field(&mut line, key, value);
            }
        }
        line
    }
}

fn push_field(line: &mut String, key: &str, value: &Value) {
    line.push_str(key);
    line.push('=');
    match value {
        Value::String(text) => line.push_str(text),
        other => line.push_str(&other.to_string()),
    }
}

/// Logger bound to one request.
///
/// Events are rendered in the configured format and handed to `tracing` at
/// the matching level, so the installed subscriber decides where they go.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    request_id: RequestId,
    component: Option<String>,
    route: Option<String>,
    started: Instant,
    min_level: LogLevel,
    format: LogFormat,
}

impl StructuredLogger {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            component: None,
            route: None,
            started: Instant::now(),
            min_level: LogLevel::Info,
            format: LogFormat::Human,
        }
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Events below `level` are dropped.
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Start an event at `level`.
    pub fn event(&self, level: LogLevel, message: impl Into<String>) -> LogEvent<'_> {
        LogEvent {
            logger: self,
            level,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Render an event, or `None` when `level` is below the minimum.
    pub fn render(
        &self,
        level: LogLevel,
        message: &str,
        fields: BTreeMap<String, Value>,
    ) -> Option<String> {
        if level < self.min_level {
            return None;
        }

        let entry = LogEntry {
            level,
            message: message.to_string(),
            request_id: self.request_id.to_string(),
            component: self.component.clone(),
            route: self.route.clone(),
            fields,
            elapsed_us: self.started.elapsed().as_micros() as u64,
        };

        Some(match self.format {
            LogFormat::Json => entry.json_line(),
            LogFormat::Human => entry.human_line(),
        })
    }

    fn dispatch(&self, level: LogLevel, message: &str, fields: BTreeMap<String, Value>) {
        let Some(line) = self.render(level, message, fields) else {
            return;
        };

        match level {
            LogLevel::Trace => tracing::trace!("{}", line),
            LogLevel::Debug => tracing::debug!("{}", line),
            LogLevel::Info => tracing::info!("{}", line),
            LogLevel::Warn => tracing::warn!("{}", line),
            LogLevel::Error => tracing::error!("{}", line),
        }
    }
}

/// Pending event with typed fields.
pub struct LogEvent<'a> {
    logger: &'a StructuredLogger,
    level: LogLevel,
    message: String,
    fields: BTreeMap<String, Value>,
}

impl LogEvent<'_> {
    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.insert(key.to_string(), Value::String(value.into()));
        self
    }

    pub fn field_u64(mut self, key: &str, value: u64) -> Self {
        self.fields.insert(key.to_string(), Value::from(value));
        self
    }

    pub fn render(self) -> Option<String> {
        self.logger.render(self.level, &self.message, self.fields)
    }

    pub fn emit(self) {
        self.logger.dispatch(self.level, &self.message, self.fields);
    }
}
