use crate::error::PointError;
use chrono::Utc;
use std::{
    collections::BTreeMap,
    fmt::{
        self,
        Write as _,
    },
};

/// Scalar payload of a point.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

impl FieldValue {
    /// Maps user supplied JSON data to a field. `null` has no field representation, nested values are kept as
    /// their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Boolean(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Integer(i)),
                None => n.as_f64().map(Self::Float),
            },
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Array(_) | Value::Object(_) => Some(Self::String(value.to_string())),
        }
    }

    fn write_line(&self, out: &mut String) {
        match self {
            Self::Integer(i) => {
                let _ = write!(out, "{i}i");
            }
            Self::Float(f) => {
                let _ = write!(out, "{f}");
            }
            Self::Boolean(b) => {
                let _ = write!(out, "{b}");
            }
            Self::String(s) => {
                out.push('"');
                for c in s.chars() {
                    if matches!(c, '"' | '\\') {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push('"');
            }
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<usize> for FieldValue {
    fn from(value: usize) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

/// One time-series sample. Always carries at least one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    timestamp: i64,
}

impl Point {
    pub fn builder(measurement: impl Into<String>) -> PointBuilder {
        PointBuilder::new(measurement)
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Epoch nanoseconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Line protocol: `measurement[,tag=value...] field=value[,field=value...] timestamp`.
    pub fn to_line(&self) -> String {
        let mut line = String::with_capacity(64);
        escape_into(&mut line, &self.measurement, &[',', ' ']);
        for (key, value) in &self.tags {
            line.push(',');
            escape_into(&mut line, key, &[',', '=', ' ']);
            line.push('=');
            escape_into(&mut line, value, &[',', '=', ' ']);
        }
        line.push(' ');
        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            escape_into(&mut line, key, &[',', '=', ' ']);
            line.push('=');
            value.write_line(&mut line);
        }
        let _ = write!(line, " {}", self.timestamp);
        line
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

/// Line breaks cannot be escaped in names and tag values, they become (escaped) spaces. An odd run of trailing
/// backslashes gets one more, so it cannot escape the separator that follows.
fn escape_into(out: &mut String, value: &str, special: &[char]) {
    for c in value.chars() {
        let c = if matches!(c, '\n' | '\r') { ' ' } else { c };
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    let trailing = value.chars().rev().take_while(|&c| c == '\\').count();
    if trailing % 2 == 1 {
        out.push('\\');
    }
}

/// Joins a batch into a single write request body.
pub fn to_line_protocol(points: &[Point]) -> String {
    points.iter().map(Point::to_line).collect::<Vec<_>>().join("\n")
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

#[derive(Debug, Clone)]
pub struct PointBuilder {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    timestamp: Option<i64>,
    sanitize_tags: bool,
}

impl PointBuilder {
    fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp: None,
            sanitize_tags: false,
        }
    }

    /// Tags with an empty key or value are dropped, InfluxDB rejects them.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value) = (key.into(), value.into());
        if key.is_empty() || value.is_empty() {
            trace!(measurement = %self.measurement, %key, "dropping empty tag");
        } else {
            self.tags.insert(key, value);
        }
        self
    }

    pub fn tags<K, V>(self, tags: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        tags.into_iter().fold(self, |builder, (key, value)| builder.tag(key, value))
    }

    /// Non-finite floats are dropped, they have no line protocol representation.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let (key, value) = (key.into(), value.into());
        match value {
            FieldValue::Float(f) if !f.is_finite() => {
                debug!(measurement = %self.measurement, %key, value = f, "dropping non-finite field");
            }
            _ if key.is_empty() => {}
            value => {
                self.fields.insert(key, value);
            }
        }
        self
    }

    pub fn optional_field<V: Into<FieldValue>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.field(key, value),
            None => self,
        }
    }

    pub fn fields<K, V>(self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        fields.into_iter().fold(self, |builder, (key, value)| builder.field(key, value))
    }

    /// Epoch nanoseconds. Defaults to the time of [`PointBuilder::build`].
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Replace dashes with underscores in tag values.
    pub fn sanitize_tags(mut self, sanitize: bool) -> Self {
        self.sanitize_tags = sanitize;
        self
    }

    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    pub fn build(self) -> Result<Point, PointError> {
        if self.measurement.is_empty() {
            return Err(PointError::EmptyMeasurement);
        }
        if self.fields.is_empty() {
            return Err(PointError::NoFields(self.measurement));
        }

        let tags = if self.sanitize_tags {
            self.tags
                .into_iter()
                .map(|(key, value)| (key, value.replace('-', "_")))
                .collect()
        } else {
            self.tags
        };

        Ok(Point {
            measurement: self.measurement,
            tags,
            fields: self.fields,
            timestamp: self
                .timestamp
                .unwrap_or_else(|| Utc::now().timestamp_nanos_opt().unwrap_or_default()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn line_protocol_of_simple_point() {
        let point = Point::builder("ci_metrics")
            .tag("env", "ci")
            .field("x", 3.14)
            .timestamp(1_700_000_000_000_000_000)
            .build()
            .unwrap();

        assert_eq!(point.to_line(), "ci_metrics,env=ci x=3.14 1700000000000000000");
        assert_eq!(point.tag("env"), Some("ci"));
        assert_eq!(point.field("x"), Some(&FieldValue::Float(3.14)));
    }

    #[test]
    fn field_kinds_are_type_tagged() {
        let point = Point::builder("m")
            .field("count", 3i64)
            .field("ratio", 0.5)
            .field("ok", true)
            .field("name", "job")
            .timestamp(1)
            .build()
            .unwrap();

        assert_eq!(point.to_line(), r#"m count=3i,name="job",ok=true,ratio=0.5 1"#);
    }

    #[test]
    fn special_characters_are_escaped() {
        let point = Point::builder("my measurement,1")
            .tag("tag key", "a=b,c")
            .field("field key", r#"say "hi" \o/"#)
            .timestamp(7)
            .build()
            .unwrap();

        assert_eq!(
            point.to_line(),
            r#"my\ measurement\,1,tag\ key=a\=b\,c field\ key="say \"hi\" \\o/" 7"#
        );
    }

    #[test]
    fn line_breaks_and_trailing_backslashes_stay_on_one_line() {
        let point = Point::builder("m")
            .tag("branch", "feat\nx")
            .tag("dir", "C:\\ws\\")
            .field("v", 1)
            .timestamp(5)
            .build()
            .unwrap();
        assert_eq!(point.to_line(), r"m,branch=feat\ x,dir=C:\ws\\ v=1i 5");

        let point = Point::builder("build\r\nlog")
            .tag("share", r"\\server\")
            .tag("even", r"a\\")
            .field("multi\nline", "first\nsecond")
            .timestamp(5)
            .build()
            .unwrap();
        assert_eq!(
            point.to_line(),
            "build\\ \\ log,even=a\\\\,share=\\\\server\\\\ multi\\ line=\"first\nsecond\" 5"
        );
    }

    #[test]
    fn point_without_fields_is_rejected() {
        let result = Point::builder("empty").tag("env", "ci").build();
        assert_eq!(result, Err(PointError::NoFields("empty".to_string())));

        let result = Point::builder("nan").field("x", f64::NAN).build();
        assert_eq!(result, Err(PointError::NoFields("nan".to_string())));

        assert_eq!(Point::builder("").field("x", 1).build(), Err(PointError::EmptyMeasurement));
    }

    #[test]
    fn sanitized_tags_replace_dashes() {
        let point = Point::builder("m")
            .tag("project_name", "my-project")
            .tag("empty", "")
            .field("x", 1)
            .sanitize_tags(true)
            .timestamp(1)
            .build()
            .unwrap();

        assert_eq!(point.tag("project_name"), Some("my_project"));
        assert_eq!(point.tag("empty"), None);
    }

    #[test]
    fn json_values_map_to_fields() {
        use serde_json::json;
        assert_eq!(FieldValue::from_json(&json!(1)), Some(FieldValue::Integer(1)));
        assert_eq!(FieldValue::from_json(&json!(1.5)), Some(FieldValue::Float(1.5)));
        assert_eq!(FieldValue::from_json(&json!("x")), Some(FieldValue::String("x".into())));
        assert_eq!(FieldValue::from_json(&json!(false)), Some(FieldValue::Boolean(false)));
        assert_eq!(FieldValue::from_json(&json!(null)), None);
        assert_eq!(
            FieldValue::from_json(&json!([1, 2])),
            Some(FieldValue::String("[1,2]".into()))
        );
    }

    #[test]
    fn batch_is_newline_separated() {
        let points = vec![
            Point::builder("a").field("x", 1).timestamp(1).build().unwrap(),
            Point::builder("b").field("y", 2).timestamp(1).build().unwrap(),
        ];
        assert_eq!(to_line_protocol(&points), "a x=1i 1\nb y=2i 1");
    }
}
