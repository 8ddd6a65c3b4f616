//! InfluxDB line protocol rendering.
//!
//! `measurement,tag=v,tag=v field=v,field=v timestamp_ns`
//!
//! Tags come out sorted by key (the map is a `BTreeMap`), which is also the
//! order the backend prefers for write performance. Tags with an empty value
//! are left out because the protocol has no way to express them. Backslashes
//! are doubled so a value ending in `\` cannot escape the next separator.

use std::fmt::Write;

use super::{FieldValue, MetricPoint};

/// Render a batch, one point per line.
pub fn encode(points: &[MetricPoint]) -> String {
    let mut out = String::with_capacity(points.len() * 256);
    for point in points {
        encode_point(point, &mut out);
        out.push('\n');
    }
    out
}

fn encode_point(point: &MetricPoint, out: &mut String) {
    out.push_str(&escape_measurement(&point.measurement));

    for (key, value) in &point.tags {
        let value = value.render();
        if value.is_empty() {
            continue;
        }
        let _ = write!(out, ",{}={}", escape_key(key), escape_key(&value));
    }

    out.push(' ');
    let mut first = true;
    for (key, value) in &point.fields {
        if !first {
            out.push(',');
        }
        first = false;
        let _ = match value {
            FieldValue::Integer(v) => write!(out, "{}={}i", escape_key(key), v),
            FieldValue::Str(s) => write!(out, "{}=\"{}\"", escape_key(key), escape_string_field(s)),
        };
    }

    if let Some(ns) = point.time.timestamp_nanos_opt() {
        let _ = write!(out, " {ns}");
    }
}

fn escape_measurement(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace(' ', "\\ ")
}

/// Tag keys, tag values and field keys share one escaping rule.
fn escape_key(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

fn escape_string_field(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
