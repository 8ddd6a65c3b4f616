use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::{MetricPoint, MetricsWriter};
use crate::error::Result;
use crate::redis_client;

/// Hands points to a Redis list for a separate worker to deliver.
///
/// Each point is pushed as one JSON document shaped like
/// `{"measurement":..,"tags":{..},"fields":{..},"time":..}`.
pub struct QueueWriter {
    conn: ConnectionManager,
    key: String,
}

impl QueueWriter {
    pub async fn connect(url: &str, key: &str) -> Result<Self> {
        let conn = redis_client::connect(url).await?;
        tracing::info!(%key, "metrics queue connected");
        Ok(Self {
            conn,
            key: key.to_owned(),
        })
    }
}

#[async_trait]
impl MetricsWriter for QueueWriter {
    async fn submit(&self, points: &[MetricPoint]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let payloads = encode_payloads(points)?;

        let mut conn = self.conn.clone();
        let _: () = conn.lpush(&self.key, payloads).await?;
        Ok(())
    }
}

fn encode_payloads(points: &[MetricPoint]) -> Result<Vec<String>> {
    points
        .iter()
        .map(|p| serde_json::to_string(p).map_err(Into::into))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    use super::*;
    use crate::metrics::{FieldValue, TagValue};

    #[test]
    fn payload_keeps_point_shape() {
        let point = MetricPoint {
            measurement: "django_request".into(),
            tags: BTreeMap::from([
                ("is_staff".to_owned(), TagValue::Bool(true)),
                ("method".to_owned(), TagValue::from("GET")),
            ]),
            fields: BTreeMap::from([("value".to_owned(), FieldValue::Integer(42))]),
            time: Utc.timestamp_opt(0, 0).unwrap(),
        };

        let payloads = encode_payloads(&[point.clone()]).expect("serializable");
        let json: Value = serde_json::from_str(&payloads[0]).expect("valid json");
        assert_eq!(json["measurement"], "django_request");
        assert_eq!(json["tags"]["is_staff"], true);
        assert_eq!(json["tags"]["method"], "GET");
        assert_eq!(json["fields"]["value"], 42);

        let back: MetricPoint = serde_json::from_str(&payloads[0]).expect("decodes");
        assert_eq!(back, point);
    }
}
