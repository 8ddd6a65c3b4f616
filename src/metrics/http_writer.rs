use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use super::{line_protocol, MetricPoint, MetricsWriter};
use crate::error::{MetricsError, Result};

/// Writes points straight to an InfluxDB `/write` endpoint as line protocol.
pub struct HttpWriter {
    client: reqwest::Client,
    endpoint: Url,
    credentials: Option<(String, String)>,
}

impl HttpWriter {
    pub fn new(
        base_url: &str,
        database: &str,
        credentials: Option<(String, String)>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: write_endpoint(base_url, database)?,
            credentials,
        })
    }
}

#[async_trait]
impl MetricsWriter for HttpWriter {
    async fn submit(&self, points: &[MetricPoint]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let mut req = self
            .client
            .post(self.endpoint.clone())
            .body(line_protocol::encode(points));
        if let Some((user, pass)) = &self.credentials {
            req = req.basic_auth(user, Some(pass));
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(MetricsError::Status(resp.status().as_u16()));
        }
        Ok(())
    }
}

fn write_endpoint(base_url: &str, database: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| MetricsError::Config(format!("writer.url: {e}")))?
        .join("write")
        .map_err(|e| MetricsError::Config(format!("writer.url: {e}")))?;
    url.query_pairs_mut()
        .append_pair("db", database)
        .append_pair("precision", "ns");
    Ok(url)
}
