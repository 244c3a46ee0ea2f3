use reqwest::StatusCode;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PointError {
    #[error("A point needs a measurement name")]
    EmptyMeasurement,
    #[error("Point for measurement {0:?} has no fields")]
    NoFields(String),
}

/// Why a single batch write to a target failed.
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    #[error("Setting up the HTTP client failed: {0}")]
    Client(eyre::Report),
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("The proxy rejected the configured credentials")]
    ProxyAuthentication,
    #[error("InfluxDB answered with status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// A write failure on a target configured with `expose_exceptions`. Intended to fail the build step.
#[derive(thiserror::Error, Debug)]
#[error("Could not report to InfluxDB target {target}: {source}")]
pub struct InfluxReportError {
    pub target: String,
    #[source]
    pub source: WriteError,
}
