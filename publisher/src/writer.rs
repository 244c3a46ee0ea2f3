use crate::{
    error::{
        InfluxReportError,
        WriteError,
    },
    http,
    listener::TaskListener,
    point::{
        to_line_protocol,
        Point,
    },
};
use buildflux_config::{
    HttpSettings,
    ProxySettings,
    Target,
};
use reqwest::{
    blocking::{
        Client,
        Response,
    },
    header::CONTENT_TYPE,
    StatusCode,
};
use std::error::Error as StdError;
use url::Url;

/// What happened to the batch at one target.
#[derive(Debug)]
pub enum PublishOutcome {
    Written { points: usize },
    /// Nothing to write.
    Empty,
    /// The target is unusable, e.g. a malformed URL.
    Skipped { reason: String },
    /// The write failed and the target does not expose failures.
    Failed { error: WriteError },
}

impl PublishOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

/// Writes point batches to InfluxDB targets, one request per target.
pub struct TargetWriter<'a> {
    http: &'a HttpSettings,
    proxy: Option<&'a ProxySettings>,
    listener: &'a dyn TaskListener,
}

impl<'a> TargetWriter<'a> {
    pub fn new(http: &'a HttpSettings, proxy: Option<&'a ProxySettings>, listener: &'a dyn TaskListener) -> Self {
        Self { http, proxy, listener }
    }

    /// Writes `points` to every target, even when some of them fail. The first failure of a target with
    /// `expose_exceptions` is returned once all targets have been attempted.
    pub fn publish_all(&self, points: &[Point], targets: &[Target]) -> Result<Vec<PublishOutcome>, InfluxReportError> {
        let mut outcomes = Vec::with_capacity(targets.len());
        let mut exposed: Option<InfluxReportError> = None;

        for target in targets {
            match self.publish(points, target) {
                Ok(outcome) => outcomes.push(outcome),
                Err(error) if exposed.is_some() => {
                    warn!(%error, "Additional exposed target failure");
                }
                Err(error) => exposed = Some(error),
            }
        }

        match exposed {
            Some(error) => Err(error),
            None => Ok(outcomes),
        }
    }

    pub fn publish(&self, points: &[Point], target: &Target) -> Result<PublishOutcome, InfluxReportError> {
        if points.is_empty() {
            debug!(%target, "No points to write");
            return Ok(PublishOutcome::Empty);
        }

        let endpoint = match write_endpoint(target) {
            Ok(endpoint) => endpoint,
            Err(reason) => {
                self.listener
                    .log(&format!("Skipping target {target} due to invalid URL: {reason}"));
                return Ok(PublishOutcome::Skipped { reason });
            }
        };

        self.listener.log(&format!("Publishing data to target {target}"));
        match self.write(&endpoint, target, to_line_protocol(points)) {
            Ok(()) => {
                info!(%target, points = points.len(), "Points written");
                Ok(PublishOutcome::Written { points: points.len() })
            }
            Err(error) => {
                self.listener
                    .log(&format!("Failed to write to InfluxDB target {target}: {error}"));
                if target.expose_exceptions {
                    return Err(InfluxReportError {
                        target: target.to_string(),
                        source: error,
                    });
                }
                warn!(%target, %error, "Write failed");
                Ok(PublishOutcome::Failed { error })
            }
        }
    }

    fn write(&self, endpoint: &Url, target: &Target, body: String) -> Result<(), WriteError> {
        let proxy = match (target.using_proxy, self.proxy) {
            (true, Some(proxy)) => Some(proxy),
            (true, None) => {
                debug!(%target, "Target wants a proxy but none is configured, connecting directly");
                None
            }
            (false, _) => None,
        };

        let response = match proxy {
            None => {
                let client = http::shared_client(self.http).map_err(WriteError::Client)?;
                send(client, endpoint, target, body)?
            }
            Some(proxy) => self.send_via_proxy(proxy, endpoint, target, body)?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(WriteError::Status { status, body });
        }
        Ok(())
    }

    /// Credentials are only sent once the proxy asked for them, and only once.
    fn send_via_proxy(
        &self,
        proxy: &ProxySettings,
        endpoint: &Url,
        target: &Target,
        body: String,
    ) -> Result<Response, WriteError> {
        let client = http::proxied_client(self.http, proxy, false).map_err(WriteError::Client)?;
        let attempt = send(&client, endpoint, target, body.clone());
        if proxy.credentials().is_none() || !proxy_wants_credentials(&attempt) {
            return attempt;
        }

        debug!(proxy = %proxy.url, "Proxy requires authentication, retrying with credentials");
        let client = http::proxied_client(self.http, proxy, true).map_err(WriteError::Client)?;
        let attempt = send(&client, endpoint, target, body);
        if proxy_wants_credentials(&attempt) {
            return Err(WriteError::ProxyAuthentication);
        }
        attempt
    }
}

/// A 407 arrives as a response for plain HTTP, but as a connect error when the `CONNECT` tunnel of an HTTPS
/// target is refused.
fn proxy_wants_credentials(attempt: &Result<Response, WriteError>) -> bool {
    match attempt {
        Ok(response) => response.status() == StatusCode::PROXY_AUTHENTICATION_REQUIRED,
        Err(WriteError::Request { source, .. }) => tunnel_refused(source),
        Err(_) => false,
    }
}

fn tunnel_refused(error: &reqwest::Error) -> bool {
    let mut cause: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(error) = cause {
        let message = error.to_string().to_ascii_lowercase();
        if format!("{error:?}").contains("ProxyAuthRequired")
            || message.contains("proxy authentication required")
            || message.contains("proxy authorization required")
        {
            return true;
        }
        cause = error.source();
    }
    false
}

fn send(client: &Client, endpoint: &Url, target: &Target, body: String) -> Result<Response, WriteError> {
    let mut request = client
        .post(endpoint.clone())
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(body);
    if let Some((username, password)) = target.credentials() {
        request = request.basic_auth(username, Some(password));
    }
    request.send().map_err(|source| {
        let mut url = endpoint.clone();
        let _ = url.set_password(None);
        WriteError::Request {
            url: url.to_string(),
            source,
        }
    })
}

/// `{url}/write?db=..&rp=..&consistency=any&precision=ns`
fn write_endpoint(target: &Target) -> Result<Url, String> {
    let mut url = Url::parse(target.url.trim()).map_err(|error| error.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {:?}", url.scheme()));
    }
    url.path_segments_mut()
        .map_err(|()| "not a base URL".to_string())?
        .pop_if_empty()
        .push("write");

    let mut query = url.query_pairs_mut();
    query.append_pair("db", &target.database);
    if let Some(rp) = target.retention_policy() {
        query.append_pair("rp", rp);
    }
    query.append_pair("consistency", "any").append_pair("precision", "ns");
    drop(query);

    Ok(url)
}
