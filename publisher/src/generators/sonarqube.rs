use super::{
    PointContext,
    PointGenerator,
};
use crate::{
    build::Build,
    http,
    point::Point,
};
use buildflux_config::HttpSettings;
use eyre::{
    bail,
    eyre,
    Context as _,
    Result,
};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::{
    header::ACCEPT,
    StatusCode,
};
use serde::{
    de::DeserializeOwned,
    Deserialize,
};
use std::io::{
    self,
    BufRead as _,
};
use url::Url;

const SONAR_HOST_URL: &str = "SONAR_HOST_URL";
const SONAR_AUTH_TOKEN: &str = "SONAR_AUTH_TOKEN";

const SEVERITIES: [(&str, &str); 5] = [
    ("BLOCKER", "blocker_issues"),
    ("CRITICAL", "critical_issues"),
    ("MAJOR", "major_issues"),
    ("MINOR", "minor_issues"),
    ("INFO", "info_issues"),
];

lazy_static! {
    static ref ANALYSIS_LINE: Regex =
        Regex::new(&format!("^.*{}(.*)$", regex::escape("ANALYSIS SUCCESSFUL, you can browse "))).unwrap();
}

/// Where the results of one SonarQube analysis can be queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SonarUrls {
    pub project_key: String,
    pub server_url: String,
    pub issues_url: String,
    pub metrics_url: String,
}

impl SonarUrls {
    /// Derives the API endpoints from the dashboard link the scanner prints. `host_url` (usually
    /// `SONAR_HOST_URL`) takes precedence over the server part of the link.
    pub fn resolve(analysis_url: &str, host_url: Option<&str>) -> Result<Self> {
        let parsed = Url::parse(analysis_url).wrap_err_with(|| format!("Invalid SonarQube URL {analysis_url:?}"))?;
        let project_key = project_key(&parsed).ok_or_else(|| eyre!("No project key in {analysis_url:?}"))?;

        let server_url = match host_url.map(|host| host.trim_end_matches('/')).filter(|host| !host.is_empty()) {
            Some(host) => host.to_string(),
            None => [
                format!("/dashboard?id={project_key}"),
                format!("/dashboard/index/{project_key}"),
            ]
            .iter()
            .find_map(|marker| analysis_url.find(marker.as_str()))
            .map(|end| analysis_url[..end].to_string())
            .ok_or_else(|| eyre!("Cannot tell the SonarQube server from {analysis_url:?}"))?,
        };

        Ok(Self {
            issues_url: format!(
                "{server_url}/api/issues/search?ps=500&projectKeys={project_key}&resolved=false&severities="
            ),
            metrics_url: format!(
                "{server_url}/api/measures/component?metricKeys=ncloc,complexity,violations&componentKey={project_key}"
            ),
            project_key,
            server_url,
        })
    }
}

fn project_key(url: &Url) -> Option<String> {
    let from_query = url.query().and_then(|query| {
        query
            .rfind("id=")
            .map(|start| &query[start + 3..])
            .map(|rest| rest.split('&').next().unwrap_or(rest))
    });
    let key = match from_query {
        Some(key) => key,
        None => url.path_segments()?.filter(|segment| !segment.is_empty()).last()?,
    };
    (!key.is_empty()).then(|| key.to_string())
}

/// Last analysis link printed to the console log, if any.
fn find_analysis_url(build: &dyn Build) -> io::Result<Option<String>> {
    let mut reader = build.log_reader()?;
    let mut buf = Vec::new();
    let mut found = None;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        if let Some(captures) = ANALYSIS_LINE.captures(line.trim_end_matches(['\r', '\n'])) {
            found = Some(captures[1].trim().to_string());
        }
    }
    Ok(found)
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

#[derive(Debug, Deserialize)]
struct IssueSearch {
    total: u64,
}

#[derive(Debug, Deserialize)]
struct ComponentMeasures {
    component: Component,
}

#[derive(Debug, Deserialize)]
struct Component {
    #[serde(default)]
    measures: Vec<Measure>,
}

#[derive(Debug, Deserialize)]
struct Measure {
    metric: String,
    #[serde(default)]
    value: serde_json::Value,
}

impl ComponentMeasures {
    fn lines_of_code(&self) -> i64 {
        self.component
            .measures
            .iter()
            .filter(|measure| measure.metric == "ncloc")
            .filter_map(|measure| match &measure.value {
                serde_json::Value::String(s) => s.parse().ok(),
                value => value.as_i64(),
            })
            .last()
            .unwrap_or_default()
    }
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

#[derive(Debug, Clone, PartialEq, Eq)]
enum Probe {
    Unprobed,
    Resolved(SonarUrls),
    Unavailable,
}

/// Issue counts and size of the SonarQube analysis the build ran.
///
/// The analysis is discovered once from the console log. Any failure along the way means no points.
pub struct SonarQubePointGenerator<'a> {
    ctx: &'a PointContext,
    build: &'a dyn Build,
    http: &'a HttpSettings,
    probe: Probe,
}

impl<'a> SonarQubePointGenerator<'a> {
    pub fn new(ctx: &'a PointContext, build: &'a dyn Build, http: &'a HttpSettings) -> Self {
        Self {
            ctx,
            build,
            http,
            probe: Probe::Unprobed,
        }
    }

    fn probe(&self) -> Probe {
        let analysis_url = match find_analysis_url(self.build) {
            Ok(Some(url)) => url,
            Ok(None) => return Probe::Unavailable,
            Err(error) => {
                debug!(%error, "Failed to read the console log");
                return Probe::Unavailable;
            }
        };

        let host_url = self.build.env_var(SONAR_HOST_URL);
        match SonarUrls::resolve(&analysis_url, host_url.as_deref()) {
            Ok(urls) => {
                debug!(project_key = %urls.project_key, server = %urls.server_url, "Found SonarQube analysis");
                Probe::Resolved(urls)
            }
            Err(error) => {
                debug!(%error, "Ignoring SonarQube analysis");
                Probe::Unavailable
            }
        }
    }

    fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut request = http::shared_client(self.http)?
            .get(url)
            .header(ACCEPT, "application/json");
        if let Some(token) = self.build.env_var(SONAR_AUTH_TOKEN).filter(|token| !token.is_empty()) {
            request = request.basic_auth(token, Some(""));
        }

        let response = request.send().wrap_err_with(|| format!("GET {url} failed"))?;
        let status = response.status();
        if status != StatusCode::OK {
            bail!("SonarQube answered {status} for {url}");
        }
        response
            .json()
            .wrap_err_with(|| format!("Unexpected SonarQube response from {url}"))
    }
}

impl PointGenerator for SonarQubePointGenerator<'_> {
    fn name(&self) -> &'static str {
        "SonarQube"
    }

    fn has_report(&mut self) -> bool {
        if self.probe == Probe::Unprobed {
            self.probe = self.probe();
        }
        matches!(self.probe, Probe::Resolved(_))
    }

    fn generate(&mut self) -> Result<Vec<Point>> {
        let Probe::Resolved(urls) = &self.probe else {
            panic!("SonarQube points requested without a resolved analysis");
        };

        let mut builder = self
            .ctx
            .base_point("sonarqube_data", self.build)
            .field("display_name", self.build.display_name());
        for (severity, field) in SEVERITIES {
            let issues: IssueSearch = self.fetch(&format!("{}{severity}", urls.issues_url))?;
            builder = builder.field(field, issues.total);
        }
        let measures: ComponentMeasures = self.fetch(&urls.metrics_url)?;
        builder = builder.field("lines_of_code", measures.lines_of_code());

        Ok(vec![builder.build()?])
    }
}
