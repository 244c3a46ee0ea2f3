use super::{
    PointContext,
    PointGenerator,
    BUILD_NUMBER,
    CUSTOM_PREFIX,
    PROJECT_NAME,
    PROJECT_PATH,
};
use crate::{
    build::{
        Build,
        BuildResult,
    },
    point::{
        FieldValue,
        Point,
    },
};
use eyre::Result;

const BUILD_TIME: &str = "build_time";
const BUILD_EXEC_TIME: &str = "build_exec_time";
const BUILD_STATUS_MESSAGE: &str = "build_status_message";
const BUILD_RESULT: &str = "build_result";
const BUILD_RESULT_ORDINAL: &str = "build_result_ordinal";
const BUILD_SUCCESSFUL: &str = "build_successful";
const BUILD_AGENT_NAME: &str = "build_agent_name";
const PROJECT_BUILD_HEALTH: &str = "project_build_health";
const TESTS_FAILED: &str = "tests_failed";
const TESTS_SKIPPED: &str = "tests_skipped";
const TESTS_TOTAL: &str = "tests_total";

/// Fields and tags the build point sets itself. Parameter entries cannot replace them.
const RESERVED_FIELDS: &[&str] = &[
    PROJECT_NAME,
    BUILD_NUMBER,
    BUILD_TIME,
    BUILD_EXEC_TIME,
    BUILD_STATUS_MESSAGE,
    BUILD_RESULT,
    BUILD_RESULT_ORDINAL,
    BUILD_SUCCESSFUL,
    BUILD_AGENT_NAME,
    PROJECT_BUILD_HEALTH,
    TESTS_FAILED,
    TESTS_SKIPPED,
    TESTS_TOTAL,
];
const RESERVED_TAGS: &[&str] = &[PROJECT_NAME, PROJECT_PATH, CUSTOM_PREFIX];

/// A parameter value starting with this marker names an environment variable instead of a literal.
pub const ENV_MARKER: char = '$';

/// Metadata of the build itself. Present for every build.
pub struct JenkinsBasePointGenerator<'a> {
    ctx: &'a PointContext,
    build: &'a dyn Build,
    measurement_name: &'a str,
    env_parameter_field: Option<&'a str>,
    env_parameter_tag: Option<&'a str>,
}

impl<'a> JenkinsBasePointGenerator<'a> {
    pub fn new(
        ctx: &'a PointContext,
        build: &'a dyn Build,
        measurement_name: &'a str,
        env_parameter_field: Option<&'a str>,
        env_parameter_tag: Option<&'a str>,
    ) -> Self {
        Self {
            ctx,
            build,
            measurement_name,
            env_parameter_field,
            env_parameter_tag,
        }
    }
}

impl PointGenerator for JenkinsBasePointGenerator<'_> {
    fn name(&self) -> &'static str {
        "Build"
    }

    fn has_report(&mut self) -> bool {
        true
    }

    fn generate(&mut self) -> Result<Vec<Point>> {
        let build = self.build;
        // A running build without a verdict has not failed so far.
        let result = build.result().unwrap_or(BuildResult::Success);

        let mut point = self
            .ctx
            .base_point(self.measurement_name, build)
            .field(BUILD_TIME, i64::try_from(build.duration().as_millis()).unwrap_or(i64::MAX))
            .field(BUILD_EXEC_TIME, build.start_time().timestamp_millis())
            .field(BUILD_STATUS_MESSAGE, result.status_message())
            .field(BUILD_RESULT, result.to_string())
            .field(BUILD_RESULT_ORDINAL, result.ordinal())
            .field(BUILD_SUCCESSFUL, result.is_successful())
            .optional_field(BUILD_AGENT_NAME, build.agent_name())
            .optional_field(PROJECT_BUILD_HEALTH, build.health_score());

        if let Some(tests) = build.test_summary() {
            point = point
                .field(TESTS_FAILED, tests.failed)
                .field(TESTS_SKIPPED, tests.skipped)
                .field(TESTS_TOTAL, tests.total);
        }

        if let Some(entries) = self.env_parameter_field {
            point = point.fields(
                parameter_entries(entries, build, RESERVED_FIELDS)
                    .into_iter()
                    .map(|(name, value)| (name, coerce_field_value(&value))),
            );
        }
        if let Some(entries) = self.env_parameter_tag {
            point = point.tags(parameter_entries(entries, build, RESERVED_TAGS));
        }

        Ok(vec![point.build()?])
    }
}

/// Resolves a configured parameter value: `$NAME` is looked up in the build environment, anything else is taken
/// literally.
pub fn resolve_parameter_value(raw: &str, build: &dyn Build) -> Option<String> {
    match raw.strip_prefix(ENV_MARKER) {
        Some(variable) => build.env_var(variable),
        None => Some(raw.to_string()),
    }
}

/// Parses newline separated `name=value` entries. A bare `name` takes the value of the build parameter of that
/// name, falling back to the environment. Entries named like one of `reserved` are ignored.
fn parameter_entries(text: &str, build: &dyn Build, reserved: &[&str]) -> Vec<(String, String)> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|entry| {
            let (name, value) = match entry.split_once('=') {
                Some((name, raw)) => (name.trim(), resolve_parameter_value(raw.trim(), build)),
                None => (entry, build.parameter(entry).or_else(|| build.env_var(entry))),
            };
            if reserved.contains(&name) {
                debug!(entry, "skipping parameter entry that would replace a built-in value");
                return None;
            }
            match value {
                Some(value) if !name.is_empty() => Some((name.to_string(), value)),
                _ => {
                    debug!(entry, "skipping unresolvable parameter entry");
                    None
                }
            }
        })
        .collect()
}

fn coerce_field_value(value: &str) -> FieldValue {
    if let Ok(i) = value.parse::<i64>() {
        return FieldValue::Integer(i);
    }
    if let Ok(f) = value.parse::<f64>() {
        if f.is_finite() {
            return FieldValue::Float(f);
        }
    }
    match value {
        "true" => FieldValue::Boolean(true),
        "false" => FieldValue::Boolean(false),
        _ => FieldValue::String(value.to_string()),
    }
}
