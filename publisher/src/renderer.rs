use crate::build::Build;
use buildflux_config::Config;

/// Renders the project name every point is tagged with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectNameRenderer {
    custom_prefix: Option<String>,
    custom_project_name: Option<String>,
}

impl ProjectNameRenderer {
    pub fn new(custom_prefix: Option<&str>, custom_project_name: Option<&str>) -> Self {
        Self {
            custom_prefix: custom_prefix.filter(|s| !s.is_empty()).map(str::to_string),
            custom_project_name: custom_project_name.filter(|s| !s.is_empty()).map(str::to_string),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.custom_prefix(), config.custom_project_name())
    }

    pub fn render(&self, build: &dyn Build) -> String {
        if let Some(name) = &self.custom_project_name {
            return name.clone();
        }
        match &self.custom_prefix {
            Some(prefix) => format!("{prefix}_{}", build.project_name()),
            None => build.project_name().to_string(),
        }
    }
}
