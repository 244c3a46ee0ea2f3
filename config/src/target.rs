use crate::Secret;
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    borrow::Cow,
    fmt,
};
use url::Url;

/// One InfluxDB endpoint the collected points are written to.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub description: String,
    pub url: String,
    pub database: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Secret,
    /// Route writes through the globally configured proxy.
    #[serde(default)]
    pub using_proxy: bool,
    /// Fail the publication when this target cannot be written to.
    #[serde(default)]
    pub expose_exceptions: bool,
}

impl Target {
    pub fn new(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            description: String::new(),
            url: url.into(),
            database: database.into(),
            retention_policy: None,
            username: None,
            password: Secret::default(),
            using_proxy: false,
            expose_exceptions: false,
        }
    }

    pub fn retention_policy(&self) -> Option<&str> {
        self.retention_policy.as_deref().filter(|rp| !rp.is_empty())
    }

    /// Username and password, if the target requires authentication.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.username
            .as_deref()
            .filter(|username| !username.is_empty())
            .map(|username| (username, self.password.expose()))
    }

    /// The URL without a password in its userinfo.
    pub fn display_url(&self) -> Cow<'_, str> {
        match Url::parse(self.url.trim()) {
            Ok(mut url) if url.password().is_some() => {
                let _ = url.set_password(None);
                Cow::Owned(url.to_string())
            }
            _ => Cow::Borrowed(&self.url),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "{} (database: {})", self.display_url(), self.database)
        } else {
            write!(f, "{} [{}] (database: {})", self.description, self.display_url(), self.database)
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("description", &self.description)
            .field("url", &self.display_url())
            .field("database", &self.database)
            .field("retention_policy", &self.retention_policy)
            .field("username", &self.username)
            .field("password", &self.password)
            .field("using_proxy", &self.using_proxy)
            .field("expose_exceptions", &self.expose_exceptions)
            .finish()
    }
}
