//! HTTP clients for InfluxDB writes and SonarQube lookups.

use buildflux_config::{
    HttpSettings,
    ProxySettings,
};
use eyre::{
    Context as _,
    Result,
};
use reqwest::{
    blocking::{
        Client,
        ClientBuilder,
    },
    Proxy,
};
use std::{
    collections::HashMap,
    sync::{
        Mutex,
        OnceLock,
        PoisonError,
    },
    time::Duration,
};

static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

/// Proxy URL and the credentials sent to it, if any.
type ProxyKey = (String, Option<(String, String)>);

static PROXIED_CLIENTS: OnceLock<Mutex<HashMap<ProxyKey, Client>>> = OnceLock::new();

const USER_AGENT: &str = concat!("buildflux/", env!("CARGO_PKG_VERSION"));

fn base_builder(settings: &HttpSettings) -> ClientBuilder {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(settings.timeout_secs))
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
}

/// The process-wide client for direct connections. Built on first use, the settings of later calls are ignored.
pub fn shared_client(settings: &HttpSettings) -> Result<&'static Client> {
    if let Some(client) = SHARED_CLIENT.get() {
        return Ok(client);
    }
    let client = base_builder(settings)
        .no_proxy()
        .build()
        .wrap_err("Failed to build the shared HTTP client")?;
    Ok(SHARED_CLIENT.get_or_init(|| client))
}

/// A client routing every request through `proxy`, optionally authenticating against it. One client is kept per
/// proxy and credentials, so connections are pooled across writes.
pub fn proxied_client(settings: &HttpSettings, proxy: &ProxySettings, with_credentials: bool) -> Result<Client> {
    let credentials = proxy.credentials().filter(|_| with_credentials);
    let key: ProxyKey = (
        proxy.url.to_string(),
        credentials.map(|(username, password)| (username.to_string(), password.to_string())),
    );

    let mut clients = PROXIED_CLIENTS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(client) = clients.get(&key) {
        return Ok(client.clone());
    }

    let mut route = Proxy::all(proxy.url.as_str()).wrap_err_with(|| format!("Invalid proxy URL {}", proxy.url))?;
    if let Some((username, password)) = credentials {
        route = route.basic_auth(username, password);
    }
    let client = base_builder(settings)
        .proxy(route)
        .build()
        .wrap_err_with(|| format!("Failed to build an HTTP client for proxy {}", proxy.url))?;
    debug!(proxy = %proxy.url, with_credentials = key.1.is_some(), "built proxied HTTP client");
    clients.insert(key, client.clone());
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_client_is_built_once() {
        let first = shared_client(&HttpSettings::default()).unwrap();
        let second = shared_client(&HttpSettings {
            timeout_secs: 1,
            connect_timeout_secs: 1,
        })
        .unwrap();
        assert!(std::ptr::eq(first, second));
    }

    fn cached_for(proxy_url: &str) -> Vec<Option<(String, String)>> {
        let clients = PROXIED_CLIENTS.get().unwrap().lock().unwrap();
        let mut credentials: Vec<_> = clients
            .keys()
            .filter(|(url, _)| url == proxy_url)
            .map(|(_, credentials)| credentials.clone())
            .collect();
        credentials.sort();
        credentials
    }

    #[test]
    fn proxied_clients_are_reused_per_credentials() {
        let proxy = ProxySettings {
            url: url::Url::parse("http://proxy-cache.invalid:3128").unwrap(),
            username: Some("ci".to_string()),
            password: buildflux_config::Secret::new("hunter2"),
        };
        let settings = HttpSettings::default();

        proxied_client(&settings, &proxy, false).unwrap();
        proxied_client(&settings, &proxy, false).unwrap();
        assert_eq!(cached_for("http://proxy-cache.invalid:3128/"), [None]);

        proxied_client(&settings, &proxy, true).unwrap();
        proxied_client(&settings, &proxy, true).unwrap();
        assert_eq!(
            cached_for("http://proxy-cache.invalid:3128/"),
            [None, Some(("ci".to_string(), "hunter2".to_string()))]
        );
    }
}
