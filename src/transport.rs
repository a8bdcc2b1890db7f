use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Proxy, StatusCode, header};
use url::Url;

use crate::config::Settings;
use crate::error::Error;

/// Sent with every probe; some sites reject requests without a browser UA.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Host suffix of addresses only reachable through the Tor SOCKS proxy.
pub const ONION_SUFFIX: &str = ".onion";

/// Reduces a reachability check against a URL to up/down.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Returns `true` iff the site answered `200 OK`. Never fails.
    async fn probe(&self, url: &str) -> bool;
}

/// Network path used to reach a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Direct,
    Proxied,
}

impl Route {
    /// Picks the proxied path for `.onion` hosts, direct for everything else
    /// (including URLs that fail to parse).
    #[must_use]
    pub fn for_url(url: &str) -> Self {
        let is_onion = Url::parse(url)
            .ok()
            .and_then(|parsed| {
                parsed
                    .host_str()
                    .map(|host| host.trim_end_matches('.').ends_with(ONION_SUFFIX))
            })
            .unwrap_or(false);

        if is_onion {
            Route::Proxied
        } else {
            Route::Direct
        }
    }
}

/// Long-lived direct and SOCKS-proxied HTTP clients.
pub struct Transport {
    direct: Client,
    proxied: Client,
}

impl Transport {
    /// Builds both clients from `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy URL is invalid or a client fails to build.
    pub fn new(settings: &Settings) -> Result<Self, Error> {
        let direct = Self::builder(settings)
            .danger_accept_invalid_certs(settings.accept_invalid_certs.direct)
            .build()?;

        let proxied = Self::builder(settings)
            .proxy(Proxy::all(settings.socks_proxy.as_str())?)
            .danger_accept_invalid_certs(settings.accept_invalid_certs.proxied)
            .build()?;

        Ok(Self { direct, proxied })
    }

    fn builder(settings: &Settings) -> reqwest::ClientBuilder {
        Client::builder()
            .timeout(settings.timeout())
            .user_agent(USER_AGENT)
            // Ignore HTTP(S)_PROXY from the environment
            .no_proxy()
    }

    fn client(&self, route: Route) -> &Client {
        match route {
            Route::Direct => &self.direct,
            Route::Proxied => &self.proxied,
        }
    }
}

#[async_trait]
impl Probe for Transport {
    async fn probe(&self, url: &str) -> bool {
        let route = Route::for_url(url);

        match self
            .client(route)
            .get(url)
            .header(header::ACCEPT, "*/*")
            .send()
            .await
        {
            Ok(resp) => {
                debug!("{url}: HTTP {} via {route:?}", resp.status());
                resp.status() == StatusCode::OK
            }
            // Timeouts, DNS and TLS failures are indistinguishable from a real outage here
            Err(e) => {
                debug!("{url}: request failed via {route:?}: {e}");
                false
            }
        }
    }
}
