//! EC2 instance metadata client
//!
//! Talks to the link-local metadata service with a blocking `ureq` agent and
//! a global timeout. With IMDSv2 enabled a session token is requested first;
//! if the token request is refused the query falls back to IMDSv1.

use crate::config::MetadataConfig;
use recipe::{Error, MetadataSource, Result};
use std::io;
use std::net::Ipv4Addr;
use std::time::Duration;
use ureq::Agent;

const TOKEN_PATH: &str = "/latest/api/token";
const PUBLIC_IPV4_PATH: &str = "/latest/meta-data/public-ipv4";
const TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";
const TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";
const TOKEN_TTL_SECS: &str = "21600";

/// URL of the public address document under `endpoint`
pub fn public_ipv4_url(endpoint: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), PUBLIC_IPV4_PATH)
}

/// Metadata service client
pub struct InstanceMetadata {
    agent: Agent,
    endpoint: String,
    timeout: Duration,
    imdsv2: bool,
}

impl InstanceMetadata {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, imdsv2: bool) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .proxy(None)
            .build();
        Self {
            agent: Agent::new_with_config(config),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            timeout,
            imdsv2,
        }
    }

    pub fn from_config(config: &MetadataConfig) -> Self {
        Self::new(
            config.endpoint.clone(),
            config.timeout(),
            config.imdsv2,
        )
    }

    /// URL queried for the public address
    pub fn address_url(&self) -> String {
        public_ipv4_url(&self.endpoint)
    }

    fn token_url(&self) -> String {
        format!("{}{}", self.endpoint, TOKEN_PATH)
    }

    fn session_token(&self) -> Result<String> {
        let mut response = self
            .agent
            .put(&self.token_url())
            .header(TOKEN_TTL_HEADER, TOKEN_TTL_SECS)
            .send_empty()
            .map_err(|e| self.convert(e))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(Error::metadata(
                format!("token request returned HTTP {status}"),
                Some(status),
            ));
        }

        let token = response
            .body_mut()
            .read_to_string()
            .map_err(|e| self.convert(e))?;
        Ok(token.trim().to_string())
    }

    fn convert(&self, err: ureq::Error) -> Error {
        match err {
            ureq::Error::Timeout(_) => Error::Timeout {
                after: self.timeout,
            },
            ureq::Error::Io(e) if e.kind() == io::ErrorKind::TimedOut => Error::Timeout {
                after: self.timeout,
            },
            ureq::Error::StatusCode(code) => Error::metadata(format!("HTTP {code}"), Some(code)),
            other => Error::metadata(other.to_string(), None),
        }
    }
}

impl MetadataSource for InstanceMetadata {
    fn public_ipv4(&self) -> Result<Option<String>> {
        let token = if self.imdsv2 {
            match self.session_token() {
                Ok(token) => Some(token),
                // A silent endpoint will not answer the fallback either
                Err(e @ Error::Timeout { .. }) => return Err(e),
                Err(e) => {
                    log::debug!("IMDSv2 token unavailable ({}), falling back to IMDSv1", e);
                    None
                }
            }
        } else {
            None
        };

        let url = self.address_url();
        log::debug!("GET {}", url);
        let mut request = self.agent.get(&url);
        if let Some(token) = &token {
            request = request.header(TOKEN_HEADER, token);
        }

        let mut response = request.call().map_err(|e| self.convert(e))?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(Error::metadata(format!("HTTP {status}"), Some(status)));
        }

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| self.convert(e))?;
        let address = body.trim();
        if address.is_empty() {
            return Ok(None);
        }
        address
            .parse::<Ipv4Addr>()
            .map(|ip| Some(ip.to_string()))
            .map_err(|_| Error::Invalid(format!("unexpected metadata response: {address}")))
    }
}
