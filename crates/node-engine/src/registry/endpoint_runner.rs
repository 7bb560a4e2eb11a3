//! Implements the component contract by forwarding execution over HTTP
//! to a remote service hosting the real implementation.

use async_trait::async_trait;
use url::Url;

use crate::component::{Component, Harness};
use crate::model::{FlowDefinition, FlowStep};

const TUNNEL_HEADER: &str = "X-Tunnel-Authorization";

pub struct EndpointRunner {
    endpoint: Url,
    component_name: String,
    class_name: String,
    tunnel_auth: Option<String>,
    client: reqwest::Client,
}

impl EndpointRunner {
    pub fn new(
        endpoint: String,
        component_name: String,
        class_name: String,
        tunnel_auth: Option<String>,
    ) -> Result<Self, url::ParseError> {
        let endpoint = Url::parse(&endpoint)?;
        Ok(Self {
            endpoint,
            component_name,
            class_name,
            tunnel_auth,
            client: reqwest::Client::new(),
        })
    }

    /// Hosts resolving to localhost/private ranges may use plain http;
    /// anything else must use https. Returns the reason when rejected.
    fn check_url_policy(&self) -> Result<(), String> {
        if self.endpoint.scheme() == "https" {
            return Ok(());
        }
        let host = self.endpoint.host_str().unwrap_or("");
        if is_local_host(host) {
            Ok(())
        } else {
            Err(format!(
                "HTTPS required for remote endpoint host '{host}'; refusing to call over http"
            ))
        }
    }

    fn invoke_url(&self, component_key: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.set_path(&format!(
            "{}/invoke_component",
            self.endpoint.path().trim_end_matches('/')
        ));
        url.query_pairs_mut()
            .append_pair("component_name", &self.component_name)
            .append_pair("class_name", &self.class_name)
            .append_pair("component_key", component_key);
        url
    }

    fn source_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.set_path(&format!(
            "{}/get_component_source",
            self.endpoint.path().trim_end_matches('/')
        ));
        url.query_pairs_mut()
            .append_pair("component_name", &self.component_name)
            .append_pair("class_name", &self.class_name);
        url
    }

    fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.tunnel_auth {
            Some(token) => builder.header(TUNNEL_HEADER, format!("tunnel {token}")),
            None => builder,
        }
    }

    /// Best-effort retrieval of the component's source for debug
    /// records; failures are swallowed by the caller.
    pub async fn fetch_source(&self) -> Option<String> {
        if self.check_url_policy().is_err() {
            return None;
        }
        let request = self.apply_auth(self.client.get(self.source_url()));
        let response = request.send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.text().await.ok()
    }
}

#[async_trait]
impl Component for EndpointRunner {
    async fn execute(&self, harness: &mut Harness) -> FlowStep {
        if let Err(reason) = self.check_url_policy() {
            return harness.exit_flow_with_error(reason);
        }

        let url = self.invoke_url(&harness.component_key);
        let body: &FlowDefinition = &harness.flow_definition;
        let request = self.apply_auth(self.client.post(url).json(body));

        let response = match request.send().await {
            Ok(r) => r,
            Err(err) => {
                return harness.exit_flow_with_error(format!("remote endpoint call failed: {err}"))
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            return harness
                .exit_flow_with_error(format!("remote endpoint returned status {status}"));
        }

        match response.json::<FlowStep>().await {
            Ok(step) => step,
            Err(err) => {
                harness.exit_flow_with_error(format!("remote endpoint returned invalid body: {err}"))
            }
        }
    }
}

fn is_local_host(host: &str) -> bool {
    host == "localhost" || host == "127.0.0.1" || host.starts_with("192.168.") || host.starts_with("10.")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(endpoint: &str) -> EndpointRunner {
        EndpointRunner::new(
            endpoint.to_string(),
            "chat".to_string(),
            "Chat".to_string(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn local_http_hosts_are_allowed() {
        assert!(runner("http://localhost:8080").check_url_policy().is_ok());
        assert!(runner("http://127.0.0.1:8080").check_url_policy().is_ok());
        assert!(runner("http://192.168.1.5:8080").check_url_policy().is_ok());
        assert!(runner("http://10.0.0.4:8080").check_url_policy().is_ok());
    }

    #[test]
    fn non_local_http_is_rejected() {
        let result = runner("http://example.com").check_url_policy();
        assert!(result.is_err());
    }

    #[test]
    fn non_local_https_is_allowed() {
        assert!(runner("https://example.com").check_url_policy().is_ok());
    }
}
