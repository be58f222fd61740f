//! Kubernetes client construction
//!
//! An empty context name selects the in-cluster service account; anything
//! else is looked up as a context in the local kubeconfig.

use kube::config::{InClusterError, KubeConfigOptions, Kubeconfig, KubeconfigError};
use kube::{Client, Config};
use thiserror::Error;
use tracing::info;

/// Errors building a cluster client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to load in-cluster configuration: {0}")]
    InCluster(#[from] InClusterError),

    #[error("failed to load kubeconfig context {context:?}: {source}")]
    Kubeconfig {
        context: String,
        #[source]
        source: KubeconfigError,
    },

    #[error("failed to create Kubernetes client: {0}")]
    Client(#[from] kube::Error),
}

/// Where client credentials come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientSource {
    /// Ambient service account credentials of the pod we run in
    InCluster,
    /// A named context from the local kubeconfig
    Context(String),
}

impl ClientSource {
    pub fn from_context(context: &str) -> Self {
        if context.is_empty() {
            ClientSource::InCluster
        } else {
            ClientSource::Context(context.to_string())
        }
    }
}

/// Resolve client configuration for a source
pub async fn load_config(source: &ClientSource) -> Result<Config, ClientError> {
    match source {
        ClientSource::InCluster => Ok(Config::incluster()?),
        ClientSource::Context(context) => {
            let kubeconfig = Kubeconfig::read().map_err(|source| ClientError::Kubeconfig {
                context: context.clone(),
                source,
            })?;
            config_for_context(kubeconfig, context).await
        }
    }
}

/// Apply a named context from an already loaded kubeconfig
pub async fn config_for_context(
    kubeconfig: Kubeconfig,
    context: &str,
) -> Result<Config, ClientError> {
    let options = KubeConfigOptions {
        context: Some(context.to_string()),
        ..Default::default()
    };

    Config::from_custom_kubeconfig(kubeconfig, &options)
        .await
        .map_err(|source| ClientError::Kubeconfig {
            context: context.to_string(),
            source,
        })
}

/// Build an authenticated client for a source
pub async fn create_client(source: &ClientSource) -> Result<Client, ClientError> {
    let config = load_config(source).await?;
    info!(
        source = ?source,
        cluster_url = %config.cluster_url,
        "Kubernetes client configured"
    );

    Ok(Client::try_from(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
- name: local
  cluster:
    server: https://127.0.0.1:6443
    insecure-skip-tls-verify: true
- name: remote
  cluster:
    server: https://10.0.0.1:443
    insecure-skip-tls-verify: true
users:
- name: dev
  user:
    token: dev-token
contexts:
- name: local-context
  context:
    cluster: local
    user: dev
- name: remote-context
  context:
    cluster: remote
    user: dev
    namespace: monitoring
current-context: local-context
"#;

    const OIDC_KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
- name: corp
  cluster:
    server: https://192.168.1.10:6443
    insecure-skip-tls-verify: true
users:
- name: alice
  user:
    auth-provider:
      name: oidc
      config:
        client-id: kubernetes
        client-secret: secret
        idp-issuer-url: https://issuer.example.com
        id-token: eyJhbGciOiJSUzI1NiJ9.eyJleHAiOjB9.c2ln
        refresh-token: refresh-me
contexts:
- name: corp-context
  context:
    cluster: corp
    user: alice
current-context: corp-context
"#;

    fn kubeconfig() -> Kubeconfig {
        Kubeconfig::from_yaml(KUBECONFIG).unwrap()
    }

    #[test]
    fn test_empty_context_selects_in_cluster() {
        assert_eq!(ClientSource::from_context(""), ClientSource::InCluster);
        assert_eq!(
            ClientSource::from_context("kind-dev"),
            ClientSource::Context("kind-dev".to_string())
        );
    }

    #[tokio::test]
    async fn test_named_context_is_applied() {
        let config = config_for_context(kubeconfig(), "remote-context")
            .await
            .unwrap();

        assert_eq!(config.cluster_url.host(), Some("10.0.0.1"));
        assert_eq!(config.default_namespace, "monitoring");
    }

    #[tokio::test]
    async fn test_local_context_is_applied() {
        let config = config_for_context(kubeconfig(), "local-context")
            .await
            .unwrap();

        assert_eq!(config.cluster_url.host(), Some("127.0.0.1"));
        assert_eq!(config.cluster_url.port_u16(), Some(6443));
    }

    #[tokio::test]
    async fn test_unknown_context_fails() {
        let result = config_for_context(kubeconfig(), "missing").await;

        assert!(matches!(
            result,
            Err(ClientError::Kubeconfig { ref context, .. }) if context == "missing"
        ));
    }

    #[tokio::test]
    async fn test_client_builds_from_context() {
        let config = config_for_context(kubeconfig(), "local-context")
            .await
            .unwrap();

        assert!(Client::try_from(config).is_ok());
    }

    #[tokio::test]
    async fn test_client_builds_for_oidc_auth_provider() {
        let kubeconfig = Kubeconfig::from_yaml(OIDC_KUBECONFIG).unwrap();
        let config = config_for_context(kubeconfig, "corp-context")
            .await
            .unwrap();

        let provider = config.auth_info.auth_provider.as_ref().unwrap();
        assert_eq!(provider.name, "oidc");
        assert!(provider.config.contains_key("refresh-token"));
        assert!(Client::try_from(config).is_ok());
    }

    #[tokio::test]
    async fn test_in_cluster_fails_outside_cluster() {
        if std::env::var_os("KUBERNETES_SERVICE_HOST").is_some() {
            return;
        }

        let result = create_client(&ClientSource::InCluster).await;
        assert!(matches!(result, Err(ClientError::InCluster(_))));
    }
}
