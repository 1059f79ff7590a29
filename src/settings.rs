use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliOverrides {
    pub listen: Option<String>,
    pub backend_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvDefaults {
    pub backend_url: Option<String>,
}

impl EnvDefaults {
    pub fn from_env() -> Self {
        Self {
            backend_url: std::env::var("CHAT_RELAY_BACKEND_URL").ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    pub listen: SocketAddr,
    pub backend_url: Url,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid listen address {0:?}: {1}")]
    Listen(String, std::net::AddrParseError),
    #[error("invalid backend url {0:?}: {1}")]
    BackendUrl(String, url::ParseError),
    #[error("backend url must be http or https, got {0:?}")]
    BackendScheme(String),
}

impl RelaySettings {
    /// `<base>/api/chat`
    pub fn history_endpoint(&self) -> Url {
        join_endpoint(&self.backend_url, "api/chat")
    }

    /// `<base>/agent/chat`
    pub fn session_endpoint(&self) -> Url {
        join_endpoint(&self.backend_url, "agent/chat")
    }
}

fn join_endpoint(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let joined = format!("{}/{}", base.path().trim_end_matches('/'), path);
    url.set_path(&joined);
    url
}

pub fn resolve_settings(
    cli: &CliOverrides,
    env: &EnvDefaults,
) -> Result<RelaySettings, SettingsError> {
    let listen = cli
        .listen
        .clone()
        .unwrap_or_else(|| DEFAULT_LISTEN.into());
    let backend_url = cli
        .backend_url
        .clone()
        .or_else(|| env.backend_url.clone())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.into());

    let listen_addr = listen
        .parse()
        .map_err(|e| SettingsError::Listen(listen.clone(), e))?;
    let backend = Url::parse(&backend_url)
        .map_err(|e| SettingsError::BackendUrl(backend_url.clone(), e))?;
    if !matches!(backend.scheme(), "http" | "https") {
        return Err(SettingsError::BackendScheme(backend_url));
    }

    Ok(RelaySettings {
        listen: listen_addr,
        backend_url: backend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_cli_over_env_over_default() {
        let env = EnvDefaults {
            backend_url: Some("http://env-host:9000".into()),
        };

        let s = resolve_settings(&CliOverrides::default(), &EnvDefaults::default()).unwrap();
        assert_eq!(s.listen.to_string(), DEFAULT_LISTEN);
        assert_eq!(s.backend_url.as_str(), "http://localhost:8000/");

        let s = resolve_settings(&CliOverrides::default(), &env).unwrap();
        assert_eq!(s.backend_url.host_str(), Some("env-host")); // from env

        let cli = CliOverrides {
            listen: Some("0.0.0.0:8080".into()),
            backend_url: Some("https://cli-host".into()),
        };
        let s = resolve_settings(&cli, &env).unwrap();
        assert_eq!(s.listen.port(), 8080);
        assert_eq!(s.backend_url.host_str(), Some("cli-host")); // from cli
    }

    #[test]
    fn endpoints_join_onto_base_path() {
        let cli = CliOverrides {
            listen: None,
            backend_url: Some("http://backend:8000/prefix/".into()),
        };
        let s = resolve_settings(&cli, &EnvDefaults::default()).unwrap();
        assert_eq!(s.history_endpoint().as_str(), "http://backend:8000/prefix/api/chat");
        assert_eq!(s.session_endpoint().as_str(), "http://backend:8000/prefix/agent/chat");

        let s = resolve_settings(&CliOverrides::default(), &EnvDefaults::default()).unwrap();
        assert_eq!(s.history_endpoint().as_str(), "http://localhost:8000/api/chat");
    }

    #[test]
    fn rejects_bad_values() {
        let bad_listen = CliOverrides { listen: Some("nope".into()), backend_url: None };
        assert!(matches!(
            resolve_settings(&bad_listen, &EnvDefaults::default()),
            Err(SettingsError::Listen(..))
        ));

        let bad_url = CliOverrides { listen: None, backend_url: Some("::".into()) };
        assert!(matches!(
            resolve_settings(&bad_url, &EnvDefaults::default()),
            Err(SettingsError::BackendUrl(..))
        ));

        let bad_scheme = CliOverrides { listen: None, backend_url: Some("ftp://host".into()) };
        assert!(matches!(
            resolve_settings(&bad_scheme, &EnvDefaults::default()),
            Err(SettingsError::BackendScheme(_))
        ));
    }
}
