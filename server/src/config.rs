//! Server configuration

use std::io;
use std::path::PathBuf;

use engine::protocol::GOOGLEAPIS_BASE_URL;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// BigQuery discovery document to serve, if any
    pub discovery_json_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9050,
            discovery_json_path: None,
        }
    }
}

impl ServerConfig {
    /// Address passed to the TCP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL clients should use to reach this server
    pub fn base_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    /// Read the discovery document and point it at this server
    pub fn load_discovery(&self) -> io::Result<Option<String>> {
        let Some(path) = &self.discovery_json_path else {
            return Ok(None);
        };

        let document = std::fs::read_to_string(path)?;
        tracing::info!("Serving discovery document from {}", path.display());
        Ok(Some(rewrite_base_url(&document, &self.base_url())))
    }
}

/// Replace the public API host in a discovery document
pub fn rewrite_base_url(document: &str, base_url: &str) -> String {
    document.replace(GOOGLEAPIS_BASE_URL, base_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_base_url() {
        let document = r#"{"rootUrl": "https://www.googleapis.com/", "baseUrl": "https://www.googleapis.com/bigquery/v2/"}"#;
        let rewritten = rewrite_base_url(document, "http://localhost:9050");

        assert_eq!(
            rewritten,
            r#"{"rootUrl": "http://localhost:9050/", "baseUrl": "http://localhost:9050/bigquery/v2/"}"#
        );
    }

    #[test]
    fn test_load_discovery() {
        let path = std::env::temp_dir().join(format!("discovery-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"rootUrl": "https://www.googleapis.com/"}"#).unwrap();

        let config = ServerConfig {
            port: 1234,
            discovery_json_path: Some(path.clone()),
            ..ServerConfig::default()
        };
        let document = config.load_discovery().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(
            document.as_deref(),
            Some(r#"{"rootUrl": "http://localhost:1234/"}"#)
        );
    }

    #[test]
    fn test_missing_discovery_file_is_an_error() {
        let config = ServerConfig {
            discovery_json_path: Some(PathBuf::from("/nonexistent/discovery.json")),
            ..ServerConfig::default()
        };
        assert!(config.load_discovery().is_err());
        assert!(ServerConfig::default().load_discovery().unwrap().is_none());
    }
}
