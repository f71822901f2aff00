//! Configuration management for edge-tunnel

mod agent;
mod record;

pub use agent::{AgentConfig, CredentialSource, DEFAULT_KUBECONFIG};
pub use record::{ConfigRecord, RecordFile};

use crate::error::ConfigError;
use std::path::Path;

/// Load a configuration file.
///
/// Files ending in `.json` are parsed as JSON, everything else as TOML.
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config: T = if is_json {
        serde_json::from_str(&content)?
    } else {
        toml::from_str(&content)?
    };
    Ok(config)
}

/// Load the `data` section of a configuration record file
pub fn load_record(path: &Path) -> Result<ConfigRecord, ConfigError> {
    let file: RecordFile = load_config(path)?;
    tracing::debug!(
        name = file.name.as_deref().unwrap_or("-"),
        namespace = file.namespace.as_deref().unwrap_or("-"),
        keys = file.data.len(),
        "Loaded configuration record from {:?}",
        path
    );
    Ok(file.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_toml_record() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
name = "tunnel-server-cfg"
namespace = "kube-system"

[data]
dnat-ports-pair = "9100=10264"
http-proxy-ports = "9200"
"#
        )
        .unwrap();

        let record = load_record(file.path()).unwrap();
        assert_eq!(record.get("dnat-ports-pair"), Some("9100=10264"));
        assert_eq!(record.get("http-proxy-ports"), Some("9200"));
        assert_eq!(record.get("https-proxy-ports"), None);
    }

    #[test]
    fn test_load_json_record() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"data": {{"https-proxy-ports": "9300,9400"}}}}"#).unwrap();

        let record = load_record(file.path()).unwrap();
        assert_eq!(record.get("https-proxy-ports"), Some("9300,9400"));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_record_without_data_is_empty() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, r#"name = "empty""#).unwrap();

        assert!(load_record(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_record_file() {
        let err = load_record(Path::new("/nonexistent/record.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_non_string_value_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[data]\nhttp-proxy-ports = 9100").unwrap();

        assert!(matches!(
            load_record(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
