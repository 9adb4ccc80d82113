//! Typed YAML parsing with source-annotated errors

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::yaml::diagnostics::{YamlError, YamlSyntaxError};

/// Parse YAML content, pointing any failure at its location in `filename`
pub fn parse_yaml<T: DeserializeOwned + 'static>(content: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(content).map_err(|e| {
        YamlError::Syntax(YamlSyntaxError::from_serde_error(&e, content, filename))
    })
}

pub fn parse_yaml_file<T: DeserializeOwned + 'static>(path: &Path) -> Result<T, YamlError> {
    let content = std::fs::read_to_string(path)?;
    parse_yaml(&content, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::point::RawRow;

    #[test]
    fn test_parse_raw_row() {
        let yaml = "role: 1\neast: 100\nnorth: '250 mm'\nup: 0\nbore: 200";
        let row: RawRow = parse_yaml(yaml, "row.yaml").unwrap();
        assert_eq!(row.role_text().as_deref(), Some("1"));
        assert!(row.north.is_some());
    }

    #[test]
    fn test_parse_invalid_yaml_returns_error() {
        let yaml = "role: 1\n  east: [100";
        let result: Result<RawRow, _> = parse_yaml(yaml, "row.yaml");
        assert!(matches!(result, Err(YamlError::Syntax(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result: Result<RawRow, _> = parse_yaml_file(Path::new("/nonexistent/row.yaml"));
        assert!(matches!(result, Err(YamlError::Io(_))));
    }
}
