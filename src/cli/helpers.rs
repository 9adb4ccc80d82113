//! Shared helper functions for CLI commands

use std::path::Path;

use miette::Result;
use tracing::debug;

use crate::cli::GlobalOpts;
use crate::core::config::Settings;
use crate::entities::component::Component;
use crate::yaml::ComponentDocument;

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Layered settings for this invocation
pub fn load_settings(global: &GlobalOpts) -> Result<Settings> {
    let settings = Settings::load(global.config.as_deref())?;
    debug!(?settings, "loaded settings");
    Ok(settings)
}

/// Components of an input document, ordinals assigned
pub fn load_components(path: &Path) -> Result<Vec<Component>> {
    let doc = ComponentDocument::load(path)?;
    debug!(path = %path.display(), components = doc.components.len(), "loaded document");
    Ok(doc.into_components())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("ääääää", 5), "ää...");
    }

    #[test]
    fn test_load_settings_from_explicit_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("settings.yaml");
        std::fs::write(&path, "continuity_tolerance: 2.5\n").unwrap();
        let global = GlobalOpts {
            config: Some(path),
            ..GlobalOpts::default()
        };
        let settings = load_settings(&global).unwrap();
        assert_eq!(settings.continuity_tolerance, 2.5);
    }
}
