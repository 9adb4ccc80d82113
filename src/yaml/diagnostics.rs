//! YAML error types with source-annotated diagnostics

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Errors raised while reading YAML or JSON documents
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error("failed to read file")]
    #[diagnostic(code(pcfr::yaml::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),
}

/// A parse failure pointing at the offending location
#[derive(Debug, Error, Diagnostic)]
#[error("invalid document: {message}")]
#[diagnostic(
    code(pcfr::yaml::syntax),
    help("check indentation and that every component has a refno and kind")
)]
pub struct YamlSyntaxError {
    pub message: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: Option<SourceSpan>,
}

impl YamlSyntaxError {
    pub fn from_serde_error(err: &serde_yml::Error, content: &str, filename: &str) -> Self {
        let span = err
            .location()
            .map(|loc| SourceSpan::from((loc.index().min(content.len()), 1)));
        Self {
            message: err.to_string(),
            src: NamedSource::new(filename, content.to_string()),
            span,
        }
    }

    pub fn from_json_error(err: &serde_json::Error, content: &str, filename: &str) -> Self {
        Self {
            message: err.to_string(),
            src: NamedSource::new(filename, content.to_string()),
            span: line_column_offset(content, err.line(), err.column())
                .map(|offset| SourceSpan::from((offset, 1))),
        }
    }
}

/// Byte offset of a 1-based line and column
fn line_column_offset(content: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    let line_start: usize = content
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    Some((line_start + column.saturating_sub(1)).min(content.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column_offset() {
        let content = "ab\ncd\nef";
        assert_eq!(line_column_offset(content, 1, 1), Some(0));
        assert_eq!(line_column_offset(content, 2, 2), Some(4));
        assert_eq!(line_column_offset(content, 0, 0), None);
    }

    #[test]
    fn test_syntax_error_has_span() {
        let content = "components:\n  - refno: [unclosed\n";
        let err = serde_yml::from_str::<serde_yml::Value>(content).unwrap_err();
        let diag = YamlSyntaxError::from_serde_error(&err, content, "bad.yaml");
        assert!(diag.span.is_some());
        assert!(!diag.message.is_empty());
    }
}
