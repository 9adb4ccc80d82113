//! YAML and JSON documents with diagnostic error reporting

pub mod diagnostics;
pub mod document;
pub mod parser;

pub use diagnostics::{YamlError, YamlSyntaxError};
pub use document::{ComponentDocument, DocumentError, DocumentFormat, ResolvedDocument, Summary};
pub use parser::{parse_yaml, parse_yaml_file};
