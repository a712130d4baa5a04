//! The compiler seam.
//!
//! The pipeline only knows that a compiler turns source text plus an option
//! set into generated code, optionally accompanied by a raw source-map
//! descriptor that can later be rendered for concrete file names.

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::CompileError;

/// Name the compiler identifies itself with in `sourceURL` comments.
pub const COMPILER_NAME: &str = "coffeescript";

/// Everything a compiler receives for one file.
#[derive(Debug, Clone, Copy)]
pub struct CompileInput<'a> {
    pub source: &'a str,
    /// Absolute path of the source file, used for error messages.
    pub filename: &'a str,
    pub options: &'a Map<String, Value>,
}

/// Trait for anything that can compile a source file.
pub trait Compiler: Send + Sync {
    fn compile(&self, input: &CompileInput<'_>) -> Result<CompilerOutput, CompileError>;
}

/// What a compiler hands back: bare code, or code plus a map descriptor.
pub enum CompilerOutput {
    Code(String),
    WithMap {
        code: String,
        source_map: Box<dyn RawSourceMap>,
    },
}

impl std::fmt::Debug for CompilerOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code(code) => f.debug_tuple("Code").field(code).finish(),
            Self::WithMap { code, .. } => f
                .debug_struct("WithMap")
                .field("code", code)
                .finish_non_exhaustive(),
        }
    }
}

/// Uniform shape the emit sequence works with.
pub struct Compiled {
    pub code: String,
    pub raw_source_map: Option<Box<dyn RawSourceMap>>,
}

impl From<CompilerOutput> for Compiled {
    fn from(output: CompilerOutput) -> Self {
        match output {
            CompilerOutput::Code(code) => Self {
                code,
                raw_source_map: None,
            },
            CompilerOutput::WithMap { code, source_map } => Self {
                code,
                raw_source_map: Some(source_map),
            },
        }
    }
}

/// File names a source map is rendered for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapTarget {
    pub generated_file: String,
    pub source_files: Vec<String>,
}

/// A source map the compiler produced but has not yet tied to file names.
pub trait RawSourceMap: Send {
    /// Render the concrete map document. An empty string means "no map".
    fn generate(&self, target: &MapTarget) -> Result<String, String>;
}

/// Version 3 source map held as JSON until its file names are known.
#[derive(Debug, Clone, PartialEq)]
pub struct V3SourceMap(Value);

impl V3SourceMap {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self)
    }
}

impl RawSourceMap for V3SourceMap {
    fn generate(&self, target: &MapTarget) -> Result<String, String> {
        let Value::Object(fields) = &self.0 else {
            return Err("source map is not a JSON object".to_string());
        };
        if fields.is_empty() {
            return Ok(String::new());
        }

        let mut fields = fields.clone();
        fields.insert(
            "file".to_string(),
            Value::String(target.generated_file.clone()),
        );
        fields.insert(
            "sources".to_string(),
            Value::Array(
                target
                    .source_files
                    .iter()
                    .cloned()
                    .map(Value::String)
                    .collect(),
            ),
        );
        // The map file sits next to the sources it names.
        fields.insert("sourceRoot".to_string(), Value::String(String::new()));

        serde_json::to_string_pretty(&Value::Object(fields)).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn target() -> MapTarget {
        MapTarget {
            generated_file: "a.js".to_string(),
            source_files: vec!["a.coffee".to_string()],
        }
    }

    #[test]
    fn test_v3_generate_sets_file_names() {
        let map = V3SourceMap::new(json!({
            "version": 3,
            "file": "",
            "sources": ["<anonymous>"],
            "names": [],
            "mappings": "AAAA"
        }));
        let rendered: Value = serde_json::from_str(&map.generate(&target()).unwrap()).unwrap();
        assert_eq!(rendered["file"], "a.js");
        assert_eq!(rendered["sources"], json!(["a.coffee"]));
        assert_eq!(rendered["mappings"], "AAAA");
        assert_eq!(rendered["version"], 3);
    }

    #[test]
    fn test_v3_empty_object_generates_nothing() {
        let map = V3SourceMap::new(json!({}));
        assert_eq!(map.generate(&target()).unwrap(), "");
    }

    #[test]
    fn test_v3_rejects_non_object() {
        let map = V3SourceMap::parse("[1, 2]").unwrap();
        assert!(map.generate(&target()).is_err());
    }

    #[test]
    fn test_normalize_plain_code() {
        let compiled = Compiled::from(CompilerOutput::Code("x;".to_string()));
        assert_eq!(compiled.code, "x;");
        assert!(compiled.raw_source_map.is_none());
    }

    #[test]
    fn test_normalize_code_with_map() {
        let compiled = Compiled::from(CompilerOutput::WithMap {
            code: "x;".to_string(),
            source_map: Box::new(V3SourceMap::new(json!({"version": 3}))),
        });
        assert_eq!(compiled.code, "x;");
        assert!(compiled.raw_source_map.is_some());
    }
}
