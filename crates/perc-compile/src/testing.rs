//! Deterministic stand-in for the real compiler.
//!
//! Every non-empty line becomes a statement; a line ending in `=` is a
//! syntax error. Honors `bare`, `header`, `inlineMap` and `sourceMap` the
//! way the real compiler does, so pipeline tests can run without Node.

use camino::Utf8PathBuf;
use perc_conf::CompilerFlags;
use serde_json::json;

use crate::compiler::CompileInput;
use crate::compiler::Compiler;
use crate::compiler::CompilerOutput;
use crate::compiler::V3SourceMap;
use crate::error::CompileError;

pub struct StubCompiler;

impl Compiler for StubCompiler {
    fn compile(&self, input: &CompileInput<'_>) -> Result<CompilerOutput, CompileError> {
        let flags = CompilerFlags::default().resolve(input.options);

        let mut statements = Vec::new();
        for (index, line) in input.source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.ends_with('=') {
                return Err(CompileError::Syntax {
                    path: Utf8PathBuf::from(input.filename),
                    message: format!("{}:{}: error: unexpected end of input", index + 1, line.len()),
                });
            }
            statements.push(format!("{line};"));
        }

        let mut code = String::new();
        if flags.header {
            code.push_str("// Generated by CoffeeScript\n");
        }
        if flags.bare {
            for statement in &statements {
                code.push_str(statement);
                code.push('\n');
            }
        } else {
            code.push_str("(function() {\n");
            for statement in &statements {
                code.push_str("  ");
                code.push_str(statement);
                code.push('\n');
            }
            code.push_str("}).call(this);\n");
        }
        if flags.inline_map {
            code.push_str("\n//# sourceMappingURL=data:application/json;base64,e30=\n");
        }

        if !flags.source_map {
            return Ok(CompilerOutput::Code(code));
        }

        let source_map = V3SourceMap::new(json!({
            "version": 3,
            "file": "",
            "sourceRoot": "",
            "sources": [""],
            "names": [],
            "mappings": "AAAA;".repeat(statements.len()),
        }));
        Ok(CompilerOutput::WithMap {
            code,
            source_map: Box::new(source_map),
        })
    }
}
