//! Read, compile and write one file.

use std::fs;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use perc_conf::Settings;

use crate::compiler::CompileInput;
use crate::compiler::Compiled;
use crate::compiler::Compiler;
use crate::compiler::MapTarget;
use crate::compiler::COMPILER_NAME;
use crate::error::CompileError;
use crate::request::CompileRequest;

/// Result of a successful emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitOutcome {
    Written {
        output: Utf8PathBuf,
        source_map: Option<Utf8PathBuf>,
    },
    /// The owner went away (disposal or shutdown) before a write was issued.
    Abandoned,
}

/// Run the compile-and-emit sequence for `request`.
///
/// `is_live` is consulted right before each write; once it reports false no
/// further files are touched. The map file is written whenever the compiler
/// produced a non-empty map, independently of `inlineMap`.
pub fn emit(
    request: &CompileRequest,
    compiler: &dyn Compiler,
    settings: &Settings,
    is_live: &dyn Fn() -> bool,
) -> Result<EmitOutcome, CompileError> {
    let source = fs::read_to_string(request.source()).map_err(|source| CompileError::Read {
        path: request.source().to_owned(),
        source,
    })?;

    let options = settings.compiler_options();
    let flags = settings.flags().resolve(&options);

    let compiled: Compiled = compiler
        .compile(&CompileInput {
            source: &source,
            filename: request.source().as_str(),
            options: &options,
        })?
        .into();

    let mut written_map = None;
    if let Some(raw) = &compiled.raw_source_map {
        let target = MapTarget {
            generated_file: request.output_file_name().to_string(),
            source_files: vec![request.source_file_name().to_string()],
        };
        let document = raw.generate(&target).map_err(|reason| CompileError::SourceMap {
            path: request.source().to_owned(),
            reason,
        })?;

        if !document.is_empty() {
            if !is_live() {
                return Ok(EmitOutcome::Abandoned);
            }
            write(request.source_map(), &document)?;
            written_map = Some(request.source_map().to_owned());
        }
    }

    let mut code = compiled.code;
    if !flags.inline_map && flags.source_map {
        code.push_str(&source_map_footer(request.source_map_file_name()));
    }

    if !is_live() {
        return Ok(EmitOutcome::Abandoned);
    }
    write(request.output(), &code)?;

    tracing::debug!(
        source = %request.source(),
        output = %request.output(),
        map = written_map.is_some(),
        "emitted"
    );

    Ok(EmitOutcome::Written {
        output: request.output().to_owned(),
        source_map: written_map,
    })
}

fn source_map_footer(map_file_name: &str) -> String {
    format!("\n//# sourceMappingURL={map_file_name}\n//# sourceURL={COMPILER_NAME}")
}

fn write(path: &Utf8Path, contents: &str) -> Result<(), CompileError> {
    fs::write(path, contents).map_err(|source| CompileError::Write {
        path: path.to_owned(),
        source,
    })
}
