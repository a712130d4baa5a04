//! Compiler backed by the reference CoffeeScript implementation.
//!
//! Each compile spawns `node` with a small bridge script. The request goes
//! in on stdin as JSON and the reply comes back on stdout as JSON, so no
//! temporary files are involved.

use std::io::Write as _;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::compiler::CompileInput;
use crate::compiler::Compiler;
use crate::compiler::CompilerOutput;
use crate::compiler::V3SourceMap;
use crate::error::CompileError;

/// Module `require`d by the bridge unless configured otherwise.
pub const DEFAULT_MODULE: &str = "coffeescript";

const BRIDGE: &str = r"
const chunks = [];
process.stdin.on('data', (chunk) => chunks.push(chunk));
process.stdin.on('end', () => {
  const describe = (err) => String(err && err.toString ? err.toString() : err);
  let reply;
  try {
    const request = JSON.parse(Buffer.concat(chunks).toString('utf8'));
    let compiler;
    try {
      compiler = require(request.module);
    } catch (err) {
      process.stdout.write(JSON.stringify({ unavailable: describe(err) }));
      return;
    }
    const options = Object.assign({}, request.options, { filename: request.filename });
    const result = compiler.compile(request.source, options);
    reply = typeof result === 'string'
      ? { js: result }
      : { js: result.js, v3SourceMap: result.v3SourceMap };
  } catch (err) {
    reply = { error: describe(err) };
  }
  process.stdout.write(JSON.stringify(reply));
});
";

#[derive(Serialize)]
struct BridgeRequest<'a> {
    module: &'a str,
    source: &'a str,
    filename: &'a str,
    options: &'a Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BridgeReply {
    js: Option<String>,
    v3_source_map: Option<String>,
    error: Option<String>,
    /// The compiler module itself could not be loaded.
    unavailable: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NodeCompiler {
    node: PathBuf,
    module: String,
}

impl NodeCompiler {
    #[must_use]
    pub fn new(node: PathBuf, module: impl Into<String>) -> Self {
        Self {
            node,
            module: module.into(),
        }
    }

    /// Find `node` on `PATH` and use the default CoffeeScript module.
    pub fn locate() -> Result<Self, CompileError> {
        let node = which::which("node").map_err(|e| CompileError::Unavailable {
            reason: format!("node executable not found: {e}"),
        })?;
        tracing::debug!(node = %node.display(), "located node");
        Ok(Self::new(node, DEFAULT_MODULE))
    }

    fn run_bridge(&self, request: &BridgeRequest<'_>, cwd: &Utf8Path) -> Result<BridgeReply, CompileError> {
        let payload = serde_json::to_vec(request).map_err(|e| CompileError::Bridge {
            reason: e.to_string(),
        })?;

        let mut child = Command::new(&self.node)
            .arg("-e")
            .arg(BRIDGE)
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CompileError::Unavailable {
                reason: format!("failed to start {}: {e}", self.node.display()),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&payload)
                .map_err(|e| CompileError::Bridge {
                    reason: format!("failed to send source: {e}"),
                })?;
        }

        let output = child.wait_with_output().map_err(|e| CompileError::Bridge {
            reason: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(CompileError::Bridge {
                reason: format!(
                    "node exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| CompileError::Bridge {
            reason: format!("unreadable reply: {e}"),
        })
    }
}

impl Compiler for NodeCompiler {
    fn compile(&self, input: &CompileInput<'_>) -> Result<CompilerOutput, CompileError> {
        let path = Utf8PathBuf::from(input.filename);
        // `require` resolves relative to the working directory, which lets a
        // project-local compiler win over a global one.
        let cwd = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or(Utf8Path::new("."));

        let reply = self.run_bridge(
            &BridgeRequest {
                module: &self.module,
                source: input.source,
                filename: input.filename,
                options: input.options,
            },
            cwd,
        )?;

        interpret_reply(&path, reply)
    }
}

fn interpret_reply(path: &Utf8Path, reply: BridgeReply) -> Result<CompilerOutput, CompileError> {
    if let Some(reason) = reply.unavailable {
        return Err(CompileError::Unavailable { reason });
    }
    if let Some(message) = reply.error {
        return Err(CompileError::Syntax {
            path: path.to_owned(),
            message,
        });
    }

    let code = reply.js.ok_or_else(|| CompileError::Bridge {
        reason: "reply carried neither code nor error".to_string(),
    })?;

    match reply.v3_source_map {
        Some(map) => {
            let source_map = V3SourceMap::parse(&map).map_err(|e| CompileError::SourceMap {
                path: path.to_owned(),
                reason: e.to_string(),
            })?;
            Ok(CompilerOutput::WithMap {
                code,
                source_map: Box::new(source_map),
            })
        }
        None => Ok(CompilerOutput::Code(code)),
    }
}
