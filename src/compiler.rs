//! The compiler driver: Validating → Extracting → Emitting → Walking → Done.
//!
//! Owns the root of the model and is the only component aware of the
//! filesystem collaborator. Validation failures abort before anything is
//! written; a failed write during the walk aborts the remainder (fail-fast,
//! partial output stays on disk for inspection).

use std::path::Path;

use serde_json::Value;
use url::Url;

use crate::collection::{self, Collection, CollectionNode, EnvironmentMap};
use crate::emit;
use crate::error::CompileError;
use crate::fsio;
use crate::layout;
use crate::translate;
use crate::validate;

/// Used when no request URL anywhere in the tree parses.
pub const FALLBACK_BASE_URL: &str = "https://api.example.com";

pub const SETUP_FILE_NAME: &str = "setup.js";

#[derive(Debug, Clone)]
pub struct Options {
    /// Generate every test file directly in the output root.
    pub flatten: bool,
    /// Write the shared setup module (callers managing their own bootstrap
    /// turn this off).
    pub emit_setup: bool,
    /// Richer generated assertions: timing capture, success-shape and
    /// response-time-budget checks.
    pub enhanced: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { flatten: false, emit_setup: true, enhanced: false }
    }
}

#[derive(Debug)]
pub struct CompileSummary {
    pub files: usize,
    pub folders: usize,
    pub base_url: String,
    pub environment: Option<EnvironmentMap>,
    pub warnings: Vec<String>,
}

pub fn compile_collection(
    doc: Value,
    out_root: &Path,
    env_doc: Option<Value>,
    options: &Options,
) -> Result<CompileSummary, CompileError> {
    // Validating: batch every structural problem before aborting. Warnings
    // from either document are carried, never blocking.
    let mut warnings = Vec::new();
    let report = validate::validate_collection(Some(&doc));
    warnings.extend(report.warnings);
    if !report.errors.is_empty() {
        return Err(CompileError::Structural(report.errors));
    }
    let env_report = validate::validate_environment(env_doc.as_ref());
    warnings.extend(env_report.warnings);
    if !env_report.errors.is_empty() {
        return Err(CompileError::Environment(env_report.errors));
    }

    let tree = collection::parse(doc).map_err(|message| CompileError::Structural(vec![message]))?;

    // Extracting: base URL and environment map, each computed exactly once.
    let base_url = match extract_base_url(&tree) {
        Some(url) => url,
        None => {
            warnings.push(format!(
                "no request URL parses; defaulting the base URL to {FALLBACK_BASE_URL}"
            ));
            FALLBACK_BASE_URL.to_string()
        }
    };
    let environment = env_doc.as_ref().map(flatten_environment);

    // Emitting: the setup module must exist before any test file that
    // imports it.
    fsio::ensure_dir(out_root)
        .map_err(|source| CompileError::Emission { path: out_root.to_path_buf(), source })?;
    if options.emit_setup {
        let setup_path = out_root.join(SETUP_FILE_NAME);
        let setup = emit::emit_setup(&base_url, environment.as_ref());
        fsio::write(&setup_path, &setup)
            .map_err(|source| CompileError::Emission { path: setup_path.clone(), source })?;
    }

    // Walking: plan once, create directories parents-first, then translate,
    // emit, and write per request.
    let plan = layout::plan(&tree, options.flatten);
    warnings.extend(plan.warnings.iter().cloned());
    for dir in &plan.dirs {
        let path = out_root.join(dir);
        fsio::ensure_dir(&path)
            .map_err(|source| CompileError::Emission { path: path.clone(), source })?;
    }
    let mut files = 0usize;
    for test in &plan.tests {
        let translated = translate::translate(test.request.script.as_deref());
        let text = emit::emit_test(test, &translated, options.enhanced);
        let path = out_root.join(&test.output_path);
        fsio::write(&path, &text)
            .map_err(|source| CompileError::Emission { path: path.clone(), source })?;
        files += 1;
    }

    Ok(CompileSummary {
        files,
        folders: plan.folders,
        base_url,
        environment,
        warnings,
    })
}

// -------------------- extraction --------------------

/// Depth-first, insertion order: the scheme+host(+port) of the first request
/// whose URL parses. None when nothing parses; the caller substitutes the
/// placeholder and warns.
pub fn extract_base_url(collection: &Collection) -> Option<String> {
    fn visit(nodes: &[CollectionNode]) -> Option<String> {
        for node in nodes {
            match node {
                CollectionNode::Request(request) => {
                    if let Ok(url) = Url::parse(&request.url) {
                        if let Some(host) = url.host_str() {
                            let mut base = format!("{}://{host}", url.scheme());
                            if let Some(port) = url.port() {
                                base.push_str(&format!(":{port}"));
                            }
                            return Some(base);
                        }
                    }
                }
                CollectionNode::Group { children, .. } => {
                    if let Some(found) = visit(children) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }
    visit(&collection.children)
}

/// Flatten the environment's `values` into the last-write-wins map. Entries
/// missing a key or a value are skipped (the validator already warned about
/// keyless ones).
pub fn flatten_environment(doc: &Value) -> EnvironmentMap {
    let mut map = EnvironmentMap::new();
    let Some(values) = doc.get("values").and_then(Value::as_array) else {
        return map;
    };
    for entry in values {
        let Some(key) = entry.get("key").and_then(Value::as_str) else {
            continue;
        };
        if key.trim().is_empty() {
            continue;
        }
        let Some(value) = entry.get("value").and_then(Value::as_str) else {
            continue;
        };
        map.insert(key.to_string(), value.to_string());
    }
    map
}
