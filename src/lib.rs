//! Compile a Postman Collection v2.x export into Mocha/Chai/Supertest test
//! files plus one shared setup module.

pub mod cli;
pub mod collection;
pub mod compiler;
pub mod emit;
pub mod error;
pub mod fsio;
pub mod layout;
pub mod translate;
pub mod validate;

pub use compiler::{compile_collection, CompileSummary, Options};
pub use error::CompileError;

use std::path::Path;

use anyhow::Context;

/// Read, compile, and write in one call: the shape the CLI and editor
/// integrations consume.
pub fn compile_files(
    collection_path: &Path,
    out_root: &Path,
    environment_path: Option<&Path>,
    options: &Options,
) -> anyhow::Result<CompileSummary> {
    let source = fsio::read_to_string(collection_path)
        .with_context(|| format!("reading {}", collection_path.display()))?;
    let doc: serde_json::Value = serde_json::from_str(&source)
        .with_context(|| format!("parsing {}", collection_path.display()))?;

    let env_doc = match environment_path {
        Some(path) => {
            let source = fsio::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let doc = serde_json::from_str(&source)
                .with_context(|| format!("parsing {}", path.display()))?;
            Some(doc)
        }
        None => None,
    };

    compile_collection(doc, out_root, env_doc, options).map_err(Into::into)
}
