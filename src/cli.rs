//! Minimal CLI: collection (+ optional environment) → generated test tree
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile a Postman collection export into Mocha/Chai/Supertest test files
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct CommandLineInterface {
    /// input Postman collection .json export
    pub collection: PathBuf,

    /// output directory for the generated tests
    #[arg(short, long, default_value = "generated-tests")]
    pub out: PathBuf,

    /// optional Postman environment .json export
    #[arg(short, long)]
    pub environment: Option<PathBuf>,

    /// generate every test file directly in the output root, no per-folder
    /// directories
    #[arg(long, default_value_t = false)]
    pub flat: bool,

    /// skip writing the shared setup.js module
    #[arg(long, default_value_t = false)]
    pub no_setup: bool,

    /// richer generated assertions: timing capture, success-shape and
    /// response-time-budget checks
    #[arg(long, default_value_t = false)]
    pub enhanced: bool,

    /// suppress warnings and the summary
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        let options = crate::compiler::Options {
            flatten: self.flat,
            emit_setup: !self.no_setup,
            enhanced: self.enhanced,
        };

        let summary = crate::compile_files(
            &self.collection,
            &self.out,
            self.environment.as_deref(),
            &options,
        )?;

        if !self.quiet {
            for warning in &summary.warnings {
                eprintln!("{} {warning}", "warning:".yellow().bold());
            }
            eprintln!(
                "{} {} test file(s), {} folder(s) under {} (base URL {})",
                "generated".green().bold(),
                summary.files,
                summary.folders,
                self.out.display(),
                summary.base_url,
            );
        }
        Ok(())
    }
}
