//! Structural validation of the raw input documents.
//!
//! Pure functions over `serde_json::Value` producing batched reports: every
//! structural problem is collected before the driver aborts, and warnings
//! never block a run. Validating the same document twice yields identical
//! reports.

use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Report {
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate_collection(doc: Option<&Value>) -> Report {
    let mut report = Report::default();
    let Some(doc) = doc else {
        report.errors.push("no collection document was supplied".into());
        return report;
    };

    match doc.get("info").and_then(Value::as_object) {
        None => report.errors.push("collection is missing its info object".into()),
        Some(info) => {
            let name = info.get("name").and_then(Value::as_str).map(str::trim).unwrap_or("");
            if name.is_empty() {
                report.warnings.push("collection info has no name".into());
            }
        }
    }

    match doc.get("item").and_then(Value::as_array) {
        None => report.errors.push("collection has no top-level item array".into()),
        Some(items) if items.is_empty() => {
            report.warnings.push("collection item array is empty; nothing will be generated".into());
        }
        Some(_) => {}
    }

    report
}

/// The environment is always optional: `None` is ok. A present environment
/// without a `values` array is an error; an empty `values` array and keyless
/// entries are warnings only.
pub fn validate_environment(doc: Option<&Value>) -> Report {
    let mut report = Report::default();
    let Some(doc) = doc else {
        return report;
    };

    match doc.get("values").and_then(Value::as_array) {
        None => report.errors.push("environment has no values array".into()),
        Some(values) => {
            if values.is_empty() {
                report.warnings.push("environment values array is empty".into());
            }
            for (index, entry) in values.iter().enumerate() {
                let key = entry.get("key").and_then(Value::as_str).map(str::trim).unwrap_or("");
                if key.is_empty() {
                    report.warnings.push(format!("environment value #{index} has no key and is skipped"));
                }
            }
        }
    }

    report
}
