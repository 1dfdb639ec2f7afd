//! Postman test-script → Mocha/Chai rewrite engine.
//!
//! Deliberately not a parser: a fixed, ordered table of pattern → replacement
//! rules applied in a single left-to-right pass over the whole script. There
//! is no fixed-point iteration; the output is never re-scanned. Table order
//! is an invariant, not a tuning knob:
//! - rule 1 must run before the generic `pm.expect(` rewrite (rule 6) or the
//!   quoted test name would be corrupted;
//! - rules 2 and 3 are narrower cases of rule 6 and must precede it;
//! - no replacement may itself match an earlier rule's pattern.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub text: String,
    /// True when nothing was recognized (or the input was empty): the emitter
    /// substitutes its default status assertion.
    pub used_fallback: bool,
}

enum Rewrite {
    /// Plain capture-group template.
    Template(&'static str),
    /// Header names are normalized to lower-case key lookup on the way
    /// through (supertest exposes them lower-cased).
    LowerHeaderKey,
}

struct Rule {
    pattern: Regex,
    rewrite: Rewrite,
}

impl Rule {
    fn apply(&self, text: &str) -> String {
        match &self.rewrite {
            Rewrite::Template(template) => self.pattern.replace_all(text, *template).into_owned(),
            Rewrite::LowerHeaderKey => self
                .pattern
                .replace_all(text, |caps: &Captures| {
                    format!("response.headers['{}']", caps[1].to_lowercase())
                })
                .into_owned(),
        }
    }
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    let rule = |pattern: &str, template: &'static str| Rule {
        pattern: Regex::new(pattern).expect("rewrite rule pattern"),
        rewrite: Rewrite::Template(template),
    };
    vec![
        // 1. named test declarations; the quoted name carries over verbatim
        rule(r#"pm\.test\(\s*(["'])"#, "it(${1}"),
        // 2. fully-qualified status equality, both Postman spellings; the
        //    numeric literal is preserved
        rule(
            r#"pm\.expect\(pm\.response\.code\)\.to\.(?:equal|eql)\((\d+)\)"#,
            "expect(response.status).to.equal(${1})",
        ),
        rule(
            r#"pm\.response\.to\.have\.status\((\d+)\)"#,
            "expect(response.status).to.equal(${1})",
        ),
        // 3. generic status-code access
        rule(r#"pm\.response\.(?:code|status)\b"#, "response.status"),
        // 4. header lookup by name
        Rule {
            pattern: Regex::new(r#"pm\.response\.headers\.get\(\s*["']([^"']+)["']\s*\)"#)
                .expect("rewrite rule pattern"),
            rewrite: Rewrite::LowerHeaderKey,
        },
        // 5. parsed response body
        rule(r#"pm\.response\.json\(\)"#, "response.body"),
        // 6. generic expect prefix
        rule(r#"pm\.expect\("#, "expect("),
        // 7. timing access has no supertest equivalent; keep an inert marker
        //    instead of silently dropping the assertion
        rule(
            r#"pm\.response\.responseTime"#,
            "0 /* responseTime assertions have no supertest equivalent */",
        ),
    ]
});

/// One pass, in table order, over the whole script. `used_fallback` is true
/// only when the (non-empty) output is textually identical to the input, i.e.
/// no rule fired.
pub fn translate(script: Option<&str>) -> TranslationResult {
    let Some(source) = script else {
        return TranslationResult { text: String::new(), used_fallback: true };
    };
    if source.trim().is_empty() {
        return TranslationResult { text: String::new(), used_fallback: true };
    }

    let mut text = source.to_string();
    for rule in RULES.iter() {
        text = rule.apply(&text);
    }

    let used_fallback = text == source;
    TranslationResult { text, used_fallback }
}
