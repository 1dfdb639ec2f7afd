//! Generated-source emission: the shared setup module and one test file per
//! request.
//!
//! Every interpolated string goes through the one shared `escape_js` routine.
//! Escaping order is fixed and uniform: backslash first, then quotes, then
//! control characters, then the `${` template introducer. Escaping a quote
//! before the backslash pass would double-escape backslashes, so the order is
//! an invariant, realized here by the arm order of a single character match.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::collection::{EnvironmentMap, RequestBody, RequestNode};
use crate::layout::{setup_reference, PlannedTest};
use crate::translate::TranslationResult;

/// Budget asserted by enhanced-mode tests.
pub const RESPONSE_TIME_BUDGET_MS: u32 = 2000;

/// Escape for interpolation into a single- or double-quoted JS string
/// literal, template-literal safe.
pub fn escape_js(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push_str(r"\\"),
            '\'' => out.push_str(r"\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str(r"\n"),
            '\r' => out.push_str(r"\r"),
            '\t' => out.push_str(r"\t"),
            '$' if chars.peek() == Some(&'{') => out.push_str(r"\$"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

// -------------------- URL path reduction --------------------

/// Scheme and host stripped, query kept. URLs that defeat a strict parse
/// (typically `{{placeholder}}` hosts) fall back to a best-effort extraction
/// of the first `/`-prefixed run, defaulting to `/`.
pub fn request_path(raw_url: &str) -> String {
    match Url::parse(raw_url) {
        Ok(url) if url.has_host() => {
            let mut path = url.path().to_string();
            if let Some(query) = url.query() {
                path.push('?');
                path.push_str(query);
            }
            path
        }
        _ => fallback_path(raw_url),
    }
}

static FALLBACK_PATH: Lazy<Regex> = Lazy::new(|| {
    // optionally skip a scheme://host prefix, then capture from the first '/'
    Regex::new(r"(?i)^(?:[a-z][a-z0-9+.-]*://[^/]*)?[^/]*(/[^#\s]*)").expect("fallback path pattern")
});

fn fallback_path(raw_url: &str) -> String {
    match FALLBACK_PATH.captures(raw_url.trim()) {
        Some(caps) => caps[1].to_string(),
        None => "/".to_string(),
    }
}

// -------------------- setup module --------------------

/// The shared bootstrap every generated test imports. The `ENV` binding is
/// always present (an explicit `null` when no environment was supplied) so
/// generated requires never break.
pub fn emit_setup(base_url: &str, env: Option<&EnvironmentMap>) -> String {
    let mut out = String::new();
    out.push_str("// Auto-generated by postman2supertest - do not edit\n");
    out.push_str("const request = require('supertest');\n");
    out.push_str("const { expect } = require('chai');\n\n");
    out.push_str(&format!("const BASE_URL = '{}';\n", escape_js(base_url)));
    match env {
        None => out.push_str("const ENV = null;\n"),
        Some(env) if env.is_empty() => out.push_str("const ENV = {};\n"),
        Some(env) => {
            out.push_str("const ENV = {\n");
            for (key, value) in env {
                out.push_str(&format!("  '{}': '{}',\n", escape_js(key), escape_js(value)));
            }
            out.push_str("};\n");
        }
    }
    out.push('\n');
    out.push_str("const api = request(BASE_URL);\n\n");
    out.push_str("module.exports = { api, expect, BASE_URL, ENV };\n");
    out
}

// -------------------- test file --------------------

/// One generated test file. The first line is the setup import at the
/// planned relative depth; plain and enhanced mode differ only in the import
/// line and the shape of the request call.
pub fn emit_test(planned: &PlannedTest<'_>, translated: &TranslationResult, enhanced: bool) -> String {
    let setup_ref = setup_reference(planned.import_depth);
    let suite = escape_js(&planned.suite_name);
    let mut out = String::new();

    if enhanced {
        out.push_str(&format!("const {{ api, expect, BASE_URL }} = require('{setup_ref}');\n\n"));
    } else {
        out.push_str(&format!("const {{ api, expect }} = require('{setup_ref}');\n\n"));
    }

    out.push_str(&format!("describe('{suite}', function () {{\n"));
    out.push_str("  let response;\n");
    if enhanced {
        out.push_str("  let elapsedMs;\n");
    }
    out.push('\n');

    out.push_str("  before(async function () {\n");
    if enhanced {
        out.push_str("    const startedAt = Date.now();\n");
        out.push_str("    try {\n");
        out.push_str(&format!("      response = await {};\n", request_call(planned.request, "      ")));
        out.push_str("      elapsedMs = Date.now() - startedAt;\n");
        out.push_str("    } catch (err) {\n");
        out.push_str(&format!(
            "      console.error('{suite} failed against ' + BASE_URL + ':', err.message);\n"
        ));
        out.push_str("      throw err;\n");
        out.push_str("    }\n");
    } else {
        out.push_str(&format!("    response = await {};\n", request_call(planned.request, "    ")));
    }
    out.push_str("  });\n\n");

    if enhanced {
        out.push_str("  it('responds without a server error', function () {\n");
        out.push_str("    expect(response.status).to.be.below(500);\n");
        out.push_str("  });\n\n");
        out.push_str(&format!("  it('responds within {RESPONSE_TIME_BUDGET_MS}ms', function () {{\n"));
        out.push_str(&format!("    expect(elapsedMs).to.be.below({RESPONSE_TIME_BUDGET_MS});\n"));
        out.push_str("  });\n\n");
    }

    if translated.used_fallback {
        // no recognizable assertions survived translation
        if enhanced {
            out.push_str("  it('responds with 200', function () {\n");
            out.push_str("    expect(response.status).to.equal(200);\n");
            out.push_str("  });\n");
        } else {
            out.push_str("  it('responds with a success status', function () {\n");
            out.push_str("    expect([200, 201, 204]).to.include(response.status);\n");
            out.push_str("  });\n");
        }
    } else {
        out.push_str(&indent_block(&translated.text, "  "));
    }

    out.push_str("});\n");
    out
}

/// The single request invocation: verb lower-cased (GET by default), path
/// reduced from the URL, one `.set` per enabled header, `.send` when a body
/// was resolved.
fn request_call(request: &RequestNode, indent: &str) -> String {
    let verb = request.method.as_deref().unwrap_or("GET").to_lowercase();
    let mut call = format!("api\n{indent}  .{verb}('{}')", escape_js(&request_path(&request.url)));
    for header in &request.headers {
        if header.disabled {
            continue;
        }
        call.push_str(&format!(
            "\n{indent}  .set('{}', '{}')",
            escape_js(&header.key),
            escape_js(&header.value)
        ));
    }
    if let Some(body) = &request.body {
        call.push_str(&format!("\n{indent}  .send({})", body_literal(body, indent)));
    }
    call
}

fn body_literal(body: &RequestBody, indent: &str) -> String {
    match body {
        RequestBody::Json(value) => {
            let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string());
            // continuation lines sit under the .send( call
            pretty.replace('\n', &format!("\n{indent}  "))
        }
        RequestBody::Text(text) => format!("'{}'", escape_js(text)),
    }
}

fn indent_block(text: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        if line.trim().is_empty() {
            out.push('\n');
        } else {
            out.push_str(prefix);
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Header;
    use crate::translate;
    use serde_json::json;
    use std::path::PathBuf;

    fn request(method: Option<&str>, url: &str) -> RequestNode {
        RequestNode {
            name: "r".to_string(),
            method: method.map(str::to_string),
            url: url.to_string(),
            body: None,
            headers: Vec::new(),
            script: None,
        }
    }

    fn planned(request: &RequestNode, depth: usize) -> PlannedTest<'_> {
        PlannedTest {
            request,
            suite_name: "Suite - r".to_string(),
            output_path: PathBuf::from("r.test.js"),
            import_depth: depth,
        }
    }

    #[test]
    fn escaping_order_backslash_before_quotes() {
        assert_eq!(escape_js(r"a\b"), r"a\\b");
        assert_eq!(escape_js("it's"), r"it\'s");
        assert_eq!(escape_js("say \"hi\"\n"), "say \\\"hi\\\"\\n");
        assert_eq!(escape_js("${injected}"), r"\${injected}");
        // a backslash introduced by escaping is not escaped again
        assert_eq!(escape_js(r#"\'"#), r#"\\\'"#);
    }

    #[test]
    fn request_path_strips_host_and_keeps_query() {
        assert_eq!(request_path("https://api.x.dev/users?active=true"), "/users?active=true");
        assert_eq!(request_path("https://api.x.dev"), "/");
        assert_eq!(request_path("{{baseUrl}}/users/42"), "/users/42");
        assert_eq!(request_path("http://{{host}}/ping"), "/ping");
        assert_eq!(request_path("{{baseUrl}}"), "/");
    }

    #[test]
    fn setup_serializes_env_or_an_explicit_null() {
        let without = emit_setup("https://api.x.dev", None);
        assert!(without.contains("const ENV = null;"));
        assert!(without.contains("const BASE_URL = 'https://api.x.dev';"));

        let mut env = EnvironmentMap::new();
        env.insert("token".to_string(), "it's".to_string());
        let with = emit_setup("https://api.x.dev", Some(&env));
        assert!(with.contains(r"'token': 'it\'s',"));
        assert!(with.contains("module.exports = { api, expect, BASE_URL, ENV };"));
    }

    #[test]
    fn first_line_imports_setup_at_the_planned_depth() {
        let req = request(Some("GET"), "https://api.x.dev/users");
        let text = emit_test(&planned(&req, 2), &translate::translate(None), false);
        assert!(text.starts_with("const { api, expect } = require('../../setup');"));
    }

    #[test]
    fn verb_is_lower_cased_and_defaults_to_get() {
        let req = request(Some("POST"), "https://api.x.dev/users");
        let text = emit_test(&planned(&req, 0), &translate::translate(None), false);
        assert!(text.contains(".post('/users')"));

        let bare = request(None, "https://api.x.dev/users");
        let text = emit_test(&planned(&bare, 0), &translate::translate(None), false);
        assert!(text.contains(".get('/users')"));
    }

    #[test]
    fn disabled_headers_are_skipped() {
        let mut req = request(Some("GET"), "https://api.x.dev/users");
        req.headers = vec![
            Header { key: "Accept".to_string(), value: "application/json".to_string(), disabled: false },
            Header { key: "X-Off".to_string(), value: "1".to_string(), disabled: true },
        ];
        let text = emit_test(&planned(&req, 0), &translate::translate(None), false);
        assert!(text.contains(".set('Accept', 'application/json')"));
        assert!(!text.contains("X-Off"));
    }

    #[test]
    fn json_bodies_pretty_print_and_text_bodies_quote() {
        let mut req = request(Some("POST"), "https://api.x.dev/users");
        req.body = Some(RequestBody::Json(json!({ "name": "Ada" })));
        let text = emit_test(&planned(&req, 0), &translate::translate(None), false);
        assert!(text.contains(".send({\n"));
        assert!(text.contains("\"name\": \"Ada\""));

        req.body = Some(RequestBody::Text("plain {{token}}".to_string()));
        let text = emit_test(&planned(&req, 0), &translate::translate(None), false);
        assert!(text.contains(".send('plain {{token}}')"));
    }

    #[test]
    fn fallback_emits_the_default_success_assertion() {
        let req = request(Some("GET"), "https://api.x.dev/users");
        let plain = emit_test(&planned(&req, 0), &translate::translate(None), false);
        assert!(plain.contains("expect([200, 201, 204]).to.include(response.status);"));

        let enhanced = emit_test(&planned(&req, 0), &translate::translate(None), true);
        assert!(enhanced.contains("expect(response.status).to.equal(200);"));
    }

    #[test]
    fn enhanced_mode_adds_timing_and_success_shape_checks() {
        let req = request(Some("GET"), "https://api.x.dev/users");
        let script = r#"pm.test("ok", function(){ pm.response.to.have.status(200); });"#;
        let text = emit_test(&planned(&req, 1), &translate::translate(Some(script)), true);
        assert!(text.starts_with("const { api, expect, BASE_URL } = require('../setup');"));
        assert!(text.contains("const startedAt = Date.now();"));
        assert!(text.contains("expect(response.status).to.be.below(500);"));
        assert!(text.contains("expect(elapsedMs).to.be.below(2000);"));
        assert!(text.contains("it(\"ok\""));
        assert!(text.contains("throw err;"));
    }

    #[test]
    fn translated_assertions_are_inserted_indented() {
        let req = request(Some("GET"), "https://api.x.dev/users");
        let script = r#"pm.test("ok", function(){ pm.expect(pm.response.code).to.equal(200); });"#;
        let text = emit_test(&planned(&req, 0), &translate::translate(Some(script)), false);
        assert!(text.contains("  it(\"ok\", function(){ expect(response.status).to.equal(200); });"));
        assert!(!text.contains("pm."));
    }
}
