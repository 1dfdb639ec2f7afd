//! Typed model of a Postman Collection v2.x export.
//!
//! Two layers: a private serde mirror of the wire format (which conflates
//! folders and requests by field presence, and allows several spellings of
//! `url`, `request`, and `script.exec`), and the clean `Group | Request` tree
//! every downstream component matches on. The wire polymorphism is resolved
//! exactly once, here; nothing past this module probes JSON fields.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// Insertion-ordered environment bindings; duplicate keys resolve last-wins.
pub type EnvironmentMap = IndexMap<String, String>;

// -------------------- clean model --------------------

#[derive(Debug, Clone)]
pub struct Collection {
    pub name: Option<String>,
    pub children: Vec<CollectionNode>,
}

#[derive(Debug, Clone)]
pub enum CollectionNode {
    /// A folder. Child order is insertion order and is load-bearing: it fixes
    /// generation order and the base-URL heuristic.
    Group {
        name: String,
        children: Vec<CollectionNode>,
    },
    Request(RequestNode),
}

#[derive(Debug, Clone)]
pub struct RequestNode {
    pub name: String,
    pub method: Option<String>,
    pub url: String,
    pub body: Option<RequestBody>,
    pub headers: Vec<Header>,
    /// Raw embedded test script, verbatim, when any `test` event is attached.
    pub script: Option<String>,
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    /// `mode == "raw"` whose payload parsed as JSON.
    Json(Value),
    /// `mode == "raw"` whose payload did not parse; kept as-is.
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Header {
    pub key: String,
    pub value: String,
    pub disabled: bool,
}

// -------------------- raw wire layer --------------------

#[derive(Debug, Deserialize)]
struct RawCollection {
    info: RawInfo,
    #[serde(default)]
    item: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawItem {
    Folder(RawFolder),
    Request(RawRequestItem),
    /// Anything else in the item array (response examples, nulls) is skipped.
    Other(Value),
}

#[derive(Debug, Deserialize)]
struct RawFolder {
    name: Option<String>,
    item: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawRequestItem {
    name: Option<String>,
    request: RawRequestDef,
    #[serde(default)]
    event: Vec<RawEvent>,
}

/// Postman allows `"request": "https://…"` as a shorthand for a bare GET.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRequestDef {
    Shorthand(String),
    Full(RawRequest),
}

#[derive(Debug, Deserialize)]
struct RawRequest {
    method: Option<String>,
    url: Option<RawUrl>,
    #[serde(default)]
    header: Vec<RawHeader>,
    body: Option<RawBody>,
}

/// `url` is either a bare string or an object carrying `raw` (the structured
/// members next to it are ignored; `raw` is authoritative).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawUrl {
    Raw(String),
    Detailed { raw: Option<String> },
}

#[derive(Debug, Deserialize)]
struct RawHeader {
    key: Option<String>,
    value: Option<String>,
    #[serde(default)]
    disabled: bool,
}

#[derive(Debug, Deserialize)]
struct RawBody {
    mode: Option<String>,
    raw: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    listen: Option<String>,
    script: Option<RawScript>,
}

#[derive(Debug, Deserialize)]
struct RawScript {
    #[serde(default)]
    exec: RawExec,
}

/// `exec` is an array of source lines or a single string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawExec {
    Lines(Vec<String>),
    One(String),
}

impl Default for RawExec {
    fn default() -> Self {
        RawExec::Lines(Vec::new())
    }
}

impl RawExec {
    fn joined(&self) -> String {
        match self {
            RawExec::Lines(lines) => lines.join("\n"),
            RawExec::One(line) => line.clone(),
        }
    }
}

// -------------------- parse: Value -> Collection --------------------

/// Parse a validated document into the clean tree.
///
/// Runs after `validate::validate_collection` has passed; a shape that still
/// defeats the typed layer is reported with its JSON path.
pub fn parse(doc: Value) -> Result<Collection, String> {
    let raw: RawCollection = serde_path_to_error::deserialize(doc)
        .map_err(|err| format!("collection does not match the expected shape at {}: {}", err.path(), err.inner()))?;
    Ok(Collection {
        name: raw.info.name,
        children: convert_items(raw.item),
    })
}

fn convert_items(items: Vec<RawItem>) -> Vec<CollectionNode> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            RawItem::Folder(folder) => out.push(CollectionNode::Group {
                name: folder.name.unwrap_or_default(),
                children: convert_items(folder.item),
            }),
            RawItem::Request(request) => out.push(CollectionNode::Request(convert_request(request))),
            RawItem::Other(_) => {} // not a folder, not a request
        }
    }
    out
}

fn convert_request(item: RawRequestItem) -> RequestNode {
    let script = extract_test_script(&item.event);
    let (method, url, headers, body) = match item.request {
        RawRequestDef::Shorthand(url) => (None, url, Vec::new(), None),
        RawRequestDef::Full(request) => {
            let url = match request.url {
                Some(RawUrl::Raw(s)) => s,
                Some(RawUrl::Detailed { raw }) => raw.unwrap_or_default(),
                None => String::new(),
            };
            let headers = request
                .header
                .into_iter()
                .filter_map(|h| {
                    Some(Header {
                        key: h.key?,
                        value: h.value.unwrap_or_default(),
                        disabled: h.disabled,
                    })
                })
                .collect();
            (request.method, url, headers, resolve_body(request.body))
        }
    };
    RequestNode {
        name: item.name.unwrap_or_default(),
        method,
        url,
        body,
        headers,
        script,
    }
}

/// Only `mode == "raw"` carries a payload the compiler interprets; every other
/// mode (formdata, urlencoded, file, graphql, …) means "no body" here. Raw
/// payloads are opportunistically parsed as JSON, falling back to the literal
/// string.
fn resolve_body(body: Option<RawBody>) -> Option<RequestBody> {
    let body = body?;
    if body.mode.as_deref() != Some("raw") {
        return None;
    }
    let raw = body.raw?;
    if raw.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(&raw) {
        Ok(value) => Some(RequestBody::Json(value)),
        Err(_) => Some(RequestBody::Text(raw)),
    }
}

/// Join every `test` event's source lines; multiple test events concatenate
/// in order. None when no test event carries any source.
fn extract_test_script(events: &[RawEvent]) -> Option<String> {
    let mut chunks = Vec::new();
    for event in events {
        if event.listen.as_deref() != Some("test") {
            continue;
        }
        if let Some(script) = &event.script {
            let text = script.exec.joined();
            if !text.trim().is_empty() {
                chunks.push(text);
            }
        }
    }
    if chunks.is_empty() { None } else { Some(chunks.join("\n")) }
}
