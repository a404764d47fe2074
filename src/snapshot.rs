//! The record an echo invocation sends back to the caller.

use http::{header, request::Parts, HeaderMap};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

const FORWARDED_PROTO: &str = "x-forwarded-proto";
const FORWARDED_HOST: &str = "x-forwarded-host";

/// Deepest array/object nesting echoed back; deeper bodies count as malformed.
pub const MAX_BODY_DEPTH: usize = 1024;

/// Request metadata captured from one inbound request.
///
/// Field order is the order keys appear in the rendered JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    pub body: Value,
}

impl RequestSnapshot {
    /// Builds a snapshot from request parts and the raw body bytes.
    ///
    /// `fallback_authority` is used for the URL when neither the request
    /// URI nor any host header names one.
    pub fn capture(parts: &Parts, body: &[u8], fallback_authority: &str) -> Self {
        Self {
            method: parts.method.as_str().to_string(),
            url: full_url(parts, fallback_authority),
            headers: collect_headers(&parts.headers),
            params: parse_query(parts.uri.query()),
            body: parse_body(body),
        }
    }

    /// Renders the snapshot as JSON indented by two spaces.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Parses the body as JSON, substituting an empty object when the body is
/// empty or not valid JSON.
pub fn parse_body(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Object(Map::new());
    }

    if exceeds_depth(body, MAX_BODY_DEPTH) {
        debug!(limit = MAX_BODY_DEPTH, size = body.len(), "Request body nests too deeply, echoing an empty object");
        return Value::Object(Map::new());
    }

    match parse_json(body) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, size = body.len(), "Request body is not valid JSON, echoing an empty object");
            Value::Object(Map::new())
        }
    }
}

fn parse_json(body: &[u8]) -> Result<Value, serde_json::Error> {
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;
    Ok(value)
}

/// Reports whether arrays and objects nest deeper than `limit`, ignoring
/// brackets inside strings. Runs before parsing so rendering and dropping
/// the parsed value stay within stack bounds.
fn exceeds_depth(body: &[u8], limit: usize) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for &byte in body {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > limit {
                    return true;
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    false
}

/// Flattens headers into a name -> value map. Repeated headers are joined
/// with ", " in arrival order.
pub fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .keys()
        .map(|name| {
            let joined = headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            (name.as_str().to_string(), joined)
        })
        .collect()
}

/// Decodes a query string into a map. The last occurrence of a key wins.
pub fn parse_query(query: Option<&str>) -> BTreeMap<String, String> {
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return BTreeMap::new();
    };

    match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
        Ok(pairs) => pairs.into_iter().collect(),
        Err(e) => {
            debug!(error = %e, query = query, "Failed to decode query string");
            BTreeMap::new()
        }
    }
}

/// Reconstructs the absolute URL the caller used, honouring the usual
/// forwarding headers set by proxies and gateways.
pub fn full_url(parts: &Parts, fallback_authority: &str) -> String {
    let scheme = header_str(&parts.headers, FORWARDED_PROTO)
        .map(|proto| proto.split(',').next().unwrap_or(proto).trim().to_string())
        .or_else(|| parts.uri.scheme_str().map(str::to_string))
        .unwrap_or_else(|| "http".to_string());

    let authority = header_str(&parts.headers, FORWARDED_HOST)
        .map(|host| host.split(',').next().unwrap_or(host).trim().to_string())
        .or_else(|| header_str(&parts.headers, header::HOST.as_str()).map(str::to_string))
        .or_else(|| parts.uri.authority().map(|a| a.as_str().to_string()))
        .unwrap_or_else(|| fallback_authority.to_string());

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    format!("{}://{}{}", scheme, authority, path_and_query)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.trim().is_empty())
}
