use crate::extractor::{EndpointExtractor, HttpMethod, MethodRecord, ParamRecord};
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

/// A method block: access level, name, raw parameter list, erased return descriptor and body.
static METHOD_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ms)^[ \t]*\.method\s+(public|private|protected)(?:\s+[\w$]+)*\s+([\w$]+)\(([^)]*)\)(\S*)\s*(.*?)\.end method",
    )
    .expect("Invalid regex")
});

/// `.annotation runtime Lretrofit2/http/GET;` … `.end annotation`. Only all-caps simple names are
/// verbs, which keeps `Path`, `Query`, `Body` and friends out.
static HTTP_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\.annotation\s+runtime\s+Lretrofit2/http/([A-Z]+);(.*?)\.end annotation")
        .expect("Invalid regex")
});

static BINDING_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\.annotation\s+runtime\s+Lretrofit2/http/(Path|Query);(.*?)\.end annotation")
        .expect("Invalid regex")
});

/// `value = "…"` element inside an annotation block.
static VALUE_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*value\s*=\s*"([^"]*)""#).expect("Invalid regex")
});

/// `.param p1, "id"    # Ljava/lang/String;` (the name part is optional).
static PARAM_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*\.param\s+([vp]\d+)(?:\s*,\s*"(?:[^"\\]|\\.)*")?\s*#\s*(\S+)"#)
        .expect("Invalid regex")
});

static SIGNATURE_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)\.annotation\s+system\s+Ldalvik/annotation/Signature;\s*value\s*=\s*\{(.*?)\}\s*\.end annotation",
    )
    .expect("Invalid regex")
});

const END_PARAM: &str = ".end param";

/// Extractor for Retrofit service interfaces.
///
/// Recognises `retrofit2.http` verb annotations (`@GET("path")`, `@POST("path")`, …), `@Path` and
/// `@Query` parameter bindings, and the `dalvik.annotation.Signature` annotation that keeps the
/// generic return type the compiler erased from the method descriptor.
pub struct RetrofitExtractor;

impl EndpointExtractor for RetrofitExtractor {
    fn extract_methods(&self, content: &str) -> Vec<MethodRecord> {
        let mut methods = parse_methods(content);
        for method in &mut methods {
            fill_http_annotation(method);
            method.params = parse_params(&method.body);
            method.return_signature = parse_signature(&method.body);
            debug!(
                "Method {} has {} param records",
                method.name,
                method.params.len()
            );
        }
        methods
    }
}

/// Splits a file into method records without looking at annotations.
fn parse_methods(content: &str) -> Vec<MethodRecord> {
    let methods: Vec<MethodRecord> = METHOD_BLOCK
        .captures_iter(content)
        .map(|caps| MethodRecord {
            access: caps[1].to_string(),
            name: caps[2].to_string(),
            params_signature: caps[3].to_string(),
            return_descriptor: caps[4].to_string(),
            body: caps[5].to_string(),
            http_method: None,
            http_path: None,
            params: Vec::new(),
            return_signature: None,
        })
        .collect();
    debug!("Found {} methods", methods.len());
    methods
}

fn annotation_value(block: &str) -> Option<String> {
    VALUE_ELEMENT.captures(block).map(|caps| caps[1].to_string())
}

/// Sets the verb and path from the first verb annotation that carries a `value`.
fn fill_http_annotation(method: &mut MethodRecord) {
    for caps in HTTP_ANNOTATION.captures_iter(&method.body) {
        if let Some(path) = annotation_value(&caps[2]).filter(|p| !p.is_empty()) {
            let verb = HttpMethod::parse(&caps[1]);
            debug!("Method {} => {} {}", method.name, verb.as_str(), path);
            method.http_method = Some(verb);
            method.http_path = Some(path);
            return;
        }
    }
}

/// Reads the parameter blocks of a method body.
///
/// A block runs from its `.param` header to `.end param`. A header without a matching end line
/// (baksmali emits those for named parameters without annotations) stops at the next header.
fn parse_params(body: &str) -> Vec<ParamRecord> {
    let headers: Vec<_> = PARAM_HEADER.captures_iter(body).collect();
    let mut records = Vec::new();

    for (i, caps) in headers.iter().enumerate() {
        let register = &caps[1];
        let descriptor = caps[2].trim();

        let start = caps.get(0).map_or(0, |m| m.end());
        let limit = headers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(body.len(), |m| m.start());
        let section = &body[start..limit];
        let block = section
            .find(END_PARAM)
            .map_or(section, |end| &section[..end]);

        let mut path_names = Vec::new();
        let mut query_names = Vec::new();
        for binding in BINDING_ANNOTATION.captures_iter(block) {
            if let Some(name) = annotation_value(&binding[2]) {
                match &binding[1] {
                    "Path" => path_names.push(name),
                    _ => query_names.push(name),
                }
            }
        }

        let base = ParamRecord::unbound(register, descriptor);
        if path_names.is_empty() && query_names.is_empty() {
            records.push(base);
            continue;
        }
        for name in path_names {
            records.push(base.clone().with_path(name));
        }
        for name in query_names {
            records.push(base.clone().with_query(name));
        }
    }

    records
}

/// Reassembles the generic signature from the first `Signature` annotation in `body`, if any.
pub(crate) fn parse_signature(body: &str) -> Option<String> {
    let caps = SIGNATURE_ANNOTATION.captures(body)?;
    let signature = merge_signature_lines(&caps[1]);
    if signature.is_empty() {
        return None;
    }
    debug!("Signature = {}", signature);
    Some(signature)
}

/// Joins the quoted pieces of a `value = { "…", "…" }` array into one string.
pub fn merge_signature_lines(block: &str) -> String {
    block
        .lines()
        .map(|line| {
            let line = line.trim();
            let line = line.strip_suffix(',').unwrap_or(line).trim_end();
            line.trim_matches('"')
        })
        .collect()
}
