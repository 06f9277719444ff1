//! Endpoint extraction from smali method declarations.
//!
//! An HTTP client interface (Retrofit being the common case) compiles to an interface whose
//! abstract methods carry runtime annotations naming the HTTP verb, the path template, and the
//! binding of each parameter. This module defines the records produced while reading those
//! methods and the assembler that turns annotated methods into [`Endpoint`]s.
//!
//! - [`retrofit::RetrofitExtractor`] recognises the Retrofit annotation families
//! - [`fields`] reads field declarations for the type resolver
//!
//! # Example
//!
//! ```no_run
//! use smali_swagger::extractor::{EndpointExtractor, retrofit::RetrofitExtractor};
//! use smali_swagger::parser::SmaliParser;
//! use std::path::Path;
//!
//! let parsed = SmaliParser::parse_file(Path::new("smali/com/example/ItemsApi.smali")).unwrap();
//! let endpoints = RetrofitExtractor.extract_file(&parsed);
//! println!("Found {} endpoints", endpoints.len());
//! ```

pub mod fields;
pub mod retrofit;

use crate::parser::SmaliFile;
use log::{debug, info};

/// Reads method records out of one file's text.
///
/// Implementations decide which annotation families carry HTTP metadata; the provided
/// [`extract_file`](EndpointExtractor::extract_file) runs the assembler over one file.
pub trait EndpointExtractor {
    /// Extracts every method block of a file, decorated with whatever HTTP metadata and parameter
    /// bindings were found.
    fn extract_methods(&self, content: &str) -> Vec<MethodRecord>;

    /// Extracts the endpoints of one file, in method order.
    fn extract_file(&self, file: &SmaliFile) -> Vec<Endpoint> {
        debug!("Extracting endpoints in {}", file.path.display());
        let found = assemble(self.extract_methods(&file.content));
        if !found.is_empty() {
            info!("Found {} endpoints in {}", found.len(), file.path.display());
        }
        found
    }
}

/// HTTP verbs. Anything that is not one of the named verbs is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Other(String),
}

impl HttpMethod {
    /// Parses a verb name case-insensitively.
    pub fn parse(verb: &str) -> Self {
        match verb.to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            "PATCH" => HttpMethod::Patch,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            other => HttpMethod::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Other(verb) => verb,
        }
    }

    /// Create/update verbs, whose unbound parameters are treated as request input.
    pub fn is_mutating(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

/// One binding of a declared method parameter.
///
/// A declared parameter expands into one record per path/query annotation found on it, or into
/// a single unbound record when it carries neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamRecord {
    /// Register the parameter lives in (e.g. `p1`)
    pub register: String,
    /// Declared type descriptor (e.g. `Ljava/lang/String;` or `J`)
    pub descriptor: String,
    /// Name of the URL path segment the parameter is bound to
    pub path_name: Option<String>,
    /// Name of the query string key the parameter is bound to
    pub query_name: Option<String>,
}

impl ParamRecord {
    pub fn unbound(register: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            register: register.into(),
            descriptor: descriptor.into(),
            path_name: None,
            query_name: None,
        }
    }

    pub fn with_path(mut self, name: impl Into<String>) -> Self {
        self.path_name = Some(name.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>) -> Self {
        self.query_name = Some(name.into());
        self
    }

    pub fn is_unbound(&self) -> bool {
        self.path_name.is_none() && self.query_name.is_none()
    }
}

/// A method block read from a smali file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRecord {
    /// `public`, `private` or `protected`
    pub access: String,
    pub name: String,
    /// Raw parameter list between the parentheses of the header
    pub params_signature: String,
    /// Erased return descriptor from the header
    pub return_descriptor: String,
    /// Everything between the header and `.end method`
    pub body: String,
    pub http_method: Option<HttpMethod>,
    /// Literal path template from the HTTP annotation
    pub http_path: Option<String>,
    pub params: Vec<ParamRecord>,
    /// Generic signature reassembled from the `Signature` annotation
    pub return_signature: Option<String>,
}

/// An HTTP operation discovered in the decompiled sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Path template, always starting with `/`
    pub path: String,
    pub method: HttpMethod,
    /// Name of the interface method that declares the endpoint
    pub method_name: String,
    pub return_descriptor: String,
    pub params: Vec<ParamRecord>,
    pub return_signature: Option<String>,
}

impl Endpoint {
    #[cfg(test)]
    pub(crate) fn new(path: &str, method: HttpMethod, method_name: impl Into<String>) -> Self {
        Self {
            path: normalize_path(path),
            method,
            method_name: method_name.into(),
            return_descriptor: String::new(),
            params: Vec::new(),
            return_signature: None,
        }
    }
}

/// Prefixes a path with `/` unless it already has one.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Keeps the methods that carry both an HTTP verb and a literal path and turns them into
/// endpoints. Order is preserved.
pub fn assemble(methods: Vec<MethodRecord>) -> Vec<Endpoint> {
    methods
        .into_iter()
        .filter_map(|method| {
            let verb = method.http_method?;
            let path = method.http_path.filter(|p| !p.is_empty())?;
            debug!(
                "Build endpoint for method={} path={} verb={}",
                method.name,
                path,
                verb.as_str()
            );
            Some(Endpoint {
                path: normalize_path(&path),
                method: verb,
                method_name: method.name,
                return_descriptor: method.return_descriptor,
                params: method.params,
                return_signature: method.return_signature,
            })
        })
        .collect()
}
