use crate::error::Result;
use crate::extractor::{Endpoint, HttpMethod, ParamRecord};
use crate::schema_generator::{property_schema, response_schema, scalar_type, Schema};
use crate::type_resolver::{is_object_type, TypeResolver};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Swagger specification version emitted in every document
pub const SWAGGER_VERSION: &str = "2.0";

/// Name given to the single body parameter of an operation
pub const BODY_PARAM_NAME: &str = "body";

const JSON_MEDIA_TYPE: &str = "application/json";

/// Swagger document builder
pub struct SwaggerBuilder {
    /// Swagger info section
    info: Info,
    /// Paths collection (URL path -> PathItem), in discovery order
    paths: IndexMap<String, PathItem>,
}

/// Swagger Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API version
    pub version: String,
    /// API description
    pub description: String,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: "Extracted API".to_string(),
            version: "1.0.0".to_string(),
            description: "API extracted from Smali files".to_string(),
        }
    }
}

/// Swagger PathItem object - the operations of a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// GET operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// POST operation, also the slot for verbs without one of their own
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// PUT operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// DELETE operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
}

impl PathItem {
    /// Stores an operation in the slot of its verb. Anything but GET, PUT and DELETE lands on
    /// `post`, replacing whatever was there.
    fn set(&mut self, method: &HttpMethod, operation: Operation) {
        match method {
            HttpMethod::Get => self.get = Some(operation),
            HttpMethod::Put => self.put = Some(operation),
            HttpMethod::Delete => self.delete = Some(operation),
            HttpMethod::Post => self.post = Some(operation),
            other => {
                debug!("No slot for verb {}, using post", other.as_str());
                self.post = Some(operation);
            }
        }
    }
}

/// Swagger Operation object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub summary: String,
    pub description: String,
    /// Request media types, only present when the operation takes a body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumes: Option<Vec<String>>,
    pub produces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Responses keyed by status code
    pub responses: IndexMap<String, Response>,
}

/// Where a parameter is carried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Body,
}

/// Swagger Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter location (path, query, body)
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Whether the parameter is required
    pub required: bool,
    /// Scalar type of a path or query parameter
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    /// Schema of a body parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

impl Parameter {
    fn path(name: &str, descriptor: &str) -> Self {
        Self {
            name: name.to_string(),
            location: ParameterLocation::Path,
            required: true,
            param_type: Some(scalar_type(descriptor).to_string()),
            schema: None,
        }
    }

    fn query(name: &str, descriptor: &str) -> Self {
        Self {
            name: name.to_string(),
            location: ParameterLocation::Query,
            required: false,
            param_type: Some(scalar_type(descriptor).to_string()),
            schema: None,
        }
    }

    fn body(schema: Schema) -> Self {
        Self {
            name: BODY_PARAM_NAME.to_string(),
            location: ParameterLocation::Body,
            required: true,
            param_type: None,
            schema: Some(schema),
        }
    }
}

/// Swagger Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

impl Response {
    fn ok(schema: Option<Schema>) -> Self {
        Self {
            description: "OK".to_string(),
            schema,
        }
    }
}

/// Complete Swagger 2.0 document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwaggerDocument {
    /// Swagger version
    pub swagger: String,
    pub info: Info,
    pub paths: IndexMap<String, PathItem>,
    pub definitions: IndexMap<String, Schema>,
}

impl SwaggerBuilder {
    /// Create a new SwaggerBuilder with default info
    pub fn new() -> Self {
        debug!("Initializing SwaggerBuilder");
        Self {
            info: Info::default(),
            paths: IndexMap::new(),
        }
    }

    /// Set custom info for the API
    pub fn with_info(mut self, info: Info) -> Self {
        self.info = info;
        self
    }

    /// Add every endpoint, in order.
    pub fn add_endpoints(
        &mut self,
        endpoints: &[Endpoint],
        resolver: &mut TypeResolver,
    ) -> Result<()> {
        endpoints
            .iter()
            .try_for_each(|endpoint| self.add_endpoint(endpoint, resolver))
    }

    /// Add an endpoint to the document.
    ///
    /// # Errors
    ///
    /// Fails when the response type cannot be turned into a schema reference. Body parameters
    /// never fail the build: a broken body type degrades to a plain object schema.
    pub fn add_endpoint(&mut self, endpoint: &Endpoint, resolver: &mut TypeResolver) -> Result<()> {
        debug!(
            "Adding endpoint: {} {}",
            endpoint.method.as_str(),
            endpoint.path
        );
        let path = crate::extractor::normalize_path(&endpoint.path);

        let parameters = Self::build_parameters(endpoint, resolver);
        let consumes = parameters
            .iter()
            .any(|p| p.location == ParameterLocation::Body)
            .then(|| vec![JSON_MEDIA_TYPE.to_string()]);

        let response = Self::build_response(endpoint, resolver)?;
        let mut responses = IndexMap::new();
        responses.insert("200".to_string(), response);

        let operation = Operation {
            summary: format!("Extracted API for {}", endpoint.method_name),
            description: format!("Generated from smali method: {}", endpoint.method_name),
            consumes,
            produces: vec![JSON_MEDIA_TYPE.to_string()],
            parameters,
            responses,
        };

        self.paths
            .entry(path)
            .or_default()
            .set(&endpoint.method, operation);
        Ok(())
    }

    fn build_parameters(endpoint: &Endpoint, resolver: &mut TypeResolver) -> Vec<Parameter> {
        let mut parameters = Vec::new();
        for param in &endpoint.params {
            debug!(
                "  param register={} descriptor={} path={:?} query={:?}",
                param.register, param.descriptor, param.path_name, param.query_name
            );
            if let Some(name) = &param.path_name {
                parameters.push(Parameter::path(name, &param.descriptor));
            }
            if let Some(name) = &param.query_name {
                parameters.push(Parameter::query(name, &param.descriptor));
            }
            if !param.is_unbound() {
                continue;
            }

            if !endpoint.method.is_mutating() {
                // trailing callbacks and similar never describe request input
                debug!(
                    "    param {} => skipped for {}",
                    param.register,
                    endpoint.method.as_str()
                );
                continue;
            }
            if is_object_type(&param.descriptor) {
                parameters.push(Parameter::body(Self::body_schema(param, resolver)));
            } else {
                debug!(
                    "    param {} => scalar, exposed as query parameter",
                    param.register
                );
                parameters.push(Parameter::query(&param.register, &param.descriptor));
            }
        }
        parameters
    }

    fn body_schema(param: &ParamRecord, resolver: &mut TypeResolver) -> Schema {
        let schema = resolver
            .resolve(&param.descriptor)
            .and_then(|resolved| property_schema(&resolved));
        match schema {
            Ok(schema) => schema,
            Err(e) => {
                warn!(
                    "Body parameter {} ({}) falls back to a plain object: {}",
                    param.register, param.descriptor, e
                );
                Schema::of_type("object")
            }
        }
    }

    fn build_response(endpoint: &Endpoint, resolver: &mut TypeResolver) -> Result<Response> {
        let descriptor = endpoint
            .return_signature
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&endpoint.return_descriptor);

        if descriptor.is_empty() {
            debug!(
                "Endpoint {} => no return type => default string response",
                endpoint.method_name
            );
            return Ok(Response::ok(Some(Schema::of_type("string"))));
        }

        let resolved = resolver.resolve(descriptor)?;
        debug!(
            "Endpoint {} => kind={} ref={:?}",
            endpoint.method_name,
            resolved.kind.as_str(),
            resolved.reference
        );
        Ok(Response::ok(response_schema(&resolved, resolver)?))
    }

    /// Build the final Swagger document, taking over the resolver's definitions
    pub fn build(self, resolver: TypeResolver) -> SwaggerDocument {
        debug!("Building final Swagger document");
        SwaggerDocument {
            swagger: SWAGGER_VERSION.to_string(),
            info: self.info,
            paths: self.paths,
            definitions: resolver.into_definitions(),
        }
    }
}

impl Default for SwaggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
