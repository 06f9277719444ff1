//! Serialization of the finished Swagger document to JSON or YAML.
//!
//! Key order follows the document: paths in discovery order, definitions in registration order,
//! properties in field declaration order.

use crate::swagger_builder::SwaggerDocument;
use anyhow::{Context, Result};
use clap::ValueEnum;
use log::debug;
use std::fs;
use std::path::Path;

/// Output format of the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Serializes a Swagger document in the given format.
pub fn serialize(doc: &SwaggerDocument, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serialize_json(doc),
        OutputFormat::Yaml => serialize_yaml(doc),
    }
}

/// Serializes a Swagger document to YAML format.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml(doc: &SwaggerDocument) -> Result<String> {
    debug!("Serializing Swagger document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize Swagger document to YAML")
}

/// Serializes a Swagger document to pretty-printed JSON (two-space indentation).
///
/// # Example
///
/// ```
/// use smali_swagger::class_index::ClassIndex;
/// use smali_swagger::serializer::serialize_json;
/// use smali_swagger::swagger_builder::SwaggerBuilder;
/// use smali_swagger::type_resolver::TypeResolver;
///
/// let doc = SwaggerBuilder::new().build(TypeResolver::new(ClassIndex::new()));
/// let json = serialize_json(&doc).unwrap();
/// assert!(json.contains("\"swagger\": \"2.0\""));
/// ```
pub fn serialize_json(doc: &SwaggerDocument) -> Result<String> {
    debug!("Serializing Swagger document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize Swagger document to JSON")
}

/// Writes string content to a file, creating parent directories as needed and overwriting any
/// existing file.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!(
        "Successfully wrote {} bytes to {}",
        content.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema_generator::Schema;
    use crate::swagger_builder::{Info, Operation, PathItem, Response};
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    /// Helper function to create a small Swagger document for testing
    fn create_test_document() -> SwaggerDocument {
        let mut responses = IndexMap::new();
        responses.insert(
            "200".to_string(),
            Response {
                description: "OK".to_string(),
                schema: Some(Schema::reference_to("Item").unwrap()),
            },
        );
        let mut paths = IndexMap::new();
        paths.insert(
            "/items/{id}".to_string(),
            PathItem {
                get: Some(Operation {
                    summary: "Extracted API for getItem".to_string(),
                    description: "Generated from smali method: getItem".to_string(),
                    consumes: None,
                    produces: vec!["application/json".to_string()],
                    parameters: Vec::new(),
                    responses,
                }),
                ..PathItem::default()
            },
        );
        let mut properties = IndexMap::new();
        properties.insert("name".to_string(), Schema::of_type("string"));
        properties.insert("id".to_string(), Schema::of_type("integer"));
        let mut definitions = IndexMap::new();
        definitions.insert("Item".to_string(), Schema::object(properties));

        SwaggerDocument {
            swagger: "2.0".to_string(),
            info: Info {
                title: "Test API".to_string(),
                version: "1.0.0".to_string(),
                description: "A test API".to_string(),
            },
            paths,
            definitions,
        }
    }

    #[test]
    fn test_serialize_json() {
        let json = serialize_json(&create_test_document()).unwrap();

        assert!(json.contains("\"swagger\": \"2.0\""));
        assert!(json.contains("\"title\": \"Test API\""));
        assert!(json.contains("\"$ref\": \"#/definitions/Item\""));
        assert!(!json.contains("consumes"));
    }

    #[test]
    fn test_serialize_json_pretty_format() {
        let json = serialize_json(&create_test_document()).unwrap();

        assert!(json.contains('\n'));
        assert!(json.contains("\n  \"info\""));
    }

    #[test]
    fn test_serialize_json_keeps_declaration_order() {
        let json = serialize_json(&create_test_document()).unwrap();

        let name = json.find("\"name\"").unwrap();
        let id = json.find("\"id\"").unwrap();
        assert!(name < id);
    }

    #[test]
    fn test_serialize_yaml() {
        let yaml = serialize_yaml(&create_test_document()).unwrap();

        assert!(yaml.contains("swagger: '2.0'"));
        assert!(yaml.contains("title: Test API"));
        assert!(yaml.contains("/items/{id}"));
    }

    #[test]
    fn test_serialize_dispatches_on_format() {
        let doc = create_test_document();

        assert_eq!(
            serialize(&doc, OutputFormat::Json).unwrap(),
            serialize_json(&doc).unwrap()
        );
        assert_eq!(
            serialize(&doc, OutputFormat::Yaml).unwrap(),
            serialize_yaml(&doc).unwrap()
        );
    }

    #[test]
    fn test_json_parses_back() {
        let doc = create_test_document();
        let json = serialize_json(&doc).unwrap();

        let parsed: SwaggerDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_write_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("swagger.json");

        write_to_file("{}", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "{}");
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("out").join("api").join("swagger.yaml");

        write_to_file("swagger: '2.0'", &file_path).unwrap();

        assert!(file_path.exists());
    }

    #[test]
    fn test_write_to_file_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("swagger.json");

        write_to_file("first", &file_path).unwrap();
        write_to_file("second", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "second");
    }
}
