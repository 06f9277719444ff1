use crate::error::{Error, Result};
use crate::type_resolver::{boxed_kind, primitive_kind, Kind, ResolvedType, TypeResolver};
use indexmap::IndexMap;
use log::debug;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};

/// Prefix of every definition reference in a Swagger 2.0 document.
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Swagger schema object (the subset this tool emits)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Properties for object types, in field declaration order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Value schema for map types
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Box<Schema>>,
    /// Reference to a definition
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Schema {
    /// A bare `{type: <name>}` schema.
    pub fn of_type(name: &str) -> Self {
        Self {
            schema_type: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// An object definition with the given properties.
    pub fn object(properties: IndexMap<String, Schema>) -> Self {
        Self {
            schema_type: Some("object".to_string()),
            properties: Some(properties),
            ..Self::default()
        }
    }

    /// Placeholder definition for a class whose fields are unknown.
    pub fn empty_object() -> Self {
        Self::object(IndexMap::new())
    }

    pub fn array_of(items: Schema) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    pub fn map_of(values: Schema) -> Self {
        Self {
            schema_type: Some("object".to_string()),
            additional_properties: Some(Box::new(values)),
            ..Self::default()
        }
    }

    /// `{$ref: "#/definitions/<name>"}`
    pub fn reference_to(name: &str) -> Result<Self> {
        Ok(Self {
            reference: Some(definition_ref(name)?),
            ..Self::default()
        })
    }
}

/// Characters escaped in a reference fragment, on top of every non-ASCII byte.
const FRAGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Builds the reference string for a definition.
///
/// The name becomes one JSON pointer segment (`~` and `/` escaped) inside a URI fragment, so
/// obfuscated class names such as `†` come out percent-encoded (`#/definitions/%E2%80%A0`). Only
/// names that cannot be encoded at all, empty ones or ones holding control characters, are
/// rejected.
pub fn definition_ref(name: &str) -> Result<String> {
    if name.is_empty() || name.chars().any(char::is_control) {
        return Err(Error::InvalidReference {
            name: name.to_string(),
        });
    }
    let segment = name.replace('~', "~0").replace('/', "~1");
    Ok(format!(
        "{}{}",
        DEFINITIONS_PREFIX,
        utf8_percent_encode(&segment, FRAGMENT)
    ))
}

/// Schema for an object property or a body parameter.
pub fn property_schema(resolved: &ResolvedType) -> Result<Schema> {
    debug!(
        "property_schema => kind={} ref={:?}",
        resolved.kind.as_str(),
        resolved.reference
    );
    let schema = match resolved.kind {
        Kind::String | Kind::Integer | Kind::Boolean | Kind::Number => {
            Schema::of_type(resolved.kind.as_str())
        }
        Kind::Array => Schema::array_of(match &resolved.reference {
            Some(name) => Schema::reference_to(name)?,
            None => Schema::of_type("string"),
        }),
        Kind::Map => Schema::map_of(match &resolved.reference {
            Some(name) => Schema::reference_to(name)?,
            None => Schema::of_type("object"),
        }),
        Kind::Object => match &resolved.reference {
            Some(name) => Schema::reference_to(name)?,
            None => Schema::of_type("object"),
        },
        Kind::Void => Schema::of_type("string"),
    };
    Ok(schema)
}

/// Schema for a 200 response, `None` when the operation returns nothing.
///
/// A referenced object gets a placeholder definition if the resolver has not registered one.
pub fn response_schema(
    resolved: &ResolvedType,
    resolver: &mut TypeResolver,
) -> Result<Option<Schema>> {
    match (&resolved.kind, &resolved.reference) {
        (Kind::Void, _) => Ok(None),
        (Kind::Object, Some(name)) => {
            resolver.ensure_definition(name);
            Ok(Some(Schema::reference_to(name)?))
        }
        _ => property_schema(resolved).map(Some),
    }
}

/// Swagger type of a path or query parameter with the given descriptor.
pub fn scalar_type(descriptor: &str) -> &'static str {
    let descriptor = descriptor.trim();
    match boxed_kind(descriptor).or_else(|| primitive_kind(descriptor)) {
        Some(Kind::Integer) => "integer",
        Some(Kind::Number) => "number",
        Some(Kind::Boolean) => "boolean",
        _ => "string",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_index::ClassIndex;
    use pretty_assertions::assert_eq;

    fn resolved(kind: Kind, reference: Option<&str>) -> ResolvedType {
        ResolvedType {
            kind,
            reference: reference.map(str::to_string),
        }
    }

    #[test]
    fn test_definition_ref() {
        assert_eq!(definition_ref("Item").unwrap(), "#/definitions/Item");
        assert_eq!(
            definition_ref("Item_Tag").unwrap(),
            "#/definitions/Item_Tag"
        );
    }

    #[test]
    fn test_definition_ref_rejects_bad_names() {
        assert!(matches!(
            definition_ref(""),
            Err(Error::InvalidReference { .. })
        ));
        assert!(definition_ref("line\nbreak").is_err());
        assert!(definition_ref("bell\u{7}").is_err());
    }

    #[test]
    fn test_definition_ref_encodes_unusual_names() {
        assert_eq!(definition_ref("\u{2020}").unwrap(), "#/definitions/%E2%80%A0");
        assert_eq!(
            definition_ref("Ünïcode").unwrap(),
            "#/definitions/%C3%9Cn%C3%AFcode"
        );
        assert_eq!(definition_ref("has space").unwrap(), "#/definitions/has%20space");
        assert_eq!(definition_ref("Page<Item").unwrap(), "#/definitions/Page%3CItem");
        assert_eq!(definition_ref("a/b~c").unwrap(), "#/definitions/a~1b~0c");
    }

    #[test]
    fn test_scalar_property() {
        let schema = property_schema(&resolved(Kind::Integer, None)).unwrap();
        assert_eq!(schema, Schema::of_type("integer"));
    }

    #[test]
    fn test_array_property_defaults_to_string_items() {
        let schema = property_schema(&resolved(Kind::Array, None)).unwrap();
        assert_eq!(schema, Schema::array_of(Schema::of_type("string")));
    }

    #[test]
    fn test_array_property_with_reference() {
        let schema = property_schema(&resolved(Kind::Array, Some("Item"))).unwrap();

        assert_eq!(schema.schema_type.as_deref(), Some("array"));
        assert_eq!(
            schema.items.unwrap().reference.as_deref(),
            Some("#/definitions/Item")
        );
    }

    #[test]
    fn test_map_property() {
        let open = property_schema(&resolved(Kind::Map, None)).unwrap();
        assert_eq!(open, Schema::map_of(Schema::of_type("object")));

        let typed = property_schema(&resolved(Kind::Map, Some("Item"))).unwrap();
        assert_eq!(
            typed.additional_properties.unwrap().reference.as_deref(),
            Some("#/definitions/Item")
        );
    }

    #[test]
    fn test_object_property() {
        let reference = property_schema(&resolved(Kind::Object, Some("Item"))).unwrap();
        assert_eq!(reference.reference.as_deref(), Some("#/definitions/Item"));
        assert!(reference.schema_type.is_none());

        let bare = property_schema(&resolved(Kind::Object, None)).unwrap();
        assert_eq!(bare, Schema::of_type("object"));
    }

    #[test]
    fn test_void_property_falls_back_to_string() {
        let schema = property_schema(&resolved(Kind::Void, None)).unwrap();
        assert_eq!(schema, Schema::of_type("string"));
    }

    #[test]
    fn test_property_with_invalid_reference_fails() {
        let result = property_schema(&resolved(Kind::Object, Some("")));
        assert!(matches!(result, Err(Error::InvalidReference { .. })));
    }

    #[test]
    fn test_response_schema_void_is_empty() {
        let mut resolver = TypeResolver::new(ClassIndex::new());
        let schema = response_schema(&resolved(Kind::Void, None), &mut resolver).unwrap();
        assert!(schema.is_none());
    }

    #[test]
    fn test_response_schema_creates_placeholder_definition() {
        let mut resolver = TypeResolver::new(ClassIndex::new());

        let schema = response_schema(&resolved(Kind::Object, Some("Ghost")), &mut resolver)
            .unwrap()
            .unwrap();

        assert_eq!(schema.reference.as_deref(), Some("#/definitions/Ghost"));
        assert_eq!(resolver.definitions()["Ghost"], Schema::empty_object());
    }

    #[test]
    fn test_scalar_type() {
        assert_eq!(scalar_type("J"), "integer");
        assert_eq!(scalar_type("I"), "integer");
        assert_eq!(scalar_type("Ljava/lang/Integer;"), "integer");
        assert_eq!(scalar_type("Ljava/lang/Long;"), "integer");
        assert_eq!(scalar_type("Z"), "boolean");
        assert_eq!(scalar_type("Ljava/lang/Boolean;"), "boolean");
        assert_eq!(scalar_type("D"), "number");
        assert_eq!(scalar_type("Ljava/lang/String;"), "string");
        assert_eq!(scalar_type("Lcom/example/Item;"), "string");
        assert_eq!(scalar_type("V"), "string");
    }

    #[test]
    fn test_schema_serialization_field_names() {
        let schema = Schema::map_of(Schema::reference_to("Item").unwrap());
        let json = serde_json::to_value(&schema).unwrap();

        assert_eq!(json["type"], "object");
        assert_eq!(json["additionalProperties"]["$ref"], "#/definitions/Item");
        assert!(json.get("items").is_none());
    }
}
