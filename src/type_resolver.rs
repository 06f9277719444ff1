//! Type resolver - interprets smali type descriptors and builds object definitions.
//!
//! A descriptor is one of:
//!
//! - a primitive code (`I`, `J`, `Z`, `F`, `D`, `B`, `S`, `V`, …)
//! - an object reference (`Lcom/example/Item;`), possibly boxed (`Ljava/lang/Integer;`)
//! - a generic reference taken from a `Signature` annotation
//!   (`Lretrofit2/Call<Ljava/util/List<Lcom/example/Item;>;>;`)
//! - a whole method signature (`(Ljava/lang/String;)Lretrofit2/Call<…>;`), of which only the
//!   return part matters
//!
//! Resolution produces a [`Kind`] and, for objects, the short name of the definition the object
//! was registered under. Object types found in the [`ClassIndex`] are expanded field by field,
//! recursively. Every object descriptor is recorded in a memo *before* its fields are resolved,
//! so self-referencing and mutually-referencing classes terminate: the second visit returns the
//! reference without expanding again.

use crate::class_index::ClassIndex;
use crate::error::Result;
use crate::extractor::fields::extract_fields;
use crate::schema_generator::{definition_ref, property_schema, Schema};
use indexmap::IndexMap;
use log::{debug, warn};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Semantic kind of a resolved descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    String,
    Integer,
    Boolean,
    Number,
    Void,
    Array,
    Map,
    Object,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Integer => "integer",
            Kind::Boolean => "boolean",
            Kind::Number => "number",
            Kind::Void => "void",
            Kind::Array => "array",
            Kind::Map => "map",
            Kind::Object => "object",
        }
    }
}

/// Result of resolving a descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub kind: Kind,
    /// Short name of the definition: the object itself, or the object element of an array or map
    pub reference: Option<String>,
}

impl ResolvedType {
    fn of(kind: Kind) -> Self {
        Self {
            kind,
            reference: None,
        }
    }

    fn object(name: String) -> Self {
        Self {
            kind: Kind::Object,
            reference: Some(name),
        }
    }

    /// Reference a container may carry for this element. Only a plain object qualifies: the
    /// reference of a nested array or map names that container's own element.
    fn object_reference(self) -> Option<String> {
        match self.kind {
            Kind::Object => self.reference,
            _ => None,
        }
    }
}

/// How a generic container treats its type arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WrapperKind {
    /// Async/RPC wrappers: the result is the single type argument
    PassThrough,
    /// The single type argument becomes the element of an array
    Collection,
    /// Two type arguments; only the value is resolved
    Map,
}

struct GenericWrapper {
    prefix: &'static str,
    kind: WrapperKind,
}

impl GenericWrapper {
    /// Matches the parameterized form and the erased one (`Lretrofit2/Call;`).
    fn matches(&self, sig: &str) -> bool {
        sig.starts_with(self.prefix)
            || self
                .prefix
                .strip_suffix('<')
                .is_some_and(|raw| sig.strip_prefix(raw) == Some(";"))
    }
}

/// Known generic containers, checked in order.
const GENERIC_WRAPPERS: &[GenericWrapper] = &[
    GenericWrapper { prefix: "Lio/reactivex/rxjava3/core/Observable<", kind: WrapperKind::PassThrough },
    GenericWrapper { prefix: "Lretrofit2/Call<", kind: WrapperKind::PassThrough },
    GenericWrapper { prefix: "Lretrofit2/Response<", kind: WrapperKind::PassThrough },
    GenericWrapper { prefix: "Lio/reactivex/rxjava3/core/Single<", kind: WrapperKind::PassThrough },
    GenericWrapper { prefix: "Lio/reactivex/rxjava3/core/Maybe<", kind: WrapperKind::PassThrough },
    GenericWrapper { prefix: "Lio/reactivex/rxjava3/core/Flowable<", kind: WrapperKind::PassThrough },
    GenericWrapper { prefix: "Lio/reactivex/Observable<", kind: WrapperKind::PassThrough },
    GenericWrapper { prefix: "Lio/reactivex/Single<", kind: WrapperKind::PassThrough },
    GenericWrapper { prefix: "Ljava/util/List<", kind: WrapperKind::Collection },
    GenericWrapper { prefix: "Ljava/util/ArrayList<", kind: WrapperKind::Collection },
    GenericWrapper { prefix: "Ljava/util/Set<", kind: WrapperKind::Collection },
    GenericWrapper { prefix: "Ljava/util/Collection<", kind: WrapperKind::Collection },
    GenericWrapper { prefix: "Ljava/util/HashMap<", kind: WrapperKind::Map },
    GenericWrapper { prefix: "Ljava/util/Map<", kind: WrapperKind::Map },
];

/// Boxed types and well-known library classes with a fixed kind.
pub fn boxed_kind(descriptor: &str) -> Option<Kind> {
    match descriptor {
        "Ljava/lang/String;" => Some(Kind::String),
        "Ljava/lang/Boolean;" => Some(Kind::Boolean),
        "Ljava/lang/Integer;" | "Ljava/lang/Long;" | "Ljava/lang/Short;" | "Ljava/lang/Byte;" => {
            Some(Kind::Integer)
        }
        "Ljava/lang/Float;" | "Ljava/lang/Double;" => Some(Kind::Number),
        "Ljava/lang/Void;" => Some(Kind::Void),
        "Ljava/util/Map;" => Some(Kind::Map),
        _ => None,
    }
}

/// Single-letter primitive codes. `C` (char) is deliberately absent and ends up as a string.
pub fn primitive_kind(descriptor: &str) -> Option<Kind> {
    match descriptor {
        "V" => Some(Kind::Void),
        "I" | "J" | "B" | "S" => Some(Kind::Integer),
        "Z" => Some(Kind::Boolean),
        "F" | "D" => Some(Kind::Number),
        _ => None,
    }
}

/// Whether a descriptor is a complete object reference (`L…;`).
pub fn is_object_type(descriptor: &str) -> bool {
    let descriptor = descriptor.trim();
    descriptor.starts_with('L') && descriptor.ends_with(';')
}

/// `Lcom/example/Item$Tag;` → `Item_Tag`
pub fn short_name(descriptor: &str) -> String {
    let trimmed = descriptor.strip_prefix('L').unwrap_or(descriptor);
    let trimmed = trimmed.strip_suffix(';').unwrap_or(trimmed);
    trimmed
        .rsplit('/')
        .next()
        .unwrap_or(trimmed)
        .replace('$', "_")
}

/// Drops the type arguments of a generic object reference and makes sure the terminator is
/// present: `Lcom/example/Page<Lcom/example/Item;>;` → `Lcom/example/Page;`.
fn raw_class_descriptor(descriptor: &str) -> String {
    let raw = match descriptor.find('<') {
        Some(open) => &descriptor[..open],
        None => descriptor,
    };
    let mut raw = raw.to_string();
    if !raw.ends_with(';') {
        raw.push(';');
    }
    raw
}

/// Splits a list of type arguments (`Ljava/lang/String;Ljava/util/List<LItem;>;`) into single
/// descriptors, keeping nested generics intact.
fn split_type_arguments(arguments: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut in_reference = false;

    for (i, c) in arguments.char_indices() {
        let end = i + c.len_utf8();
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            'L' | 'T' if !in_reference => in_reference = true,
            ';' if in_reference && depth == 0 => {
                parts.push(arguments[start..end].trim());
                start = end;
                in_reference = false;
            }
            // array and variance prefixes belong to the next descriptor
            '[' | '+' | '-' if !in_reference => {}
            _ if in_reference => {}
            _ if c.is_whitespace() => start = end,
            _ => {
                parts.push(&arguments[start..end]);
                start = end;
            }
        }
    }

    let rest = arguments[start..].trim();
    if !rest.is_empty() {
        parts.push(rest);
    }
    parts
}

fn read_fields(path: &Path) -> Result<IndexMap<String, String>> {
    let content = fs::read_to_string(path)?;
    Ok(extract_fields(&content))
}

/// Type resolver - owns the run's class index, resolution memo and definitions
pub struct TypeResolver {
    class_index: ClassIndex,
    /// Object descriptors already expanded or being expanded
    memo: HashSet<String>,
    /// Definitions keyed by short name
    definitions: IndexMap<String, Schema>,
}

impl TypeResolver {
    pub fn new(class_index: ClassIndex) -> Self {
        debug!(
            "Initializing TypeResolver with {} indexed classes",
            class_index.len()
        );
        Self {
            class_index,
            memo: HashSet::new(),
            definitions: IndexMap::new(),
        }
    }

    /// Resolves a descriptor to its kind and reference, registering definitions for every object
    /// type reached along the way.
    ///
    /// # Errors
    ///
    /// Fails when an object type reached during resolution (the descriptor itself or a field of an
    /// expanded class) has a short name that cannot be turned into a definition reference.
    pub fn resolve(&mut self, descriptor: &str) -> Result<ResolvedType> {
        let mut sig = descriptor.trim().trim_start_matches(['+', '-']);
        debug!("resolve sig={}", sig);

        if sig.starts_with('(') {
            if let Some(close) = sig.find(')') {
                sig = sig[close + 1..].trim();
                debug!("  after dropping method params => {}", sig);
            }
        }

        if let Some(wrapper) = GENERIC_WRAPPERS.iter().find(|w| w.matches(sig)) {
            debug!("  recognized wrapper prefix = {}", wrapper.prefix);
            return self.resolve_wrapper(wrapper, sig);
        }

        if let Some(kind) = boxed_kind(sig) {
            debug!("  recognized built-in {} => {}", sig, kind.as_str());
            return Ok(ResolvedType::of(kind));
        }

        if sig.starts_with('L') {
            return self.resolve_object(sig);
        }

        if let Some(kind) = primitive_kind(sig) {
            return Ok(ResolvedType::of(kind));
        }

        debug!("  fallback => string => {}", sig);
        Ok(ResolvedType::of(Kind::String))
    }

    fn resolve_wrapper(&mut self, wrapper: &GenericWrapper, sig: &str) -> Result<ResolvedType> {
        let Some(open) = sig.find('<') else {
            debug!("  erased wrapper => no element type");
            return Ok(ResolvedType::of(match wrapper.kind {
                WrapperKind::PassThrough => Kind::Object,
                WrapperKind::Collection => Kind::Array,
                WrapperKind::Map => Kind::Map,
            }));
        };
        let inside = &sig[open + 1..];
        let inside = inside
            .strip_suffix(">;")
            .or_else(|| inside.strip_suffix('>'))
            .unwrap_or(inside)
            .trim();
        debug!("  inside={}", inside);

        match wrapper.kind {
            WrapperKind::PassThrough => self.resolve(inside),
            WrapperKind::Collection => {
                let element = self.resolve(inside)?;
                Ok(ResolvedType {
                    kind: Kind::Array,
                    reference: element.object_reference(),
                })
            }
            WrapperKind::Map => {
                let arguments = split_type_arguments(inside);
                let reference = match arguments.as_slice() {
                    [_key, value] => self.resolve(value)?.object_reference(),
                    _ => None,
                };
                Ok(ResolvedType {
                    kind: Kind::Map,
                    reference,
                })
            }
        }
    }

    fn resolve_object(&mut self, sig: &str) -> Result<ResolvedType> {
        let descriptor = raw_class_descriptor(sig);
        let name = short_name(&descriptor);
        definition_ref(&name)?;

        if self.memo.contains(&descriptor) {
            debug!("  already parsed type => {}", descriptor);
            return Ok(ResolvedType::object(name));
        }
        debug!("  parse new object => {}", descriptor);
        self.memo.insert(descriptor.clone());

        let Some(path) = self.class_index.lookup(&descriptor).map(Path::to_path_buf) else {
            debug!("  no file found => minimal def => {}", name);
            self.ensure_definition(&name);
            return Ok(ResolvedType::object(name));
        };

        let fields = match read_fields(&path) {
            Ok(fields) => fields,
            Err(e) => {
                warn!(
                    "Could not read fields of {} from {}: {}",
                    descriptor,
                    path.display(),
                    e
                );
                self.definitions.insert(name.clone(), Schema::empty_object());
                return Ok(ResolvedType::object(name));
            }
        };

        debug!("  building schema with {} fields => {}", fields.len(), name);
        let mut properties = IndexMap::new();
        for (field_name, field_descriptor) in fields {
            let resolved = self.resolve(&field_descriptor)?;
            properties.insert(field_name, property_schema(&resolved)?);
        }
        if self.definitions.contains_key(&name) {
            debug!("  definition {} replaced by {}", name, descriptor);
        }
        self.definitions.insert(name.clone(), Schema::object(properties));

        Ok(ResolvedType::object(name))
    }

    /// Registers an empty object definition under `name` unless one exists.
    pub fn ensure_definition(&mut self, name: &str) {
        self.definitions
            .entry(name.to_string())
            .or_insert_with(Schema::empty_object);
    }

    #[cfg(test)]
    fn is_memoized(&self, descriptor: &str) -> bool {
        self.memo.contains(&raw_class_descriptor(descriptor))
    }

    pub fn definitions(&self) -> &IndexMap<String, Schema> {
        &self.definitions
    }

    pub fn into_definitions(self) -> IndexMap<String, Schema> {
        self.definitions
    }
}
