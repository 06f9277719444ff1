//! Field declarations of a class.
//!
//! Only consulted by the type resolver, and only when an object type has to be expanded into a
//! definition.

use crate::extractor::retrofit::parse_signature;
use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

/// `.field private final name:Ljava/lang/String;` and friends, optionally followed by an
/// initial value.
static FIELD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*\.field\s+((?:[\w-]+\s+)*?)([\w$-]+):([^\s=]+)").expect("Invalid regex")
});

const END_FIELD: &str = ".end field";

/// Returns instance field name → type descriptor, in declaration order.
///
/// A field whose declaration is followed by a `.end field` block carrying a `Signature`
/// annotation gets the generic descriptor from that annotation instead of the erased one.
/// `static` fields are left out: constants, companions and serializer caches are not part of the
/// JSON shape of an object.
pub fn extract_fields(content: &str) -> IndexMap<String, String> {
    let lines: Vec<_> = FIELD_LINE.captures_iter(content).collect();
    let mut fields = IndexMap::new();

    for (i, caps) in lines.iter().enumerate() {
        if caps[1].split_whitespace().any(|modifier| modifier == "static") {
            continue;
        }
        let name = caps[2].to_string();

        let start = caps.get(0).map_or(0, |m| m.end());
        let limit = lines
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(content.len(), |m| m.start());
        let section = &content[start..limit];
        let section = section.find(".method").map_or(section, |end| &section[..end]);
        let descriptor = section
            .find(END_FIELD)
            .and_then(|end| parse_signature(&section[..end]))
            .unwrap_or_else(|| caps[3].to_string());

        debug!("  field: {} => {}", name, descriptor);
        fields.insert(name, descriptor);
    }
    debug!("Found {} fields", fields.len());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEM: &str = r#".class public final Lcom/example/model/Item;
.super Ljava/lang/Object;

# static fields
.field public static final CREATOR:Landroid/os/Parcelable$Creator;
.field private static final serialVersionUID:J = 0x1L

# instance fields
.field private final id:Ljava/lang/String;
.field private count:I
.field public tags:Ljava/util/List;
    .annotation system Ldalvik/annotation/Signature;
        value = {
            "Ljava/util/List<",
            "Ljava/lang/String;",
            ">;"
        }
    .end annotation
.end field
.field private transient volatile cached:Z = false
.field parent:Lcom/example/model/Item;
.field private final synthetic this$0:Lcom/example/model/Outer;
"#;

    #[test]
    fn test_extract_instance_fields_in_order() {
        let fields = extract_fields(ITEM);
        let names: Vec<&str> = fields.keys().map(String::as_str).collect();

        assert_eq!(
            names,
            vec!["id", "count", "tags", "cached", "parent", "this$0"]
        );
    }

    #[test]
    fn test_field_descriptors() {
        let fields = extract_fields(ITEM);

        assert_eq!(fields["id"], "Ljava/lang/String;");
        assert_eq!(fields["count"], "I");
        assert_eq!(fields["tags"], "Ljava/util/List<Ljava/lang/String;>;");
        assert_eq!(fields["cached"], "Z");
        assert_eq!(fields["parent"], "Lcom/example/model/Item;");
    }

    #[test]
    fn test_static_fields_skipped() {
        let fields = extract_fields(ITEM);

        assert!(!fields.contains_key("CREATOR"));
        assert!(!fields.contains_key("serialVersionUID"));
    }

    #[test]
    fn test_signature_does_not_leak_into_next_method() {
        let content = r#".field private items:Ljava/util/List;

.method public getItems()Ljava/util/List;
    .annotation system Ldalvik/annotation/Signature;
        value = {
            "()",
            "Ljava/util/List<",
            "Lcom/example/Item;",
            ">;"
        }
    .end annotation
.end method
"#;
        let fields = extract_fields(content);
        assert_eq!(fields["items"], "Ljava/util/List;");
    }

    #[test]
    fn test_no_fields() {
        assert!(extract_fields(".class public LEmpty;\n").is_empty());
    }
}
