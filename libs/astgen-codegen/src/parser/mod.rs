//! Parser for grammar schemas
//!
//! Reads the JSON schema document (family name to a list of variant entries)
//! and turns every entry of the form `Name : Type1 field1, Type2 field2` into
//! the intermediate representation (IR) consumed by the generators.

use crate::error::{Error, MalformedReason, Result};
use crate::generators::rust::idents::{constructor_name, is_rust_keyword};
use crate::ir::{Family, FieldDescriptor, SchemaDocument, VariantDescriptor};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Stands in for `,` inside declared types, since `,` already separates fields
pub const TYPE_ARGUMENT_SEPARATOR: char = '-';

impl SchemaDocument {
    /// Read and decode a schema document from disk
    pub fn load(path: &Path) -> Result<Self> {
        let origin = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|e| Error::schema_load(&origin, e))?;
        Self::from_json_str(&origin, &text)
    }

    /// Decode a schema document from JSON text
    ///
    /// `origin` only labels errors (usually the file path).
    pub fn from_json_str(origin: &str, text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| Error::schema_load(origin, e))?;

        let Value::Object(map) = value else {
            return Err(Error::schema_load(
                origin,
                "top level must be an object mapping family names to variant lists",
            ));
        };

        let mut document = SchemaDocument::new();
        for (family, entries) in map {
            let entries = entries
                .as_array()
                .ok_or_else(|| {
                    Error::schema_load(origin, format!("family '{}' must be an array", family))
                })?
                .iter()
                .map(|entry| {
                    entry.as_str().map(String::from).ok_or_else(|| {
                        Error::schema_load(
                            origin,
                            format!("family '{}' contains a non-string entry", family),
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            document.push_family(family, entries);
        }

        Ok(document)
    }
}

/// Parse every family of a schema document, in document order
pub fn parse_schema(document: &SchemaDocument) -> Result<Vec<Family>> {
    document
        .families()
        .map(|raw| parse_family(&raw.name, &raw.entries))
        .collect()
}

/// Parse the entries of one family
pub fn parse_family<S: AsRef<str>>(name: &str, entries: &[S]) -> Result<Family> {
    let mut constructors: HashMap<String, String> = HashMap::new();
    let mut variants = Vec::with_capacity(entries.len());

    for entry in entries {
        let entry = entry.as_ref();
        let variant = parse_variant(entry)?;

        let constructor = constructor_name(&variant.name);
        if let Some(first) = constructors.get(&constructor) {
            let reason = if *first == variant.name {
                MalformedReason::DuplicateVariant(variant.name)
            } else {
                MalformedReason::ConstructorClash {
                    constructor,
                    first: first.clone(),
                    second: variant.name,
                }
            };
            return Err(Error::malformed(entry, reason));
        }
        constructors.insert(constructor, variant.name.clone());
        variants.push(variant);
    }

    debug!(family = name, variants = variants.len(), "parsed family");

    Ok(Family {
        name: name.to_string(),
        variants,
    })
}

/// Parse a single variant entry
pub fn parse_variant(entry: &str) -> Result<VariantDescriptor> {
    let (name, field_list) = entry
        .split_once(':')
        .ok_or_else(|| Error::malformed(entry, MalformedReason::MissingSeparator))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(Error::malformed(entry, MalformedReason::EmptyVariantName));
    }
    // Variant names become type names, which cannot be escaped
    if !is_identifier(name) || is_rust_keyword(name) {
        return Err(Error::malformed(
            entry,
            MalformedReason::InvalidIdentifier(name.to_string()),
        ));
    }

    let fields = parse_fields(entry, field_list)?;

    Ok(VariantDescriptor {
        name: name.to_string(),
        fields,
    })
}

/// Parse the text after the `:` of an entry
fn parse_fields(entry: &str, field_list: &str) -> Result<Vec<FieldDescriptor>> {
    // `Empty : ` declares a variant without fields
    if field_list.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut seen = HashSet::new();
    let mut fields = Vec::new();

    for fragment in field_list.split(',') {
        let field = parse_field(entry, fragment)?;
        if !seen.insert(field.name.clone()) {
            return Err(Error::malformed(
                entry,
                MalformedReason::DuplicateField(field.name),
            ));
        }
        fields.push(field);
    }

    Ok(fields)
}

/// Parse one `Type name` fragment
fn parse_field(entry: &str, fragment: &str) -> Result<FieldDescriptor> {
    let tokens: Vec<&str> = fragment.split_whitespace().collect();
    let [declared_type, name] = tokens.as_slice() else {
        return Err(Error::malformed(
            entry,
            MalformedReason::FieldShape(fragment.trim().to_string()),
        ));
    };

    let name = name.trim();
    if !is_identifier(name) {
        return Err(Error::malformed(
            entry,
            MalformedReason::InvalidIdentifier(name.to_string()),
        ));
    }

    Ok(FieldDescriptor::new(
        name,
        rewrite_type_separator(declared_type),
    ))
}

/// Rewrite the schema's argument separator into the target syntax
/// E.g., "Rc<Vec<(Rc<Expr>-Rc<Stmt>)>>" -> "Rc<Vec<(Rc<Expr>,Rc<Stmt>)>>"
fn rewrite_type_separator(declared_type: &str) -> String {
    declared_type.replace(TYPE_ARGUMENT_SEPARATOR, ",")
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(err: Error) -> MalformedReason {
        match err {
            Error::MalformedVariant { reason, .. } => reason,
            other => panic!("expected MalformedVariant, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_variant_with_fields() {
        let variant = parse_variant("Binary : Expr left, Token operator, Expr right").unwrap();

        assert_eq!(variant.name, "Binary");
        assert_eq!(
            variant.fields,
            vec![
                FieldDescriptor::new("left", "Expr"),
                FieldDescriptor::new("operator", "Token"),
                FieldDescriptor::new("right", "Expr"),
            ]
        );
    }

    #[test]
    fn test_parse_variant_tolerates_irregular_whitespace() {
        let variant = parse_variant("  Pair:Object   left ,\tObject right  ").unwrap();
        assert_eq!(variant.name, "Pair");
        assert_eq!(variant.field_names(), vec!["left", "right"]);
    }

    #[test]
    fn test_separator_is_rewritten_at_parse_time() {
        let variant = parse_variant(
            "IfStmt : Rc<Vec<(Rc<Expr>-Rc<Stmt>)>> conditionals, Rc<Option<Rc<Stmt>>> else_block",
        )
        .unwrap();

        assert_eq!(
            variant.fields[0].declared_type,
            "Rc<Vec<(Rc<Expr>,Rc<Stmt>)>>"
        );
        assert_eq!(variant.fields[1].declared_type, "Rc<Option<Rc<Stmt>>>");
    }

    #[test]
    fn test_zero_field_variant() {
        let variant = parse_variant("Empty : ").unwrap();
        assert_eq!(variant.name, "Empty");
        assert!(variant.is_empty());

        let variant = parse_variant("Nil:").unwrap();
        assert!(variant.fields.is_empty());
    }

    #[test]
    fn test_missing_colon_is_rejected() {
        let err = parse_variant("Bad-NoColon").unwrap_err();
        assert_eq!(reason(err), MalformedReason::MissingSeparator);
    }

    #[test]
    fn test_single_token_fragment_is_rejected() {
        let err = parse_variant("Grouping : OnlyOneToken").unwrap_err();
        assert_eq!(
            reason(err),
            MalformedReason::FieldShape("OnlyOneToken".to_string())
        );
    }

    #[test]
    fn test_three_token_fragment_is_rejected() {
        let err = parse_variant("Grouping : Expr inner extra").unwrap_err();
        assert!(matches!(reason(err), MalformedReason::FieldShape(_)));
    }

    #[test]
    fn test_trailing_comma_is_rejected() {
        let err = parse_variant("Unary : Token operator, Expr right,").unwrap_err();
        assert_eq!(reason(err), MalformedReason::FieldShape(String::new()));
    }

    #[test]
    fn test_empty_variant_name_is_rejected() {
        let err = parse_variant("   : Expr value").unwrap_err();
        assert_eq!(reason(err), MalformedReason::EmptyVariantName);
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let err = parse_variant("Two Words : Expr value").unwrap_err();
        assert!(matches!(reason(err), MalformedReason::InvalidIdentifier(_)));

        let err = parse_variant("Literal : Object 1value").unwrap_err();
        assert_eq!(
            reason(err),
            MalformedReason::InvalidIdentifier("1value".to_string())
        );
    }

    #[test]
    fn test_duplicate_field_is_rejected() {
        let err = parse_variant("Pair : Expr side, Expr side").unwrap_err();
        assert_eq!(
            reason(err),
            MalformedReason::DuplicateField("side".to_string())
        );
    }

    #[test]
    fn test_duplicate_variant_is_rejected() {
        let err = parse_family("Expr", &["Literal : Object value", "Literal : Token value"])
            .unwrap_err();
        assert_eq!(
            reason(err),
            MalformedReason::DuplicateVariant("Literal".to_string())
        );
    }

    #[test]
    fn test_variants_sharing_a_constructor_are_rejected() {
        let err = parse_family("Stmt", &["IoStmt : Expr value", "Io_stmt : Expr value"])
            .unwrap_err();
        assert_eq!(
            reason(err),
            MalformedReason::ConstructorClash {
                constructor: "io_stmt".to_string(),
                first: "IoStmt".to_string(),
                second: "Io_stmt".to_string(),
            }
        );

        let family = parse_family("Stmt", &["IOStmt : Expr value", "IoStmt : Expr value"]).unwrap();
        assert_eq!(family.variants.len(), 2);
    }

    #[test]
    fn test_keyword_variant_names_are_rejected() {
        for name in ["Self", "self", "type", "crate"] {
            let err = parse_variant(&format!("{name} : Expr value")).unwrap_err();
            assert_eq!(
                reason(err),
                MalformedReason::InvalidIdentifier(name.to_string())
            );
        }

        assert!(parse_variant("If : Expr condition").is_ok());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = r#"{"Expr": ["Grouping : Expr expression", "Literal : Object value"]}"#;
        let doc = SchemaDocument::from_json_str("inline", text).unwrap();

        assert_eq!(parse_schema(&doc).unwrap(), parse_schema(&doc).unwrap());
    }

    #[test]
    fn test_document_preserves_family_order() {
        let text = r#"{"Stmt": ["ExprStmt : Expr expr"], "Expr": ["Variable : Token name"]}"#;
        let doc = SchemaDocument::from_json_str("inline", text).unwrap();
        let families = parse_schema(&doc).unwrap();

        let names: Vec<_> = families.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Stmt", "Expr"]);
    }

    #[test]
    fn test_invalid_documents_are_schema_load_errors() {
        for text in [
            "not json",
            r#"["Binary : Expr left"]"#,
            r#"{"Expr": "Binary : Expr left"}"#,
            r#"{"Expr": [42]}"#,
        ] {
            let err = SchemaDocument::from_json_str("inline", text).unwrap_err();
            assert!(matches!(err, Error::SchemaLoad { .. }), "{text}: {err:?}");
        }
    }

    #[test]
    fn test_missing_file_is_schema_load_error() {
        let err = SchemaDocument::load(Path::new("/nonexistent/ast_def.json")).unwrap_err();
        assert!(matches!(err, Error::SchemaLoad { .. }));
    }
}
