//! Intermediate Representation (IR)
//!
//! Language-agnostic representation of the tagged-union families declared in a
//! grammar schema. The parser produces these records; the resolver and the
//! generators only ever read them.

use std::fmt;

/// Raw schema document: family name to its variant entries, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDocument {
    families: Vec<RawFamily>,
}

/// One top-level key of the schema document before parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFamily {
    /// Family name (e.g., "Expr", "Stmt")
    pub name: String,
    /// Unparsed variant entries (e.g., "Binary : Expr left, Token operator, Expr right")
    pub entries: Vec<String>,
}

impl SchemaDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a family, keeping insertion order
    pub fn push_family(&mut self, name: impl Into<String>, entries: Vec<String>) {
        self.families.push(RawFamily {
            name: name.into(),
            entries,
        });
    }

    /// Iterate over the families in document order
    pub fn families(&self) -> impl Iterator<Item = &RawFamily> {
        self.families.iter()
    }

    /// Look up a family by name
    pub fn family(&self, name: &str) -> Option<&RawFamily> {
        self.families.iter().find(|f| f.name == name)
    }

    /// Names of every declared family, in document order
    pub fn family_names(&self) -> Vec<String> {
        self.families.iter().map(|f| f.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

/// A named group of variants forming one union type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Family {
    /// The family name, used as the generated type name
    pub name: String,
    /// Variants in schema order
    pub variants: Vec<VariantDescriptor>,
}

impl Family {
    pub fn variant(&self, name: &str) -> Option<&VariantDescriptor> {
        self.variants.iter().find(|v| v.name == name)
    }
}

/// One case of a family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDescriptor {
    /// Capitalized variant name (e.g., "Binary", "VarDeclStmt")
    pub name: String,
    /// Fields in schema order; this is also constructor parameter order
    pub fields: Vec<FieldDescriptor>,
}

impl VariantDescriptor {
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for VariantDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.name)?;
        for (i, field) in self.fields.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{}", sep, field)?;
        }
        Ok(())
    }
}

/// A named, typed field of a variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name as written in the schema
    pub name: String,
    /// Declared type token, with the schema separator already rewritten
    pub declared_type: String,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.declared_type)
    }
}

/// How a declared type was mapped by the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// Primitive, extern or compound token, emitted unchanged
    Final,
    /// The opaque `Any` payload
    Dynamic,
    /// Reference to the family being generated
    SelfReference,
    /// Reference to another family of the same schema
    CrossFamily(String),
}

/// A field after type resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub name: String,
    pub declared_type: String,
    /// Target representation used in declarations and parameters
    pub rust_type: String,
    pub kind: TypeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVariant {
    pub name: String,
    pub fields: Vec<ResolvedField>,
}

/// A family whose every field has been resolved under one policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFamily {
    pub name: String,
    pub variants: Vec<ResolvedVariant>,
    /// Other families referenced by this one, in order of first reference
    pub dependencies: Vec<String>,
}

impl ResolvedFamily {
    /// Whether any field carries the opaque `Any` payload
    pub fn has_dynamic_fields(&self) -> bool {
        self.fields().any(|f| f.kind == TypeKind::Dynamic)
    }

    /// Whether any field is a reference to this or another family
    pub fn has_family_references(&self) -> bool {
        self.fields()
            .any(|f| matches!(f.kind, TypeKind::SelfReference | TypeKind::CrossFamily(_)))
    }

    fn fields(&self) -> impl Iterator<Item = &ResolvedField> {
        self.variants.iter().flat_map(|v| v.fields.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_display_lists_fields_in_order() {
        let variant = VariantDescriptor {
            name: "Binary".to_string(),
            fields: vec![
                FieldDescriptor::new("left", "Expr"),
                FieldDescriptor::new("operator", "Token"),
                FieldDescriptor::new("right", "Expr"),
            ],
        };

        assert_eq!(
            variant.to_string(),
            "Binary -> left: Expr, operator: Token, right: Expr"
        );
        assert_eq!(variant.field_names(), vec!["left", "operator", "right"]);
    }

    #[test]
    fn test_empty_variant_display() {
        let variant = VariantDescriptor {
            name: "Nil".to_string(),
            fields: Vec::new(),
        };
        assert_eq!(variant.to_string(), "Nil ->");
    }

    #[test]
    fn test_schema_document_keeps_insertion_order() {
        let mut doc = SchemaDocument::new();
        doc.push_family("Stmt", vec![]);
        doc.push_family("Expr", vec![]);
        assert_eq!(doc.family_names(), vec!["Stmt", "Expr"]);
        assert!(doc.family("Expr").is_some());
        assert!(doc.family("Decl").is_none());
    }
}
