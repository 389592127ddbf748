//! Type mapping from declared schema tokens to Rust representations
//!
//! The resolver is shared by every generator. It knows which families the
//! schema declares, which extern types pass through unchanged, and which
//! ownership policy is in effect for the run.

use crate::error::{Error, Result};
use crate::ir::{
    Family, FieldDescriptor, ResolvedFamily, ResolvedField, ResolvedVariant, TypeKind,
    VariantDescriptor,
};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// Declared type standing for an opaque, dynamically typed payload
pub const DYNAMIC_TYPE: &str = "Any";

/// Ownership policy applied to family references and dynamic payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// Fields hold shared handles and constructors return a shared handle
    Shared,
    /// Fields hold shared handles and constructors return the union by value
    Value,
    /// Fields hold boxed trait objects (open polymorphic form)
    Owned,
}

impl Policy {
    /// Whether family references and `Any` map to the shared handle
    pub fn uses_shared_handle(self) -> bool {
        matches!(self, Policy::Shared | Policy::Value)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Policy::Shared => "shared",
            Policy::Value => "value",
            Policy::Owned => "owned",
        };
        f.write_str(s)
    }
}

/// Reference-counting mechanism behind the shared policies
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SharedHandle {
    /// `std::rc::Rc`, single-threaded
    #[default]
    Rc,
    /// `std::sync::Arc`, thread-safe
    Arc,
}

impl SharedHandle {
    pub fn type_name(self) -> &'static str {
        match self {
            SharedHandle::Rc => "Rc",
            SharedHandle::Arc => "Arc",
        }
    }

    /// The `use` line bringing the handle into scope
    pub fn import(self) -> &'static str {
        match self {
            SharedHandle::Rc => "use std::rc::Rc;",
            SharedHandle::Arc => "use std::sync::Arc;",
        }
    }

    /// Wrap a type in this handle
    pub fn wrap(self, inner: &str) -> String {
        format!("{}<{}>", self.type_name(), inner)
    }
}

/// Maps declared types to Rust types under one policy
#[derive(Debug, Clone)]
pub struct TypeResolver {
    policy: Policy,
    handle: SharedHandle,
    families: BTreeSet<String>,
    extern_types: BTreeSet<String>,
}

impl TypeResolver {
    pub fn new(policy: Policy, handle: SharedHandle) -> Self {
        Self {
            policy,
            handle,
            families: BTreeSet::new(),
            extern_types: BTreeSet::new(),
        }
    }

    /// Register the families that may be referenced by name
    pub fn with_families<I, S>(mut self, families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.families.extend(families.into_iter().map(Into::into));
        self
    }

    /// Register types defined outside the generated module
    pub fn with_extern_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extern_types.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn handle(&self) -> SharedHandle {
        self.handle
    }

    /// Resolve a declared type as seen from inside `family`
    ///
    /// Returns `None` when the token is not covered by the mapping table.
    pub fn resolve(&self, family: &str, declared_type: &str) -> Option<(String, TypeKind)> {
        if declared_type == DYNAMIC_TYPE {
            return Some((self.wrap_dynamic(DYNAMIC_TYPE), TypeKind::Dynamic));
        }

        if self.families.contains(declared_type) || declared_type == family {
            let kind = if declared_type == family {
                TypeKind::SelfReference
            } else {
                TypeKind::CrossFamily(declared_type.to_string())
            };
            return Some((self.wrap_family(declared_type), kind));
        }

        if self.is_final(declared_type) {
            return Some((declared_type.to_string(), TypeKind::Final));
        }

        None
    }

    /// Resolve one field of a variant
    pub fn resolve_field(
        &self,
        family: &str,
        variant: &VariantDescriptor,
        field: &FieldDescriptor,
    ) -> Result<ResolvedField> {
        let (rust_type, kind) =
            self.resolve(family, &field.declared_type)
                .ok_or_else(|| Error::UnresolvedType {
                    family: family.to_string(),
                    variant: variant.name.clone(),
                    field: field.name.clone(),
                    declared_type: field.declared_type.clone(),
                })?;

        Ok(ResolvedField {
            name: field.name.clone(),
            declared_type: field.declared_type.clone(),
            rust_type,
            kind,
        })
    }

    /// Resolve every field of a family, failing on the first unmapped type
    pub fn resolve_family(&self, family: &Family) -> Result<ResolvedFamily> {
        let mut variants = Vec::with_capacity(family.variants.len());
        let mut dependencies: Vec<String> = Vec::new();

        for variant in &family.variants {
            let fields = variant
                .fields
                .iter()
                .map(|field| self.resolve_field(&family.name, variant, field))
                .collect::<Result<Vec<_>>>()?;

            for field in &fields {
                if let TypeKind::CrossFamily(dep) = &field.kind {
                    if !dependencies.contains(dep) {
                        dependencies.push(dep.clone());
                    }
                }
            }

            variants.push(ResolvedVariant {
                name: variant.name.clone(),
                fields,
            });
        }

        debug!(
            family = %family.name,
            policy = %self.policy,
            dependencies = ?dependencies,
            "resolved family"
        );

        Ok(ResolvedFamily {
            name: family.name.clone(),
            variants,
            dependencies,
        })
    }

    /// Other families referenced by `family`, in order of first reference
    pub fn dependencies(&self, family: &Family) -> Vec<String> {
        let mut deps: Vec<String> = Vec::new();
        for field in family.variants.iter().flat_map(|v| v.fields.iter()) {
            let name = &field.declared_type;
            if name != &family.name && self.families.contains(name) && !deps.contains(name) {
                deps.push(name.clone());
            }
        }
        deps
    }

    fn wrap_dynamic(&self, inner: &str) -> String {
        if self.policy.uses_shared_handle() {
            self.handle.wrap(&format!("dyn {}", inner))
        } else {
            format!("Box<dyn {}>", inner)
        }
    }

    fn wrap_family(&self, family: &str) -> String {
        if self.policy.uses_shared_handle() {
            self.handle.wrap(family)
        } else {
            format!("Box<dyn {}>", family)
        }
    }

    fn is_final(&self, declared_type: &str) -> bool {
        is_primitive_type(declared_type)
            || self.extern_types.contains(declared_type)
            || is_compound_type(declared_type)
    }
}

/// Check if a type is a Rust primitive or a std type needing no mapping
fn is_primitive_type(type_name: &str) -> bool {
    matches!(
        type_name,
        "bool"
            | "char"
            | "i8"
            | "i16"
            | "i32"
            | "i64"
            | "i128"
            | "isize"
            | "u8"
            | "u16"
            | "u32"
            | "u64"
            | "u128"
            | "usize"
            | "f32"
            | "f64"
            | "String"
            | "()"
    )
}

/// Tokens already spelled in target syntax (e.g., "Rc<Vec<Rc<Stmt>>>")
fn is_compound_type(type_name: &str) -> bool {
    type_name.contains(['<', '>', '(', ')', '[', ']', '&', ','])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_family;

    fn resolver(policy: Policy) -> TypeResolver {
        TypeResolver::new(policy, SharedHandle::Rc)
            .with_families(["Expr", "Stmt"])
            .with_extern_types(["Token", "Object"])
    }

    fn rust_type(resolver: &TypeResolver, family: &str, declared: &str) -> String {
        resolver.resolve(family, declared).unwrap().0
    }

    #[test]
    fn test_final_tokens_pass_unchanged_under_every_policy() {
        for policy in [Policy::Shared, Policy::Value, Policy::Owned] {
            let r = resolver(policy);
            assert_eq!(rust_type(&r, "Expr", "f64"), "f64");
            assert_eq!(rust_type(&r, "Expr", "Token"), "Token");
            assert_eq!(
                rust_type(&r, "Stmt", "Rc<Vec<Rc<Stmt>>>"),
                "Rc<Vec<Rc<Stmt>>>"
            );
            assert_eq!(
                r.resolve("Expr", "Token").unwrap().1,
                TypeKind::Final
            );
        }
    }

    #[test]
    fn test_shared_policy_table() {
        let r = resolver(Policy::Shared);
        assert_eq!(rust_type(&r, "Expr", "Any"), "Rc<dyn Any>");
        assert_eq!(rust_type(&r, "Expr", "Expr"), "Rc<Expr>");
        assert_eq!(rust_type(&r, "Stmt", "Expr"), "Rc<Expr>");
    }

    #[test]
    fn test_value_policy_uses_the_same_field_handles() {
        let r = resolver(Policy::Value);
        assert_eq!(rust_type(&r, "Expr", "Any"), "Rc<dyn Any>");
        assert_eq!(rust_type(&r, "Expr", "Expr"), "Rc<Expr>");
        assert_eq!(rust_type(&r, "Stmt", "Expr"), "Rc<Expr>");
    }

    #[test]
    fn test_owned_policy_table() {
        let r = resolver(Policy::Owned);
        assert_eq!(rust_type(&r, "Expr", "Any"), "Box<dyn Any>");
        assert_eq!(rust_type(&r, "Expr", "Expr"), "Box<dyn Expr>");
        assert_eq!(rust_type(&r, "Stmt", "Expr"), "Box<dyn Expr>");
    }

    #[test]
    fn test_arc_handle() {
        let r = TypeResolver::new(Policy::Shared, SharedHandle::Arc).with_families(["Expr"]);
        assert_eq!(rust_type(&r, "Expr", "Expr"), "Arc<Expr>");
        assert_eq!(rust_type(&r, "Expr", "Any"), "Arc<dyn Any>");
    }

    #[test]
    fn test_reference_kinds() {
        let r = resolver(Policy::Shared);
        assert_eq!(
            r.resolve("Expr", "Expr").unwrap().1,
            TypeKind::SelfReference
        );
        assert_eq!(
            r.resolve("Stmt", "Expr").unwrap().1,
            TypeKind::CrossFamily("Expr".to_string())
        );
        assert_eq!(r.resolve("Expr", "Any").unwrap().1, TypeKind::Dynamic);
    }

    #[test]
    fn test_self_reference_without_registration() {
        let r = TypeResolver::new(Policy::Shared, SharedHandle::Rc);
        assert_eq!(rust_type(&r, "Decl", "Decl"), "Rc<Decl>");
    }

    #[test]
    fn test_unknown_type_names_field_and_variant() {
        let family = parse_family("Expr", &["Call : Expr callee, Callable target"]).unwrap();
        let err = resolver(Policy::Shared)
            .resolve_family(&family)
            .unwrap_err();

        match err {
            Error::UnresolvedType {
                family,
                variant,
                field,
                declared_type,
            } => {
                assert_eq!(family, "Expr");
                assert_eq!(variant, "Call");
                assert_eq!(field, "target");
                assert_eq!(declared_type, "Callable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let family = parse_family(
            "Stmt",
            &["Print : Expr expr", "While : Expr condition, Stmt body"],
        )
        .unwrap();
        let r = resolver(Policy::Value);

        assert_eq!(
            r.resolve_family(&family).unwrap(),
            r.resolve_family(&family).unwrap()
        );
    }

    #[test]
    fn test_dependencies_in_first_reference_order() {
        let r = TypeResolver::new(Policy::Shared, SharedHandle::Rc)
            .with_families(["Expr", "Stmt", "Pattern"]);
        let family = parse_family(
            "Stmt",
            &[
                "Match : Pattern pattern, Expr subject",
                "Print : Expr expr",
                "Block : Stmt inner",
            ],
        )
        .unwrap();

        assert_eq!(r.dependencies(&family), vec!["Pattern", "Expr"]);
        assert_eq!(
            r.resolve_family(&family).unwrap().dependencies,
            vec!["Pattern", "Expr"]
        );
    }
}
