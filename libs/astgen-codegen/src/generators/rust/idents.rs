//! Rust identifier helpers

use heck::ToSnakeCase;

/// Keywords of the 2021 edition, strict and reserved
const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Keywords rejected even in `r#` form
const NON_RAW_KEYWORDS: &[&str] = &["crate", "self", "Self", "super"];

/// Constructor name for a variant
///
/// An underscore goes before every capital except a leading one, then the
/// result is lowercased: "BinaryOp" -> "binary_op", "IOStmt" -> "i_o_stmt".
pub fn constructor_name(variant: &str) -> String {
    let mut name = String::with_capacity(variant.len() + 4);
    for (i, c) in variant.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            name.push('_');
        }
        name.push(c.to_ascii_lowercase());
    }
    sanitize_ident(&name)
}

/// Module a family is generated into (e.g., "VarDecl" -> "var_decl")
pub fn module_name(family: &str) -> String {
    family.to_snake_case()
}

/// Make a schema identifier usable as a Rust identifier
pub fn sanitize_ident(name: &str) -> String {
    if !is_rust_keyword(name) {
        name.to_string()
    } else if NON_RAW_KEYWORDS.contains(&name) {
        format!("{}_", name)
    } else {
        format!("r#{}", name)
    }
}

pub fn is_rust_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}
