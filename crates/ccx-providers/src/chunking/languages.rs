//! Per-language extraction tables
//!
//! Each supported grammar declares which node kinds are top-level
//! declarations worth keeping whole, which act as containers to descend
//! into when oversized, and which structural kinds are transparent during
//! traversal.

use ccx_domain::entities::SymbolKind;

/// Static description of one supported language
pub struct LanguageSpec {
    /// Language identifier stored on chunks
    pub name: &'static str,
    language: fn() -> tree_sitter::Language,
    declarations: &'static [(&'static str, SymbolKind)],
    containers: &'static [&'static str],
    passthrough: &'static [&'static str],
}

impl LanguageSpec {
    /// Grammar for this language
    pub fn language(&self) -> tree_sitter::Language {
        (self.language)()
    }

    /// Symbol kind when `node_kind` is a declaration
    pub fn declaration_kind(&self, node_kind: &str) -> Option<SymbolKind> {
        self.declarations
            .iter()
            .find(|(kind, _)| *kind == node_kind)
            .map(|(_, symbol)| *symbol)
    }

    /// Whether an oversized declaration of this kind can be descended into
    pub fn is_container(&self, node_kind: &str) -> bool {
        self.containers.contains(&node_kind)
    }

    /// Whether traversal passes through this structural kind
    pub fn is_passthrough(&self, node_kind: &str) -> bool {
        self.passthrough.contains(&node_kind)
    }
}

static RUST: LanguageSpec = LanguageSpec {
    name: "rust",
    language: || tree_sitter_rust::LANGUAGE.into(),
    declarations: &[
        ("function_item", SymbolKind::Function),
        ("struct_item", SymbolKind::Class),
        ("enum_item", SymbolKind::Class),
        ("union_item", SymbolKind::Class),
        ("trait_item", SymbolKind::Class),
        ("impl_item", SymbolKind::Class),
        ("mod_item", SymbolKind::Module),
        ("macro_definition", SymbolKind::Other),
        ("type_item", SymbolKind::Other),
        ("const_item", SymbolKind::Other),
        ("static_item", SymbolKind::Other),
    ],
    containers: &["impl_item", "trait_item", "mod_item"],
    passthrough: &["declaration_list", "source_file"],
};

static PYTHON: LanguageSpec = LanguageSpec {
    name: "python",
    language: || tree_sitter_python::LANGUAGE.into(),
    declarations: &[
        ("function_definition", SymbolKind::Function),
        ("class_definition", SymbolKind::Class),
    ],
    containers: &["class_definition"],
    passthrough: &["decorated_definition", "block", "module"],
};

static JAVASCRIPT: LanguageSpec = LanguageSpec {
    name: "javascript",
    language: || tree_sitter_javascript::LANGUAGE.into(),
    declarations: &[
        ("function_declaration", SymbolKind::Function),
        ("generator_function_declaration", SymbolKind::Function),
        ("class_declaration", SymbolKind::Class),
        ("method_definition", SymbolKind::Method),
    ],
    containers: &["class_declaration"],
    passthrough: &["export_statement", "class_body", "program"],
};

static TYPESCRIPT: LanguageSpec = LanguageSpec {
    name: "typescript",
    language: || tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
    declarations: &[
        ("function_declaration", SymbolKind::Function),
        ("generator_function_declaration", SymbolKind::Function),
        ("class_declaration", SymbolKind::Class),
        ("abstract_class_declaration", SymbolKind::Class),
        ("interface_declaration", SymbolKind::Class),
        ("enum_declaration", SymbolKind::Class),
        ("type_alias_declaration", SymbolKind::Other),
        ("method_definition", SymbolKind::Method),
        ("module", SymbolKind::Module),
    ],
    containers: &["class_declaration", "abstract_class_declaration", "module"],
    passthrough: &["export_statement", "class_body", "program", "statement_block"],
};

static GO: LanguageSpec = LanguageSpec {
    name: "go",
    language: || tree_sitter_go::LANGUAGE.into(),
    declarations: &[
        ("function_declaration", SymbolKind::Function),
        ("method_declaration", SymbolKind::Method),
        ("type_declaration", SymbolKind::Class),
        ("const_declaration", SymbolKind::Other),
        ("var_declaration", SymbolKind::Other),
    ],
    containers: &[],
    passthrough: &["source_file"],
};

/// Resolve the language spec for a file extension
pub fn spec_for_extension(extension: &str) -> Option<&'static LanguageSpec> {
    match extension {
        "rs" => Some(&RUST),
        "py" => Some(&PYTHON),
        "js" | "jsx" | "mjs" => Some(&JAVASCRIPT),
        "ts" | "tsx" => Some(&TYPESCRIPT),
        "go" => Some(&GO),
        _ => None,
    }
}

/// Language identifier for extensions without grammar support
pub fn fallback_language(extension: &str) -> &'static str {
    match extension {
        "md" | "markdown" => "markdown",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "hpp" | "cc" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "php" => "php",
        "swift" => "swift",
        "kt" => "kotlin",
        "toml" => "toml",
        "yaml" | "yml" => "yaml",
        "json" => "json",
        _ => "text",
    }
}
