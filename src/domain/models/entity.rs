use serde::{Deserialize, Serialize};

/// Separator between a file path and an entity's local name.
pub const QUALIFIER_SEPARATOR: &str = "::";

/// Builds the run-unique name of an entity declared in `file_path`.
pub fn qualified_name(file_path: &str, local_name: &str) -> String {
    format!("{}{}{}", file_path, QUALIFIER_SEPARATOR, local_name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Function,
    Class,
    Script,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Function => "Function",
            EntityKind::Class => "Class",
            EntityKind::Script => "Script",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A function, class or whole-file script extracted from one source file.
///
/// `calls` and `string_statements` are only present on functions (and, empty,
/// on the fallback script); `methods` only on classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    kind: EntityKind,
    qualified_name: String,
    start_line: u32,
    end_line: u32,
    source_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    docstring: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    calls: Option<Vec<String>>,
    /// Standalone string-literal expression statements. These are not source
    /// comments; a syntax tree never sees comments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    string_statements: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    methods: Option<Vec<String>>,
}

impl Entity {
    pub fn new(
        kind: EntityKind,
        qualified_name: String,
        start_line: u32,
        end_line: u32,
        source_text: String,
    ) -> Self {
        Self {
            kind,
            qualified_name,
            start_line,
            end_line,
            source_text,
            docstring: None,
            calls: None,
            string_statements: None,
            methods: None,
        }
    }

    /// The fallback entity for a file without functions or classes.
    pub fn script(file_path: &str, content: &str, docstring: Option<String>) -> Self {
        let line_count = content.lines().count() as u32;
        let mut entity = Self::new(
            EntityKind::Script,
            file_path.to_string(),
            1,
            line_count,
            content.to_string(),
        )
        .with_calls(Vec::new())
        .with_string_statements(Vec::new());
        entity.docstring = docstring;
        entity
    }

    pub fn with_docstring(mut self, docstring: impl Into<String>) -> Self {
        self.docstring = Some(docstring.into());
        self
    }

    pub fn with_calls(mut self, calls: Vec<String>) -> Self {
        self.calls = Some(calls);
        self
    }

    pub fn with_string_statements(mut self, statements: Vec<String>) -> Self {
        self.string_statements = Some(statements);
        self
    }

    pub fn with_methods(mut self, methods: Vec<String>) -> Self {
        self.methods = Some(methods);
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn start_line(&self) -> u32 {
        self.start_line
    }

    pub fn end_line(&self) -> u32 {
        self.end_line
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn docstring(&self) -> Option<&str> {
        self.docstring.as_deref()
    }

    pub fn calls(&self) -> &[String] {
        self.calls.as_deref().unwrap_or(&[])
    }

    pub fn string_statements(&self) -> &[String] {
        self.string_statements.as_deref().unwrap_or(&[])
    }

    pub fn methods(&self) -> &[String] {
        self.methods.as_deref().unwrap_or(&[])
    }
}

/// One function's outbound calls, in source order with duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEdge {
    caller: String,
    calls: Vec<String>,
}

impl CallEdge {
    pub fn new(caller: String, calls: Vec<String>) -> Self {
        Self { caller, calls }
    }

    pub fn caller(&self) -> &str {
        &self.caller
    }

    pub fn calls(&self) -> &[String] {
        &self.calls
    }
}
