use std::borrow::Cow;
use std::ops::ControlFlow;

use tracing::debug;
use tree_sitter::{Node, ParseOptions, ParseState, Parser};

use super::python_literal::{clean_docstring, string_literal_value};
use crate::application::{EntityExtractor, ExtractionBudget};
use crate::domain::{
    qualified_name, CallEdge, DomainError, Entity, EntityKind, FileIndex, ImportRecord, Language,
};

/// Python entity extractor backed by tree-sitter.
///
/// One parse and one pre-order traversal per file. All per-file state lives in
/// a [`FileAccumulator`] created for that call, so a single extractor can be
/// shared across worker threads.
pub struct TreeSitterExtractor {
    language: Language,
}

impl TreeSitterExtractor {
    pub fn new() -> Self {
        Self {
            language: Language::Python,
        }
    }

    fn get_ts_language(&self) -> Option<tree_sitter::Language> {
        match self.language {
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Language::Unknown => None,
        }
    }
}

impl Default for TreeSitterExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityExtractor for TreeSitterExtractor {
    fn extract_within(
        &self,
        file_path: &str,
        content: &str,
        budget: &ExtractionBudget,
    ) -> Result<FileIndex, DomainError> {
        let ts_language = self.get_ts_language().ok_or_else(|| {
            DomainError::parse(format!("Unsupported language: {}", self.language))
        })?;

        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| DomainError::parse(format!("Failed to set language: {}", e)))?;

        let content = normalize_newlines(content);
        let bytes = content.as_bytes();
        let len = bytes.len();
        let mut stop_when_exhausted = |_: &ParseState| {
            if budget.is_exhausted() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        let tree = parser.parse_with_options(
            &mut |i, _| (i < len).then(|| &bytes[i..]).unwrap_or_default(),
            None,
            Some(ParseOptions::new().progress_callback(&mut stop_when_exhausted)),
        );
        budget.check()?;
        let tree = tree.ok_or_else(|| DomainError::parse("Failed to parse file"))?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error_line(root).unwrap_or(1);
            return Err(DomainError::parse(format!(
                "Syntax error in {} at line {}",
                file_path, line
            )));
        }
        if let Some((construct, line)) = first_python2_construct(root) {
            return Err(DomainError::parse(format!(
                "Python 2 {} in {} at line {}",
                construct, file_path, line
            )));
        }

        let mut accumulator = FileAccumulator::new(file_path, &content, budget);
        accumulator.traverse(root)?;
        let index = accumulator.finish(root);

        debug!(
            "Extracted {} entities, {} imports from {}",
            index.entities.len(),
            index.imports.len(),
            file_path
        );

        Ok(index)
    }

    fn language(&self) -> Language {
        self.language
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Module,
    Nested,
}

struct FileAccumulator<'a> {
    file_path: &'a str,
    source: &'a str,
    budget: &'a ExtractionBudget,
    line_starts: Vec<usize>,
    index: FileIndex,
    found_definition: bool,
}

impl<'a> FileAccumulator<'a> {
    fn new(file_path: &'a str, source: &'a str, budget: &'a ExtractionBudget) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self {
            file_path,
            source,
            budget,
            line_starts,
            index: FileIndex::empty(),
            found_definition: false,
        }
    }

    fn traverse(&mut self, root: Node<'_>) -> Result<(), DomainError> {
        let mut stack = vec![(root, Scope::Module)];

        while let Some((node, scope)) = stack.pop() {
            self.budget.check()?;
            let child_scope = match node.kind() {
                "import_statement" => {
                    self.visit_import(node);
                    continue;
                }
                "import_from_statement" | "future_import_statement" => {
                    self.visit_import_from(node);
                    continue;
                }
                "assignment" => {
                    if scope == Scope::Module {
                        self.visit_assignment(node);
                    }
                    continue;
                }
                "function_definition" => {
                    self.visit_function(node)?;
                    Scope::Nested
                }
                "class_definition" => {
                    self.visit_class(node);
                    Scope::Nested
                }
                _ => scope,
            };

            let children = named_children(node);
            stack.extend(children.into_iter().rev().map(|child| (child, child_scope)));
        }
        Ok(())
    }

    fn finish(mut self, root: Node<'_>) -> FileIndex {
        if !self.found_definition {
            let docstring = self.docstring_of(root);
            self.index
                .entities
                .push(Entity::script(self.file_path, self.source, docstring));
        }
        self.index
    }

    fn visit_import(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        let names: Vec<Node<'_>> = node.children_by_field_name("name", &mut cursor).collect();
        for name in names {
            let record = ImportRecord::plain(self.import_name(name));
            self.index.add_import(&record);
        }
    }

    fn visit_import_from(&mut self, node: Node<'_>) {
        let module = if node.kind() == "future_import_statement" {
            Some("__future__".to_string())
        } else {
            node.child_by_field_name("module_name")
                .and_then(|m| self.module_path(m))
        };

        // `from . import x` has no module to attribute the name to.
        let Some(module) = module else {
            return;
        };

        let mut cursor = node.walk();
        let names: Vec<Node<'_>> = node.children_by_field_name("name", &mut cursor).collect();
        for name in names {
            let record = ImportRecord::from_module(module.clone(), self.import_name(name));
            self.index.add_import(&record);
        }

        if named_children(node)
            .iter()
            .any(|child| child.kind() == "wildcard_import")
        {
            self.index
                .add_import(&ImportRecord::from_module(module, "*"));
        }
    }

    /// Module path of a `from` import, with relative-import dots dropped.
    fn module_path(&self, node: Node<'_>) -> Option<String> {
        match node.kind() {
            "dotted_name" => Some(compact(self.text(node))),
            "relative_import" => named_children(node)
                .into_iter()
                .find(|child| child.kind() == "dotted_name")
                .map(|child| compact(self.text(child))),
            _ => None,
        }
    }

    /// The imported (not aliased) name.
    fn import_name(&self, node: Node<'_>) -> String {
        let target = if node.kind() == "aliased_import" {
            node.child_by_field_name("name").unwrap_or(node)
        } else {
            node
        };
        compact(self.text(target))
    }

    fn visit_assignment(&mut self, node: Node<'_>) {
        if node.child_by_field_name("type").is_some() {
            return;
        }
        if let Some(left) = node.child_by_field_name("left") {
            if left.kind() == "identifier" {
                self.index.global_variables.push(self.text(left).to_string());
            }
        }
    }

    fn visit_function(&mut self, node: Node<'_>) -> Result<(), DomainError> {
        self.found_definition = true;

        let Some(name) = node.child_by_field_name("name") else {
            return Ok(());
        };
        let qualified = qualified_name(self.file_path, self.text(name));
        let (start_line, end_line) = line_span(node);

        let mut calls = Vec::new();
        let mut string_statements = Vec::new();
        // Decorators hang off the wrapping `decorated_definition` and run first.
        let mut stack = vec![node];
        if let Some(parent) = node.parent().filter(|p| p.kind() == "decorated_definition") {
            let decorators = named_children(parent)
                .into_iter()
                .filter(|child| child.kind() == "decorator");
            stack.extend(decorators.rev());
        }
        while let Some(current) = stack.pop() {
            self.budget.check()?;
            match current.kind() {
                "call" => {
                    if let Some(function) = current.child_by_field_name("function") {
                        if function.kind() == "identifier" {
                            calls.push(self.text(function).to_string());
                        }
                    }
                }
                "expression_statement" => {
                    if let Some(value) = self.string_statement_value(current) {
                        string_statements.push(value);
                    }
                }
                _ => {}
            }
            stack.extend(named_children(current).into_iter().rev());
        }

        for callee in &calls {
            self.index
                .referenced_by
                .entry(callee.clone())
                .or_default()
                .push(self.file_path.to_string());
        }

        let mut entity = Entity::new(
            EntityKind::Function,
            qualified.clone(),
            start_line,
            end_line,
            self.slice_lines(start_line, end_line),
        )
        .with_calls(calls.clone())
        .with_string_statements(string_statements);
        if let Some(docstring) = self.body_docstring(node) {
            entity = entity.with_docstring(docstring);
        }

        self.index.entities.push(entity);
        self.index.call_edges.push(CallEdge::new(qualified, calls));
        Ok(())
    }

    fn visit_class(&mut self, node: Node<'_>) {
        self.found_definition = true;

        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let class_name = self.text(name).to_string();
        let qualified = qualified_name(self.file_path, &class_name);
        let (start_line, end_line) = line_span(node);

        let mut methods = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            for child in named_children(body) {
                if child.kind() != "function_definition" {
                    continue;
                }
                if let Some(method) = child.child_by_field_name("name") {
                    let method_name = format!("{}.{}", class_name, self.text(method));
                    self.index
                        .class_methods
                        .insert(method_name.clone(), qualified.clone());
                    methods.push(method_name);
                }
            }
        }

        let mut entity = Entity::new(
            EntityKind::Class,
            qualified,
            start_line,
            end_line,
            self.slice_lines(start_line, end_line),
        )
        .with_methods(methods);
        if let Some(docstring) = self.body_docstring(node) {
            entity = entity.with_docstring(docstring);
        }

        self.index.entities.push(entity);
    }

    fn body_docstring(&self, definition: Node<'_>) -> Option<String> {
        definition
            .child_by_field_name("body")
            .and_then(|body| self.docstring_of(body))
    }

    /// Docstring of a module or block: its first statement, if that is a
    /// plain string literal.
    fn docstring_of(&self, block: Node<'_>) -> Option<String> {
        let first = named_children(block)
            .into_iter()
            .find(|child| child.kind() != "comment")?;
        self.string_statement_value(first)
            .map(|doc| clean_docstring(&doc))
    }

    /// Value of an expression statement consisting of one string literal.
    fn string_statement_value(&self, statement: Node<'_>) -> Option<String> {
        if statement.kind() != "expression_statement" {
            return None;
        }
        let mut expression = single_expression(statement)?;
        while expression.kind() == "parenthesized_expression" {
            expression = single_expression(expression)?;
        }
        self.string_value(expression)
    }

    fn string_value(&self, node: Node<'_>) -> Option<String> {
        match node.kind() {
            "string" => string_literal_value(self.text(node)),
            "concatenated_string" => named_children(node)
                .into_iter()
                .filter(|part| part.kind() == "string")
                .map(|part| string_literal_value(self.text(part)))
                .collect::<Option<Vec<_>>>()
                .map(|parts| parts.concat()),
            _ => None,
        }
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        self.source.get(node.byte_range()).unwrap_or("")
    }

    /// Original text of lines `start..=end` (1-based), without the final newline.
    fn slice_lines(&self, start_line: u32, end_line: u32) -> String {
        let start = self
            .line_starts
            .get(start_line.saturating_sub(1) as usize)
            .copied()
            .unwrap_or(0);
        let end = self
            .line_starts
            .get(end_line as usize)
            .map(|next| next.saturating_sub(1))
            .unwrap_or(self.source.len());

        self.source
            .get(start..end.max(start))
            .unwrap_or("")
            .to_string()
    }
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// The only non-comment named child, if there is exactly one.
fn single_expression(node: Node<'_>) -> Option<Node<'_>> {
    let mut children = named_children(node)
        .into_iter()
        .filter(|child| child.kind() != "comment");
    let first = children.next()?;
    children.next().is_none().then_some(first)
}

/// 1-based inclusive line span. A node that ends at column 0 ends on the
/// previous line.
fn line_span(node: Node<'_>) -> (u32, u32) {
    let start = node.start_position();
    let end = node.end_position();
    let end_row = if end.column == 0 && end.row > start.row {
        end.row - 1
    } else {
        end.row
    };
    (start.row as u32 + 1, end_row as u32 + 1)
}

fn first_error_line(root: Node<'_>) -> Option<usize> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row + 1);
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node
            .children(&mut cursor)
            .filter(|child| child.has_error() || child.is_missing())
            .collect();
        stack.extend(children.into_iter().rev());
    }
    None
}

/// Syntax tree-sitter accepts for Python 2 compatibility but Python 3 rejects.
fn first_python2_construct(root: Node<'_>) -> Option<(&'static str, usize)> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let construct = match node.kind() {
            "print_statement" => Some("print statement"),
            "exec_statement" => Some("exec statement"),
            "except_clause" => {
                let mut cursor = node.walk();
                let values = node.children_by_field_name("value", &mut cursor).count();
                (values > 1).then_some("comma form of except clause")
            }
            _ => None,
        };
        if let Some(construct) = construct {
            return Some((construct, node.start_position().row + 1));
        }
        stack.extend(named_children(node).into_iter().rev());
    }
    None
}

/// Universal newlines: `\r\n` and lone `\r` both become `\n`.
fn normalize_newlines(content: &str) -> Cow<'_, str> {
    if content.contains('\r') {
        Cow::Owned(content.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(content)
    }
}

fn compact(text: &str) -> String {
    text.split_whitespace().collect()
}
