//! Cyclomatic complexity over Python functions.
//!
//! Each function starts at 1 and gains 1 per decision point in its own body.
//! Nested functions are scored separately and do not add to their parent.

use serde::Serialize;
use tree_sitter::{Node, TreeCursor};

use crate::python::PythonValidator;

const DECISION_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "for_statement",
    "while_statement",
    "except_clause",
    "with_statement",
    "boolean_operator",
    "conditional_expression",
    "for_in_clause",
    "if_clause",
    "case_clause",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionComplexity {
    pub name: String,
    /// 1-based line of the `def`
    pub line: usize,
    pub complexity: u32,
}

/// Complexity of every function and method in `code`.
///
/// Empty when the source does not parse cleanly.
pub fn function_complexities(code: &str) -> Vec<FunctionComplexity> {
    let Ok(tree) = PythonValidator::parse_tree(code) else {
        return Vec::new();
    };
    let root = tree.root_node();
    if root.has_error() {
        return Vec::new();
    }

    let mut functions = Vec::new();
    collect_functions(root, code, &mut functions);
    functions
}

/// Mean complexity across functions; 0.0 when there are none
pub fn average_complexity(code: &str) -> f64 {
    let functions = function_complexities(code);
    if functions.is_empty() {
        return 0.0;
    }
    let total: u32 = functions.iter().map(|f| f.complexity).sum();
    f64::from(total) / functions.len() as f64
}

fn collect_functions(root: Node<'_>, code: &str, out: &mut Vec<FunctionComplexity>) {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.kind() == "function_definition" {
            let name = node
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(code.as_bytes()).ok())
                .unwrap_or("<anonymous>")
                .to_string();
            out.push(FunctionComplexity {
                name,
                line: node.start_position().row + 1,
                complexity: 1 + count_decisions(node),
            });
        }
        if !advance(&mut cursor, true) {
            return;
        }
    }
}

/// Decision points in `function`'s body, skipping nested definitions
fn count_decisions(function: Node<'_>) -> u32 {
    let mut count = 0;
    let mut cursor = function.walk();
    if !cursor.goto_first_child() {
        return count;
    }
    loop {
        let node = cursor.node();
        let nested = node.kind() == "function_definition";
        if !nested && DECISION_KINDS.contains(&node.kind()) {
            count += 1;
        }
        if !advance(&mut cursor, !nested) {
            return count;
        }
    }
}

/// Step to the next node in document order within the cursor's root.
///
/// `descend` false skips the current node's subtree. Returns false once the
/// walk is back at the root.
fn advance(cursor: &mut TreeCursor<'_>, descend: bool) -> bool {
    if descend && cursor.goto_first_child() {
        return true;
    }
    loop {
        if cursor.goto_next_sibling() {
            return true;
        }
        if !cursor.goto_parent() {
            return false;
        }
    }
}
