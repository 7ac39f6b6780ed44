use tree_sitter::{Node, Parser, Tree};
use tracing::debug;

use crate::{ValidationOutcome, Validator};

const SNIPPET_LEN: usize = 30;

/// Python syntax validator backed by tree-sitter
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonValidator;

impl PythonValidator {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn parse_tree(code: &str) -> Result<Tree, String> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| format!("Failed to set language: {}", e))?;
        parser
            .parse(code, None)
            .ok_or_else(|| "parser returned no tree".to_string())
    }
}

impl Validator for PythonValidator {
    fn language(&self) -> &str {
        "python"
    }

    fn validate(&self, code: &str) -> ValidationOutcome {
        let tree = match Self::parse_tree(code) {
            Ok(tree) => tree,
            Err(e) => {
                return ValidationOutcome::invalid(
                    format!("An unexpected validation error occurred: {}", e),
                    None,
                )
            }
        };

        let root = tree.root_node();
        if !root.has_error() {
            return match first_python2_construct(root) {
                Some((node, message)) => {
                    let line = node.start_position().row + 1;
                    debug!(line, message, "Candidate uses Python 2 syntax");
                    ValidationOutcome::invalid(message, Some(line))
                }
                None => ValidationOutcome::Valid,
            };
        }

        match first_syntax_error(root) {
            Some(node) => {
                let line = node.start_position().row + 1;
                let message = describe(node, code);
                debug!(line, message = %message, "Candidate failed validation");
                ValidationOutcome::invalid(message, Some(line))
            }
            None => ValidationOutcome::invalid("invalid syntax", None),
        }
    }
}

/// First ERROR or MISSING node in document order
fn first_syntax_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

/// First node the grammar accepts but Python 3 rejects.
///
/// The grammar still carries Python 2 `print` and `exec` statements, and it
/// lets a comprehension iterate over a bare tuple, which is how an
/// unparenthesized generator argument such as `f(x for x in y, 1)` parses.
fn first_python2_construct(root: Node<'_>) -> Option<(Node<'_>, &'static str)> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        let found = match node.kind() {
            "print_statement" => Some("Missing parentheses in call to 'print'"),
            "exec_statement" => Some("Missing parentheses in call to 'exec'"),
            "for_in_clause" if has_comma(node) => {
                Some("Generator expression must be parenthesized")
            }
            _ => None,
        };
        if let Some(message) = found {
            return Some((node, message));
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

fn has_comma(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| child.kind() == ",");
    found
}

fn describe(node: Node<'_>, code: &str) -> String {
    if node.is_missing() {
        return format!("expected '{}'", node.kind());
    }

    let snippet: String = node
        .utf8_text(code.as_bytes())
        .unwrap_or_default()
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .chars()
        .take(SNIPPET_LEN)
        .collect();

    if snippet.is_empty() {
        "invalid syntax".to_string()
    } else {
        format!("invalid syntax near '{}'", snippet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(code: &str) -> ValidationOutcome {
        PythonValidator::new().validate(code)
    }

    #[test]
    fn test_valid_function() {
        assert_eq!(validate("def f():\n    return 1"), ValidationOutcome::Valid);
        assert_eq!(PythonValidator::new().language(), "python");
    }

    #[test]
    fn test_malformed_signature() {
        match validate("def f(:") {
            ValidationOutcome::Invalid { message, line } => {
                assert!(!message.is_empty());
                assert_eq!(line, Some(1));
            }
            ValidationOutcome::Valid => panic!("expected invalid"),
        }
    }

    #[test]
    fn test_error_line_is_reported() {
        let code = "import os\n\ndef ok():\n    return os.getcwd()\n\ndef broken(:\n    pass\n";
        let outcome = validate(code);
        assert!(!outcome.is_valid());
        assert_eq!(outcome.line(), Some(6));
    }

    #[test]
    fn test_empty_source_is_valid() {
        assert!(validate("").is_valid());
    }

    #[test]
    fn test_class_with_methods() {
        let code = "class A:\n    def __init__(self, data):\n        self.data = data\n\n    def run(self):\n        return [x * 2 for x in self.data]\n";
        assert!(validate(code).is_valid());
    }

    #[test]
    fn test_unclosed_bracket() {
        let outcome = validate("values = [1, 2, 3\nprint(values)\n");
        assert!(!outcome.is_valid());
        assert!(outcome.diagnostic().unwrap().starts_with("Syntax Error:"));
    }

    #[test]
    fn test_python2_print_is_rejected() {
        let outcome = validate("x = 1\nprint \"hello\"\n");
        assert_eq!(
            outcome,
            ValidationOutcome::invalid("Missing parentheses in call to 'print'", Some(2))
        );
        assert!(!validate("print >> f, 'x'\n").is_valid());
        assert!(validate("print(\"hello\")\nprint(1, 2, sep='')\n").is_valid());
    }

    #[test]
    fn test_python2_exec_is_rejected() {
        let outcome = validate("exec \"x = 1\"\n");
        assert!(!outcome.is_valid());
        assert_eq!(outcome.line(), Some(1));
        assert!(validate("exec(\"x = 1\")\n").is_valid());
    }

    #[test]
    fn test_unparenthesized_generator_argument() {
        let outcome = validate("def f(*a):\n    return a\n\nf(x for x in y, 1)\n");
        assert!(outcome
            .diagnostic()
            .unwrap()
            .contains("Generator expression must be parenthesized"));
        assert_eq!(outcome.line(), Some(4));
        assert!(!validate("values = [x for x in 1, 2]\n").is_valid());

        assert!(validate("f(x for x in y)\n").is_valid());
        assert!(validate("f((x for x in y), 1)\n").is_valid());
        assert!(validate("for x in 1, 2:\n    pass\n").is_valid());
    }

    #[test]
    fn test_code_is_never_executed() {
        let outcome = validate("import os\nos.remove('/definitely/not/here')\n");
        assert!(outcome.is_valid());
    }
}
