/// Prompt templates for each directive
pub struct Prompts;

const BASE_INSTRUCTION: &str = "You are an expert software engineer. \
Analyze the user's code and provide the requested output.";

const EXACT_FORMAT: &str = "IMPORTANT: You must use the EXACT output format below. Do NOT use JSON.";

impl Prompts {
    pub fn refactor() -> String {
        format!(
            r#"{base}
TASK: Refactor the Python code for PEP-8 compliance, add type hints, and Google-style docstrings.

{exact}

FORMAT:
---DESCRIPTION---
(Write a detailed explanation of changes here)
---CODE---
(Write the full refactored code here)"#,
            base = BASE_INSTRUCTION,
            exact = EXACT_FORMAT,
        )
    }

    pub fn optimize() -> String {
        format!(
            r#"{base}
TASK: Aggressively optimize the Python code complexity (e.g., O(N^2) to O(N)).

{exact}

FORMAT:
---DESCRIPTION---
(Write a detailed explanation of the optimization here)
---CODE---
(Write the full optimized code here)"#,
            base = BASE_INSTRUCTION,
            exact = EXACT_FORMAT,
        )
    }

    pub fn transpile(target_language: &str) -> String {
        format!(
            r#"TARGET LANGUAGE: {target}

{base}
TASK: Transpile the Python code to the TARGET LANGUAGE provided.

{exact}

FORMAT:
---WARNING---
(Optional: Write a warning if a library or construct has no equivalent, otherwise leave empty)
---CODE---
(Write the full transpiled code here)"#,
            target = target_language,
            base = BASE_INSTRUCTION,
            exact = EXACT_FORMAT,
        )
    }

    /// Debug prompt; `error_log` may be empty, in which case the model is
    /// asked for a static analysis instead
    pub fn debug(error_log: &str) -> String {
        let error_log = if error_log.trim().is_empty() {
            "(none provided)"
        } else {
            error_log
        };
        format!(
            r#"{base}
TASK: Debug the Python code.
CONTEXT: An error log may be provided below. If provided, use it to fix the specific crash.
If NO error log is provided, perform a deep static analysis to find logical bugs, runtime errors, or security flaws.

ERROR LOG:
{error_log}

INSTRUCTIONS:
1. If the code has NO bugs and requires NO changes, the Description must start with "NO ISSUES FOUND".
2. If bugs are found, explain the root cause clearly.

{exact}

FORMAT:
---DESCRIPTION---
(Explain the bug and the fix, or write 'NO ISSUES FOUND' if clean)
---CODE---
(Write the fixed code here. If no issues, return the original code)"#,
            base = BASE_INSTRUCTION,
            error_log = error_log,
            exact = EXACT_FORMAT,
        )
    }

    pub fn audit() -> String {
        format!(
            r#"{base}
TASK: Perform a comprehensive Code Quality Audit.
Assess:
1. Security (Hardcoded secrets, injection risks, unsafe functions)
2. Reliability (Error handling, edge cases)
3. Architecture (Coupling, cohesion, design patterns)

{exact}

FORMAT:
---SECURITY_SCORE---
(Integer 0-100)
---DEBT_GRADE---
(Letter Grade A/B/C/D/F)
---ANALYSIS---
(Bulleted list of specific issues found. Be critical.)
---VERDICT---
(A short, executive summary of the code health.)"#,
            base = BASE_INSTRUCTION,
            exact = EXACT_FORMAT,
        )
    }

    pub fn batch_fix(selected_fixes: &[String]) -> String {
        let fixes = selected_fixes
            .iter()
            .map(|fix| format!("- {}", fix))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            r#"{base}
TASK: Apply the following specific improvements to the user's code.

SELECTED IMPROVEMENTS:
{fixes}

INSTRUCTIONS:
- Apply ONLY the selected improvements.
- Do NOT change logical behavior unless asked (e.g., for security).
- Maintain the original code structure where possible.

{exact}

FORMAT:
---DESCRIPTION---
(Briefly explain what was changed)
---CODE---
(The full, updated Python code)"#,
            base = BASE_INSTRUCTION,
            fixes = fixes,
            exact = EXACT_FORMAT,
        )
    }

    /// Mental-execution trace; chaos mode asks for an edge-case input
    pub fn simulator(chaos_mode: bool) -> String {
        let mode = if chaos_mode {
            "\nCHAOS_MODE is requested: choose an EDGE CASE (e.g., empty list, None, negative numbers) that might break the code."
        } else {
            ""
        };
        format!(
            r#"{base}
TASK: Act as a Virtual Python Interpreter. Perform a "Mental Execution" of the user's code.
SCENARIO: Choose a specific, realistic input scenario (e.g., specific function arguments) to trace.{mode}

You must output the execution trace in the following EXACT format.

FORMAT:
---SIMULATION_DATA---
{{
    "scenario": "Description of the input used (e.g., calculate_total(price=100, tax=0.2))",
    "trace": [
        {{"step": 1, "line": "code_snippet_here", "action": "Explanation of what happened", "variables": "x=10, y=5"}},
        {{"step": 2, "line": "if x > 0:", "action": "Condition met, entering block", "variables": "x=10"}}
    ],
    "outcome": "Final return value or Error message",
    "complexity_note": "O(N) - Linear Time"
}}"#,
            base = BASE_INSTRUCTION,
            mode = mode,
        )
    }

    pub fn tree() -> String {
        format!(
            r#"{base}
TASK: Analyze the Python code and extract a Hierarchical Tree structure of the code.
Structure: Module (Root) -> Classes -> Methods/Functions.
For each function/method, include a brief 'desc' (what it does) and 'sig' (signature/arguments).

IMPORTANT: You must use the EXACT output format below. Do NOT use markdown.

FORMAT:
---TREE_DATA---
{{
    "name": "Root Module",
    "children": [
        {{
            "name": "ClassName",
            "desc": "Class description",
            "children": [
                {{"name": "method_name", "desc": "Short description", "sig": "(arg1, arg2)"}}
            ]
        }},
        {{"name": "function_name", "desc": "Function description", "sig": "(x, y) -> int"}}
    ]
}}"#,
            base = BASE_INSTRUCTION,
        )
    }

    pub fn sequence_diagram() -> String {
        format!(
            r#"{base}
TASK: Generate a Mermaid.js SEQUENCE DIAGRAM (sequenceDiagram) to show the execution flow.
Identify key actors (User, System, Database) and messages.
RULES:
- Start with 'sequenceDiagram'.
- Use '->>' for synchronous calls.
- RETURN ONLY the mermaid code block without any markdown wrappers."#,
            base = BASE_INSTRUCTION,
        )
    }

    pub fn flowchart() -> String {
        format!(
            r#"{base}
TASK: Generate a VERY SIMPLE Mermaid.js flowchart (graph TD).
RULES:
- Use ONLY basic nodes: id[Text] or id(Text).
- Use ONLY simple arrows: -->.
- DO NOT use subgraphs or complex styling.
- RETURN ONLY the mermaid code block without any markdown wrappers."#,
            base = BASE_INSTRUCTION,
        )
    }

    /// Build the instruction for a repair attempt after validation failed.
    ///
    /// The rejected code is embedded here, so the repair call carries no
    /// separate source text.
    pub fn build_correction_prompt(previous_code: &str, error_message: &str) -> String {
        format!(
            r#"{base}
TASK: The Python code below was generated for the user but fails to parse. Fix the syntax error while preserving the intended behavior.

## Previous Code
```python
{code}
```

## Validation Error
{error}

{exact}

FORMAT:
---DESCRIPTION---
(Briefly explain the syntax fix)
---CODE---
(Write the full corrected code here)"#,
            base = BASE_INSTRUCTION,
            code = previous_code,
            error = error_message,
            exact = EXACT_FORMAT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers;

    #[test]
    fn test_code_prompts_request_description_and_code() {
        for prompt in [
            Prompts::refactor(),
            Prompts::optimize(),
            Prompts::debug(""),
            Prompts::batch_fix(&["add type hints".to_string()]),
            Prompts::build_correction_prompt("x =", "invalid syntax"),
        ] {
            assert!(prompt.contains(markers::DESCRIPTION));
            assert!(prompt.contains(markers::CODE));
        }
    }

    #[test]
    fn test_audit_prompt_lists_sections_in_order() {
        let prompt = Prompts::audit();
        let positions: Vec<usize> = [
            markers::SECURITY_SCORE,
            markers::DEBT_GRADE,
            markers::ANALYSIS,
            markers::VERDICT,
        ]
        .iter()
        .map(|m| prompt.find(m).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_correction_prompt_embeds_code_and_error() {
        let prompt = Prompts::build_correction_prompt("def f(:", "Syntax Error: invalid syntax on line 1");
        assert!(prompt.contains("def f(:"));
        assert!(prompt.contains("Syntax Error: invalid syntax on line 1"));
    }

    #[test]
    fn test_parameterized_prompts() {
        assert!(Prompts::transpile("Rust").starts_with("TARGET LANGUAGE: Rust"));
        assert!(Prompts::debug("").contains("(none provided)"));
        assert!(Prompts::debug("ZeroDivisionError").contains("ZeroDivisionError"));
        assert!(Prompts::simulator(true).contains("CHAOS_MODE"));
        assert!(!Prompts::simulator(false).contains("CHAOS_MODE"));
        assert!(Prompts::batch_fix(&["a".into(), "b".into()]).contains("- a\n- b"));
    }
}
