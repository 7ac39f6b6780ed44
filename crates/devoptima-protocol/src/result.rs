use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Structured fields extracted from one model response.
///
/// Every field is always present; absent sections keep their empty, zero or
/// `None` defaults so consumers never have to probe for missing keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedResult {
    pub description: String,
    pub code: String,
    pub warning: String,
    /// 0-100, clamped
    pub security_score: u8,
    pub debt_grade: Option<DebtGrade>,
    pub analysis: String,
    pub verdict: String,
    pub simulation: Option<SimulationTrace>,
    pub tree_data: Option<TreeNode>,
    pub status: IssueStatus,
}

impl ParsedResult {
    /// True when no section was recognized
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn has_code(&self) -> bool {
        !self.code.is_empty()
    }
}

/// Whether the model reported the code as clean
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    NoIssuesFound,
    #[default]
    IssuesFound,
}

impl IssueStatus {
    const CLEAN_PREFIX: &'static str = "NO ISSUES FOUND";

    /// The model signals a clean bill of health by opening its description
    /// with "NO ISSUES FOUND"
    pub fn from_description(description: &str) -> Self {
        let head: String = description
            .trim_start()
            .chars()
            .take(Self::CLEAN_PREFIX.len())
            .collect();
        if head.eq_ignore_ascii_case(Self::CLEAN_PREFIX) {
            IssueStatus::NoIssuesFound
        } else {
            IssueStatus::IssuesFound
        }
    }
}

/// Technical debt letter grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebtGrade {
    A,
    B,
    C,
    D,
    F,
}

impl DebtGrade {
    /// Read the first letter of a free-form grade ("B", "Grade: b+", "**C**")
    pub fn from_text(text: &str) -> Option<Self> {
        let text = text.trim();
        let text = text
            .strip_prefix("Grade:")
            .or_else(|| text.strip_prefix("grade:"))
            .unwrap_or(text);
        match text.chars().find(|c| c.is_ascii_alphabetic())?.to_ascii_uppercase() {
            'A' => Some(DebtGrade::A),
            'B' => Some(DebtGrade::B),
            'C' => Some(DebtGrade::C),
            'D' => Some(DebtGrade::D),
            'F' => Some(DebtGrade::F),
            _ => None,
        }
    }
}

impl std::fmt::Display for DebtGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            DebtGrade::A => "A",
            DebtGrade::B => "B",
            DebtGrade::C => "C",
            DebtGrade::D => "D",
            DebtGrade::F => "F",
        };
        write!(f, "{}", letter)
    }
}

/// A mental execution trace of the submitted code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationTrace {
    #[serde(deserialize_with = "lenient_text")]
    pub scenario: String,
    #[serde(default, alias = "complexity_note", deserialize_with = "lenient_text")]
    pub complexity_note: String,
    #[serde(deserialize_with = "lenient_text")]
    pub outcome: String,
    #[serde(alias = "trace")]
    pub steps: Vec<TraceStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    #[serde(default, deserialize_with = "lenient_number")]
    pub step: u32,
    #[serde(default, deserialize_with = "lenient_text")]
    pub line: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub action: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub variables: String,
}

/// One node of the code structure hierarchy (module, class, function).
///
/// Nodes own their children, so a decoded tree is always finite and acyclic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, alias = "desc", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "sig", skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            signature: None,
            children: Vec::new(),
        }
    }

    /// Append each node's signature to its display name, for every descendant
    pub fn enrich_labels(&mut self) {
        if let Some(sig) = self.signature.as_deref().map(str::trim) {
            if !sig.is_empty() {
                self.name = format!("{} {}", self.name, sig);
            }
        }
        for child in &mut self.children {
            child.enrich_labels();
        }
    }

    /// Number of nodes in this subtree, including self
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }

    /// Longest root-to-leaf edge count (a lone root has depth 0)
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Models sometimes emit numbers or objects where prose is expected
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()).unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_result_serializes_every_key() {
        let value = serde_json::to_value(ParsedResult::default()).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "description",
            "code",
            "warning",
            "securityScore",
            "debtGrade",
            "analysis",
            "verdict",
            "simulation",
            "treeData",
            "status",
        ] {
            assert!(obj.contains_key(key), "missing key {}", key);
        }
    }

    #[test]
    fn test_issue_status_from_description() {
        assert_eq!(
            IssueStatus::from_description("  no issues found. The code is clean."),
            IssueStatus::NoIssuesFound
        );
        assert_eq!(
            IssueStatus::from_description("Found an off-by-one error"),
            IssueStatus::IssuesFound
        );
        assert_eq!(IssueStatus::from_description(""), IssueStatus::IssuesFound);
    }

    #[test]
    fn test_debt_grade_from_text() {
        assert_eq!(DebtGrade::from_text(" B "), Some(DebtGrade::B));
        assert_eq!(DebtGrade::from_text("Grade: c+"), Some(DebtGrade::C));
        assert_eq!(DebtGrade::from_text("**F**"), Some(DebtGrade::F));
        assert_eq!(DebtGrade::from_text("E"), None);
        assert_eq!(DebtGrade::from_text(""), None);
    }

    #[test]
    fn test_enrich_single_root() {
        let mut root = TreeNode {
            signature: Some("(x)".into()),
            ..TreeNode::leaf("main")
        };
        root.enrich_labels();
        assert_eq!(root.name, "main (x)");
        assert_eq!(root.depth(), 0);
    }

    #[test]
    fn test_enrich_reaches_every_descendant() {
        let mut node = TreeNode {
            signature: Some("(n)".into()),
            ..TreeNode::leaf("level5")
        };
        for level in (0..5).rev() {
            node = TreeNode {
                signature: Some(format!("(l{})", level)),
                children: vec![node],
                ..TreeNode::leaf(format!("level{}", level))
            };
        }
        node.enrich_labels();

        let mut current = &node;
        let mut seen = 0;
        loop {
            assert!(current.name.ends_with(')'), "not enriched: {}", current.name);
            seen += 1;
            match current.children.first() {
                Some(child) => current = child,
                None => break,
            }
        }
        assert_eq!(seen, 6);
        assert_eq!(node.depth(), 5);
    }

    #[test]
    fn test_trace_step_tolerates_loose_types() {
        let step: TraceStep =
            serde_json::from_str(r#"{"step": "3", "line": "x += 1", "variables": {"x": 2}}"#)
                .unwrap();
        assert_eq!(step.step, 3);
        assert_eq!(step.action, "");
        assert_eq!(step.variables, r#"{"x":2}"#);
    }
}
