//! Ordered format detection over raw model output.
//!
//! Each entry of [`DETECTORS`] pairs a predicate with an extractor. They are
//! evaluated top to bottom and the first match wins, so a response carrying
//! both `---WARNING---` and `---SECURITY_SCORE---` is read as a warning.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::fence::{code_section, extract_fenced_block, strip_fences};
use crate::markers;
use crate::result::{DebtGrade, IssueStatus, ParsedResult, SimulationTrace, TreeNode};

/// Placed in `analysis` when an audit report is missing one of its sections
pub const AUDIT_PARSE_FAILURE: &str =
    "The audit report could not be parsed: one or more sections were missing.";

/// Substrings that suggest unmarked text is Python code
const CODE_TOKENS: [&str; 6] = ["```", "def ", "import ", "class ", "return ", "print("];

/// Response layouts recognized by [`parse`], in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    DescriptionCode,
    Warning,
    Audit,
    Simulation,
    Tree,
    BareCode,
    CodeTokens,
}

struct Detector {
    format: ResponseFormat,
    matches: fn(&str) -> bool,
    extract: fn(&str, &mut ParsedResult),
}

const DETECTORS: &[Detector] = &[
    Detector {
        format: ResponseFormat::DescriptionCode,
        matches: has_description_then_code,
        extract: extract_description_code,
    },
    Detector {
        format: ResponseFormat::Warning,
        matches: has_warning,
        extract: extract_warning,
    },
    Detector {
        format: ResponseFormat::Audit,
        matches: has_audit,
        extract: extract_audit,
    },
    Detector {
        format: ResponseFormat::Simulation,
        matches: has_simulation,
        extract: extract_simulation,
    },
    Detector {
        format: ResponseFormat::Tree,
        matches: has_tree,
        extract: extract_tree,
    },
    Detector {
        format: ResponseFormat::BareCode,
        matches: has_code_marker,
        extract: extract_bare_code,
    },
    Detector {
        format: ResponseFormat::CodeTokens,
        matches: has_code_tokens,
        extract: extract_code_tokens,
    },
];

/// Which layout [`parse`] would use for `raw`, if any
pub fn detect_format(raw: &str) -> Option<ResponseFormat> {
    DETECTORS
        .iter()
        .find(|d| (d.matches)(raw))
        .map(|d| d.format)
}

/// Extract structured fields from raw model output.
///
/// Never fails: unrecognized input yields [`ParsedResult::default`].
pub fn parse(raw: &str) -> ParsedResult {
    let mut result = ParsedResult::default();

    match DETECTORS.iter().find(|d| (d.matches)(raw)) {
        Some(detector) => {
            debug!(format = ?detector.format, len = raw.len(), "Detected response format");
            (detector.extract)(raw, &mut result);
        }
        None => debug!(len = raw.len(), "No recognizable response format"),
    }

    result.status = IssueStatus::from_description(&result.description);
    result
}

/// The code candidate the correction loop validates.
///
/// Falls back to the whole de-fenced response when no code section is found,
/// so a prose-only answer fails validation instead of passing as empty code.
pub fn extract_code(raw: &str) -> String {
    let parsed = parse(raw);
    if parsed.has_code() {
        parsed.code
    } else {
        strip_fences(raw)
    }
}

fn has_description_then_code(raw: &str) -> bool {
    section_after(raw, markers::DESCRIPTION).is_some_and(|rest| rest.contains(markers::CODE))
}

fn has_warning(raw: &str) -> bool {
    raw.contains(markers::WARNING)
}

fn has_audit(raw: &str) -> bool {
    raw.contains(markers::SECURITY_SCORE)
}

fn has_simulation(raw: &str) -> bool {
    raw.contains(markers::SIMULATION_DATA)
}

fn has_tree(raw: &str) -> bool {
    raw.contains(markers::TREE_DATA)
}

fn has_code_marker(raw: &str) -> bool {
    raw.contains(markers::CODE)
}

fn has_code_tokens(raw: &str) -> bool {
    CODE_TOKENS.iter().any(|token| raw.contains(token))
}

fn extract_description_code(raw: &str, result: &mut ParsedResult) {
    let Some(rest) = section_after(raw, markers::DESCRIPTION) else {
        return;
    };
    if let Some((description, code)) = rest.split_once(markers::CODE) {
        result.description = strip_fences(description);
        result.code = code_section(code);
    }
}

fn extract_warning(raw: &str, result: &mut ParsedResult) {
    let Some(rest) = section_after(raw, markers::WARNING) else {
        return;
    };
    match rest.split_once(markers::CODE) {
        Some((warning, code)) => {
            result.warning = strip_fences(warning);
            result.code = code_section(code);
        }
        None => result.warning = strip_fences(rest),
    }
}

struct AuditSections<'a> {
    score: &'a str,
    grade: &'a str,
    analysis: &'a str,
    verdict: &'a str,
}

fn split_audit(raw: &str) -> Option<AuditSections<'_>> {
    let rest = section_after(raw, markers::SECURITY_SCORE)?;
    let (score, rest) = rest.split_once(markers::DEBT_GRADE)?;
    let (grade, rest) = rest.split_once(markers::ANALYSIS)?;
    let (analysis, verdict) = rest.split_once(markers::VERDICT)?;
    Some(AuditSections {
        score,
        grade,
        analysis,
        verdict,
    })
}

fn extract_audit(raw: &str, result: &mut ParsedResult) {
    match split_audit(raw) {
        Some(sections) => {
            result.security_score = parse_score(sections.score);
            result.debt_grade = DebtGrade::from_text(sections.grade);
            result.analysis = strip_fences(sections.analysis);
            result.verdict = strip_fences(sections.verdict);
        }
        None => {
            warn!("Audit response is missing a section delimiter");
            result.analysis = AUDIT_PARSE_FAILURE.to_string();
        }
    }
}

/// First integer in the text, clamped to 0-100
fn parse_score(text: &str) -> u8 {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return 0;
    }
    // Only overflow can fail here, and an overflowing score is above 100
    digits.parse::<u64>().map_or(100, |n| n.min(100) as u8)
}

fn extract_simulation(raw: &str, result: &mut ParsedResult) {
    if let Some(rest) = section_after(raw, markers::SIMULATION_DATA) {
        result.simulation = decode_document::<SimulationTrace>(rest, "simulation");
    }
}

fn extract_tree(raw: &str, result: &mut ParsedResult) {
    if let Some(rest) = section_after(raw, markers::TREE_DATA) {
        result.tree_data = decode_document::<TreeNode>(rest, "tree").map(|mut root| {
            root.enrich_labels();
            root
        });
    }
}

fn extract_bare_code(raw: &str, result: &mut ParsedResult) {
    if let Some(rest) = section_after(raw, markers::CODE) {
        result.code = code_section(rest);
    }
}

fn extract_code_tokens(raw: &str, result: &mut ParsedResult) {
    result.code = extract_fenced_block(raw).unwrap_or_else(|| strip_fences(raw));
}

/// Text following the first occurrence of `marker`
fn section_after<'a>(raw: &'a str, marker: &str) -> Option<&'a str> {
    raw.find(marker).map(|pos| &raw[pos + marker.len()..])
}

/// Decode the JSON object embedded in a section, or nothing at all.
///
/// Surrounding prose and fences are ignored; anything that does not decode
/// completely yields `None` rather than a partially filled value.
fn decode_document<T: DeserializeOwned>(section: &str, what: &str) -> Option<T> {
    let text = strip_fences(section);
    let json = extract_json_object(&text)?;
    match serde_json::from_str(json) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, kind = what, "Failed to decode embedded document");
            None
        }
    }
}

fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}
