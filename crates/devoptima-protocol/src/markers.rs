//! Literal section delimiters the model is asked to emit, one per line.

pub const DESCRIPTION: &str = "---DESCRIPTION---";
pub const CODE: &str = "---CODE---";
pub const WARNING: &str = "---WARNING---";
pub const SECURITY_SCORE: &str = "---SECURITY_SCORE---";
pub const DEBT_GRADE: &str = "---DEBT_GRADE---";
pub const ANALYSIS: &str = "---ANALYSIS---";
pub const VERDICT: &str = "---VERDICT---";
pub const SIMULATION_DATA: &str = "---SIMULATION_DATA---";
pub const TREE_DATA: &str = "---TREE_DATA---";

pub const ALL: [&str; 9] = [
    DESCRIPTION,
    CODE,
    WARNING,
    SECURITY_SCORE,
    DEBT_GRADE,
    ANALYSIS,
    VERDICT,
    SIMULATION_DATA,
    TREE_DATA,
];
