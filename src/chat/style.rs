//! Question style classification
//!
//! Maps question text to an enumerated style tag that selects the instruction
//! appended to the generation prompt. A pure function so it is trivially unit
//! testable.

/// How the answer should be shaped for a given question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStyle {
    Neutral,
    Detailed,
    List,
    Definition,
    Comparison,
}

const DETAIL_KEYWORDS: &[&str] = &[
    "detail",
    "explain",
    "elaborate",
    "comprehensive",
    "thorough",
    "in-depth",
];

const LIST_KEYWORDS: &[&str] = &[
    "list", "what are", "types of", "kinds of", "ways to", "steps", "methods",
];

const DEFINITION_KEYWORDS: &[&str] = &[
    "what is",
    "what are",
    "define",
    "meaning of",
    "tell me about",
];

const COMPARISON_KEYWORDS: &[&str] = &["compare", "difference", "versus", "vs", "better"];

/// Classify a question into a response style
///
/// Precedence follows specificity: an explicit request for detail wins over
/// the looser list/definition/comparison cues.
pub fn classify_style(question: &str) -> QueryStyle {
    let lower = question.to_lowercase();
    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    if contains_any(DETAIL_KEYWORDS) {
        QueryStyle::Detailed
    } else if contains_any(LIST_KEYWORDS) {
        QueryStyle::List
    } else if contains_any(DEFINITION_KEYWORDS) {
        QueryStyle::Definition
    } else if contains_any(COMPARISON_KEYWORDS) {
        QueryStyle::Comparison
    } else {
        QueryStyle::Neutral
    }
}

impl QueryStyle {
    /// Style instruction appended to the generation prompt
    pub fn instruction(&self) -> &'static str {
        match self {
            QueryStyle::Detailed => {
                "Provide a detailed, comprehensive response with thorough explanations."
            }
            QueryStyle::List => {
                "Structure your response as a clear, organized list with bullet points where appropriate."
            }
            QueryStyle::Definition => {
                "Focus on providing a clear, concise definition and basic explanation first, then add details."
            }
            QueryStyle::Comparison => {
                "Structure your response to clearly compare and contrast the relevant aspects."
            }
            QueryStyle::Neutral => "",
        }
    }
}
