//! Prompt construction for the generator collaborator.
//!
//! Request kinds form a closed set; each carries its own parameters and
//! is matched exhaustively when the prompt text is built.

use std::fmt;
use std::str::FromStr;

/// How a summary should read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStyle {
    /// Concise, roughly 1/8th the content length.
    Short,
    /// Detailed, roughly 1/4th the content length.
    Long,
    /// Rewritten in new words.
    Abstractive,
    /// Key sentences lifted from the content.
    Extractive,
}

impl FromStr for SummaryStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "long" => Ok(Self::Long),
            "abstractive" => Ok(Self::Abstractive),
            "extractive" => Ok(Self::Extractive),
            other => Err(format!(
                "unknown summary style: '{}' (expected short, long, abstractive, or extractive)",
                other
            )),
        }
    }
}

/// Target audience register for summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    Simple,
    Technical,
}

impl FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "technical" => Ok(Self::Technical),
            other => Err(format!(
                "unknown complexity: '{}' (expected simple or technical)",
                other
            )),
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Complexity::Simple => write!(f, "simple"),
            Complexity::Technical => write!(f, "technical"),
        }
    }
}

/// A fully-specified summary request.
#[derive(Debug, Clone)]
pub struct SummarySpec {
    pub style: SummaryStyle,
    /// Target length directive, e.g. `"5 lines"` or `"medium"`.
    pub length: Option<String>,
    pub complexity: Complexity,
}

/// Answer-from-context prompt. The context is the space-joined text of
/// the top-ranked chunks, in ranked order.
pub fn answer_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the question based only on the following context:\n\n\
         {context}\n\n\
         ---\n\n\
         Answer the question based on the above context: {question}"
    )
}

/// Summary prompt for the given spec. The context is the whole document's
/// chunk text in ordinal order.
pub fn summary_prompt(spec: &SummarySpec, context: &str) -> String {
    let length = spec.length.as_deref().unwrap_or("medium");
    match spec.style {
        SummaryStyle::Short => format!(
            "Provide a short summary of the following context:\n\
             Complexity: {}\n\
             Context:\n{}\n\
             Ensure the summary is concise, well-structured, and approximately 1/8th the length of the content.",
            spec.complexity, context
        ),
        SummaryStyle::Long => format!(
            "Provide a long summary of the following context:\n\
             Complexity: {}\n\
             Context:\n{}\n\
             Ensure the summary captures all key details and is roughly 1/4th the length of the content.",
            spec.complexity, context
        ),
        SummaryStyle::Abstractive => format!(
            "Generate an abstractive summary of the following context:\n\
             Length: {} (if numeric, match exactly that many lines)\n\
             Complexity: {}\n\
             Context:\n{}",
            length, spec.complexity, context
        ),
        SummaryStyle::Extractive => format!(
            "Generate an extractive summary of the following context:\n\
             Length: {} (if numeric, match exactly that many lines)\n\
             Complexity: {}\n\
             Context:\n{}",
            length, spec.complexity, context
        ),
    }
}
