//! Instruction text for each detail level

use super::DetailLevel;

/// System message sent with every summary request
pub const SYSTEM_PROMPT: &str = "You are an expert at summarizing academic papers in an engaging, \
accessible way while maintaining accuracy.";

const OUTPUT_RULES: &str = "Formatting rules:
- Write the body in markdown.
- Put key terms, methods and results in **bold** or *italics*.
- Do not repeat the paper title.
- Answer with a single JSON object of the form {\"summary_markdown\": \"...\"} and nothing else.";

/// Build the user message for `level` around `source`
///
/// `source` is the abstract for [`DetailLevel::Overview`] and the full paper
/// text (or the abstract when no full text was found) otherwise.
#[must_use]
pub fn build_prompt(level: DetailLevel, source: &str) -> String {
    match level {
        DetailLevel::Overview => format!(
            "You are helping researchers skim new papers quickly.

Summarize this abstract as 3-4 SHORT markdown bullet points in plain, friendly language.

Cover:
- What problem does the research tackle?
- What is the approach or solution?
- Why should someone care?

Keep it conversational, as if explaining to a smart friend. Avoid jargon unless it is essential.

{OUTPUT_RULES}

Abstract:
<<<
{source}
>>>"
        ),
        DetailLevel::TechnicalDigest => format!(
            "You are analyzing a full research paper for a reader who wants to understand the technical approach.

Summarize the KEY CONTRIBUTIONS and METHODOLOGY as 4-6 concise bullet points, grouped under short markdown headers.

Cover:
- Novel contributions or innovations
- Technical approach and methods used
- Key insights or techniques introduced
- How the method works (high-level architecture)

Be specific. Technical terms and equations are welcome where they help.

{OUTPUT_RULES}

Full Paper Text:
<<<
{source}
>>>"
        ),
        DetailLevel::ComprehensiveReview => format!(
            "You are writing a comprehensive review of a full research paper for a reader doing deep research.

Use exactly these markdown sections:

**Main Findings** (3-4 sentences)
- Specific experimental and evaluation results
- Every quantitative metric, performance number and baseline comparison available

**Technical Details** (2-3 sentences)
- Important implementation details
- Datasets and experimental setup
- Notable design choices

**Implications & Impact** (2-3 sentences)
- Significance and how the work advances the field
- Practical applications

**Limitations & Future Work** (1-2 sentences)
- Limitations the authors acknowledge
- Future directions they suggest

Be precise about numbers, percentages and comparisons. Describe the work directly and never refer to it as \"the paper\".

{OUTPUT_RULES}

Full Paper Text:
<<<
{source}
>>>"
        ),
    }
}
