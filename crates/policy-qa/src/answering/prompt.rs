//! Prompt construction for generative answering

use once_cell::sync::Lazy;
use regex::Regex;

use crate::providers::IndexMatch;
use crate::types::OverviewMode;

use super::sections::SECTION_CHARS;

/// System instruction sent with every generation request
pub const SYSTEM_INSTRUCTION: &str = "You are an AI assistant designed to analyze legal and policy documents with high accuracy and provide clear, well-reasoned answers.";

/// Terms looked up in the document whenever the question mentions them
const INSURANCE_TERMS: &[&str] = &[
    "grace period",
    "premium",
    "payment",
    "waiting period",
    "pre-existing",
    "diseases",
    "maternity",
    "expenses",
    "cataract",
    "surgery",
    "organ donor",
    "medical expenses",
    "no claim discount",
    "ncd",
    "preventive",
    "health check",
    "hospital",
    "ayush",
    "room rent",
    "icu",
    "charges",
    "sub-limits",
    "plan a",
    "thirty days",
    "thirty-six",
    "36 months",
    "continuous coverage",
];

/// Chars of context kept either side of a keyword hit
const KEYWORD_RADIUS: usize = 300;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").expect("Invalid regex"));

const DIRECT_INSTRUCTIONS: &str = "Instructions:
1. Search through ALL the provided content carefully
2. Look for any information related to the question, even if it's mentioned briefly
3. Check for synonyms and related terms
4. If you find ANY relevant information, provide it with specific details
5. If the information is not explicitly mentioned, state \"Information not found in the document\"
6. Be thorough and comprehensive in your search
7. Provide exact quotes from the document when possible";

const RETRIEVAL_INSTRUCTIONS: &str = "Instructions:
1. Answer the question based ONLY on the provided excerpts
2. If the information is not in the excerpts, state \"Information not found in the provided document excerpts\"
3. Be specific and accurate
4. Include page numbers when referencing information
5. If multiple excerpts contain relevant information, synthesize them";

const STRUCTURED_FORMAT: &str = "INSTRUCTIONS:
1. Do NOT use any external knowledge beyond what is provided in the context above
2. If the answer cannot be found in the provided context, answer \"Information not found in the document\"
3. Base your answer ONLY on the document content provided
4. Identify specific clauses that support your answer
5. Assess your confidence level in the answer (high/medium/low)

RESPONSE FORMAT:
Provide your response as a single JSON object with the following structure:
{
    \"answer\": \"Your clear and concise answer to the user's question\",
    \"confidence\": \"high/medium/low\"
}

IMPORTANT: Respond ONLY with the JSON object. Do not include any other text, markdown formatting, or explanations outside the JSON structure.";

const KEYWORD_PASS_INSTRUCTIONS: &str = "Instructions:
1. Analyze the keyword matches carefully
2. Extract any relevant information from the context
3. Provide a comprehensive answer based on the found information
4. If the keyword matches don't contain the answer, state \"Information not found in the document\"";

/// Reply a section pass gives when the section is silent on the question
pub const NO_SECTION_INFORMATION: &str = "No relevant information in this section";

const SYNTHESIS_INSTRUCTIONS: &str = "Instructions:
1. Synthesize all the information from the analysis
2. Provide the most accurate and complete answer possible
3. If any information was found, include it
4. If no information was found, clearly state \"Information not found in the document\"
5. Be specific and detailed";

const COMPREHENSIVE_OVERVIEW: &str = "Please provide a comprehensive analysis of the following document. Structure your response as follows:

## Document Overview
- Document type and purpose
- Key themes and topics covered
- Overall structure and organization

## Key Findings
- Main points and important information
- Critical details and data points
- Significant insights

## Important Sections
- Breakdown of major sections
- Key content in each section
- Notable clauses or provisions

## Recommendations
- Action items or next steps
- Important considerations
- Areas requiring attention

## Summary
- Brief executive summary
- Most critical points";

const SUMMARY_OVERVIEW: &str = "Please provide a concise summary of the following document:

## Executive Summary
- Main purpose and scope
- Key points and findings
- Critical information

## Key Takeaways
- Most important points
- Essential details
- Action items";

const KEY_POINTS_OVERVIEW: &str = "Please extract the key points from the following document:

## Key Points
- List the most important points
- Highlight critical information
- Note any deadlines or requirements

## Important Details
- Specific data, numbers, or dates
- Names, organizations, or entities
- Terms, conditions, or provisions

## Action Items
- What needs to be done
- Who is responsible
- When actions are due";

/// Intermediate replies gathered before the synthesis call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassFindings {
    pub direct: String,
    pub keywords: String,
    /// Replies of sections that had something to say, labelled by section number
    pub sections: Vec<String>,
}

/// Keyword hit with surrounding text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordContext {
    pub keyword: String,
    pub context: String,
}

/// Keywords for a question: insurance terms it mentions, then its words
/// longer than three characters. Order is stable and duplicates are dropped.
pub fn extract_keywords(question: &str) -> Vec<String> {
    let lower = question.to_lowercase();
    let mut keywords: Vec<String> = Vec::new();

    let mut push = |term: &str| {
        if !keywords.iter().any(|k| k == term) {
            keywords.push(term.to_string());
        }
    };

    for term in INSURANCE_TERMS {
        if lower.contains(term) {
            push(term);
        }
    }
    for word in WORD.find_iter(&lower) {
        if word.as_str().chars().count() > 3 {
            push(word.as_str());
        }
    }

    keywords
}

/// Text around the first occurrence of each keyword
pub fn keyword_windows(text: &str, keywords: &[String]) -> Vec<KeywordContext> {
    let lower = text.to_lowercase();
    // Offsets from `lower` only index `text` when lowercasing kept byte lengths
    let source = if lower.len() == text.len() { text } else { lower.as_str() };

    keywords
        .iter()
        .filter_map(|keyword| {
            let pos = lower.find(keyword.as_str())?;
            let start = char_floor(source, pos.saturating_sub(KEYWORD_RADIUS));
            let end = char_ceil(source, pos + keyword.len() + KEYWORD_RADIUS);
            Some(KeywordContext {
                keyword: keyword.clone(),
                context: source[start..end].to_string(),
            })
        })
        .collect()
}

fn char_floor(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn char_ceil(s: &str, mut idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// First `max_chars` characters of `text`
pub fn leading_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Builds the fixed prompt templates
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_context_chars: usize,
    structured: bool,
}

impl PromptBuilder {
    pub fn new(max_context_chars: usize, structured: bool) -> Self {
        Self {
            max_context_chars,
            structured,
        }
    }

    pub fn is_structured(&self) -> bool {
        self.structured
    }

    /// Leading document text plus keyword windows
    pub fn direct_context(&self, question: &str, text: &str) -> String {
        let windows = keyword_windows(text, &extract_keywords(question));
        let leading = leading_chars(text, self.max_context_chars);

        let mut prompt = String::new();
        prompt.push_str("You are an expert insurance policy analyst. Analyze the following information to answer the question accurately.\n\n");
        prompt.push_str(&format!("Question: {}\n\n", question));
        prompt.push_str(&format!(
            "Document Content (First {} characters):\n{}\n\n",
            self.max_context_chars, leading
        ));

        if !windows.is_empty() {
            prompt.push_str("Keyword Matches Found:\n");
            let joined = windows
                .iter()
                .map(|w| format!("Keyword '{}': {}", w.keyword, w.context))
                .collect::<Vec<_>>()
                .join("\n\n");
            prompt.push_str(&joined);
            prompt.push_str("\n\n");
        }

        self.finish(prompt, DIRECT_INSTRUCTIONS)
    }

    /// Retrieved excerpts labelled with page, chunk and relevance
    pub fn retrieval(&self, question: &str, matches: &[IndexMatch]) -> String {
        let excerpts = matches
            .iter()
            .map(|m| {
                format!(
                    "Page {}, Chunk {} (Relevance: {:.3}):\n{}",
                    m.page, m.ordinal, m.score, m.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut prompt = String::new();
        prompt.push_str("You are an expert insurance policy analyst. Answer the following question based ONLY on the provided document excerpts.\n\n");
        prompt.push_str(&format!("Question: {}\n\n", question));
        prompt.push_str(&format!("Relevant Document Excerpts:\n{}\n\n", excerpts));

        self.finish(prompt, RETRIEVAL_INSTRUCTIONS)
    }

    /// First comprehensive pass: the leading text alone
    pub fn direct_pass(&self, question: &str, text: &str) -> String {
        format!(
            "You are an expert insurance policy analyst. Analyze this document thoroughly to answer the question.\n\n\
             Question: {}\n\n\
             Document Content:\n{}\n\n\
             {}\n\nAnswer:",
            question,
            leading_chars(text, self.max_context_chars),
            DIRECT_INSTRUCTIONS
        )
    }

    /// Second comprehensive pass over keyword windows; `None` when no keyword occurs
    pub fn keyword_pass(&self, question: &str, text: &str) -> Option<String> {
        let windows = keyword_windows(text, &extract_keywords(question));
        if windows.is_empty() {
            return None;
        }

        let matches = windows
            .iter()
            .map(|w| format!("Keyword '{}': {}", w.keyword, w.context))
            .collect::<Vec<_>>()
            .join("\n\n");
        Some(format!(
            "Based on the following keyword matches found in the document, answer this question:\n\n\
             Question: {}\n\n\
             Keyword Matches Found:\n{}\n\n\
             {}\n\nAnswer:",
            question, matches, KEYWORD_PASS_INSTRUCTIONS
        ))
    }

    /// Per-section pass; `number` is 1-based
    pub fn section_pass(&self, question: &str, number: usize, section: &str) -> String {
        format!(
            "Analyze this section of the insurance policy document for information related to this question:\n\n\
             Question: {}\n\n\
             Section {}:\n{}\n\n\
             Instructions:\n\
             1. Look for any information related to the question\n\
             2. If found, provide the specific details\n\
             3. If not found, respond with \"{}\"\n\nAnswer:",
            question,
            number,
            leading_chars(section, SECTION_CHARS),
            NO_SECTION_INFORMATION
        )
    }

    /// Final call combining the pass replies into one answer
    pub fn synthesis(&self, question: &str, findings: &PassFindings) -> String {
        let sections = if findings.sections.is_empty() {
            "No relevant information found in sections".to_string()
        } else {
            findings.sections.join("\n")
        };

        let mut prompt = String::new();
        prompt.push_str("Based on the comprehensive analysis below, provide a clear, accurate answer to this question:\n\n");
        prompt.push_str(&format!("Question: {}\n\n", question));
        prompt.push_str("Analysis Results:\n");
        prompt.push_str(&format!("Direct Analysis:\n{}\n\n", findings.direct.trim()));
        prompt.push_str(&format!("Keyword Analysis:\n{}\n\n", findings.keywords.trim()));
        prompt.push_str(&format!("Section Analysis:\n{}\n\n", sections));

        self.finish(prompt, SYNTHESIS_INSTRUCTIONS)
    }

    /// Question-less analysis of the leading document text
    pub fn overview(&self, mode: OverviewMode, text: &str) -> String {
        let (template, closing) = match mode {
            OverviewMode::Comprehensive => (
                COMPREHENSIVE_OVERVIEW,
                "Please provide a detailed, well-structured analysis that captures all important aspects of this document.",
            ),
            OverviewMode::Summary => (
                SUMMARY_OVERVIEW,
                "Please provide a clear, concise summary that captures the essence of this document.",
            ),
            OverviewMode::KeyPoints => (
                KEY_POINTS_OVERVIEW,
                "Please provide a focused list of key points and important details.",
            ),
        };

        format!(
            "{}\n\nDocument Content:\n{}\n\n{}",
            template,
            leading_chars(text, mode.context_chars()),
            closing
        )
    }

    fn finish(&self, mut prompt: String, instructions: &str) -> String {
        if self.structured {
            prompt.push_str(STRUCTURED_FORMAT);
        } else {
            prompt.push_str(instructions);
            prompt.push_str("\n\nAnswer:");
        }
        prompt
    }
}
