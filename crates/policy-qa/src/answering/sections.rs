//! Splitting policy text into headed sections

/// Upper-cased markers that open a new section when a line contains one
const SECTION_MARKERS: &[&str] = &[
    "SECTION",
    "CHAPTER",
    "CLAUSE",
    "ARTICLE",
    "DEFINITION",
    "COVERAGE",
    "EXCLUSIONS",
    "CONDITIONS",
];

/// Sections examined by the per-section pass
pub const MAX_SECTIONS: usize = 5;

/// Characters of each section sent to the model
pub const SECTION_CHARS: usize = 3000;

fn is_heading(line: &str) -> bool {
    let upper = line.to_uppercase();
    SECTION_MARKERS.iter().any(|m| upper.contains(m))
}

/// Split text at every line naming a section marker.
///
/// The heading line starts its section; text before the first heading is a
/// section of its own. Blank sections are dropped, and text without any
/// heading comes back as one section.
pub fn split_into_sections(text: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if is_heading(line) && !current.is_empty() {
            sections.push(current.join("\n"));
            current.clear();
        }
        current.push(line);
    }
    if !current.is_empty() {
        sections.push(current.join("\n"));
    }

    sections.retain(|s| !s.trim().is_empty());
    if sections.is_empty() && !text.trim().is_empty() {
        sections.push(text.to_string());
    }
    sections
}
