//! llms.txt parsing.
//!
//! Documentation dumps in the llms.txt convention are a single large text
//! file where top-level `# ` headings mark sections. Splitting on those
//! headings before chunking keeps section boundaries out of the middle of
//! chunks and gives every chunk a section label for its metadata.

/// One section of an llms.txt file.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Section heading text ("" for content before the first heading)
    pub heading: String,

    /// Section body, trimmed
    pub content: String,
}

/// Split llms.txt content into sections on top-level `# ` headings.
///
/// Sections with empty bodies are dropped.
pub fn parse_llms_txt(content: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current_heading = String::new();
    let mut current_lines: Vec<&str> = Vec::new();

    for line in content.lines() {
        if let Some(heading) = line.strip_prefix("# ") {
            push_section(&mut sections, &current_heading, &current_lines);
            current_heading = heading.trim().to_string();
            current_lines.clear();
        } else {
            current_lines.push(line);
        }
    }

    push_section(&mut sections, &current_heading, &current_lines);

    sections
}

fn push_section(sections: &mut Vec<Section>, heading: &str, lines: &[&str]) {
    let content = lines.join("\n").trim().to_string();
    if !content.is_empty() {
        sections.push(Section {
            heading: heading.to_string(),
            content,
        });
    }
}

/// Derive a source name from an llms.txt file stem.
///
/// "langgraph_llms_full" and "langgraph_llms" both map to "langgraph".
pub fn source_name_from_stem(stem: &str) -> String {
    stem.replace("_llms", "").replace("_full", "")
}
