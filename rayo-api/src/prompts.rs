//! Prompt templates and answer parsing
//!
//! Each builder returns a (system, user) message pair for the OpenAI client.
//! Model answers come back as loose text, so the parsers here are forgiving:
//! numbered lists, bullets, quotes and stray punctuation are all stripped.

use rayo_common::db::models::Project;

/// Candidate keywords for a project, derived from its business profile.
pub fn keyword_suggestions(project: &Project, homepage_excerpt: Option<&str>) -> (String, String) {
    let system = "You are an SEO strategist. Respond with one keyword phrase per line, \
                  no numbering, no commentary."
        .to_string();

    let mut user = format!(
        "Suggest 15 SEO keyword phrases a potential customer would search for.\n\
         Website: {}\n",
        project.url
    );
    if let Some(business_type) = &project.business_type {
        user.push_str(&format!("Business type: {}\n", business_type));
    }
    if !project.services.is_empty() {
        user.push_str(&format!("Services: {}\n", project.services.join(", ")));
    }
    if !project.locations.is_empty() {
        user.push_str(&format!("Locations: {}\n", project.locations.join(", ")));
    }
    if !project.age_groups.is_empty() {
        user.push_str(&format!(
            "Target audience age groups: {}\n",
            project.age_groups.join(", ")
        ));
    }
    if let Some(excerpt) = homepage_excerpt {
        user.push_str(&format!("Homepage content excerpt:\n{}\n", excerpt));
    }

    (system, user)
}

/// Secondary keywords supporting a chosen primary keyword.
pub fn secondary_keywords(project: &Project, primary_keyword: &str) -> (String, String) {
    let system = "You are an SEO strategist. Respond with one keyword phrase per line, \
                  no numbering, no commentary."
        .to_string();

    let user = format!(
        "Primary keyword: \"{}\"\n\
         Website: {}\n\
         Suggest 10 closely related secondary keyword phrases that a blog post \
         targeting the primary keyword should also rank for.",
        primary_keyword, project.url
    );

    (system, user)
}

/// Blog category for the draft, chosen from the project's context.
pub fn category(project: &Project, primary_keyword: &str) -> (String, String) {
    let system = "You are a content editor. Respond with a single short category name, \
                  nothing else."
        .to_string();

    let mut user = format!(
        "Choose the best blog category for a post targeting the keyword \"{}\".\n\
         Website: {}\n",
        primary_keyword, project.url
    );
    if !project.industries.is_empty() {
        user.push_str(&format!("Industries: {}\n", project.industries.join(", ")));
    }

    (system, user)
}

/// Blog title from keyword, category and search intent.
pub fn title(primary_keyword: &str, category: &str, intent: &str) -> (String, String) {
    let system = "You are a content editor. Respond with a single blog post title, \
                  no quotes, nothing else."
        .to_string();

    let user = format!(
        "Write an engaging, SEO-friendly blog title.\n\
         Primary keyword: \"{}\"\n\
         Category: {}\n\
         Search intent: {}\n\
         The title must contain the primary keyword.",
        primary_keyword, category, intent
    );

    (system, user)
}

/// Section outline for the draft.
pub fn outline(
    blog_title: &str,
    primary_keyword: &str,
    secondary_keywords: &[String],
) -> (String, String) {
    let system = "You are a content editor. Respond with one section heading per line, \
                  in reading order, no numbering."
        .to_string();

    let mut user = format!(
        "Write a section outline for the blog post \"{}\".\n\
         Primary keyword: \"{}\"\n",
        blog_title, primary_keyword
    );
    if !secondary_keywords.is_empty() {
        user.push_str(&format!(
            "Secondary keywords to cover: {}\n",
            secondary_keywords.join(", ")
        ));
    }
    user.push_str("Include an introduction and a conclusion section.");

    (system, user)
}

/// Fallback search-intent classification when SEMrush reports none.
pub fn intent_classification(keyword: &str) -> (String, String) {
    let system = "Classify the search intent of a keyword. Respond with exactly one word: \
                  commercial, informational, navigational, or transactional."
        .to_string();

    let user = format!("Keyword: \"{}\"", keyword);

    (system, user)
}

/// Parse a list answer: one item per line or comma-separated, numbering and
/// quoting stripped, deduplicated case-insensitively in order of appearance.
pub fn parse_keyword_list(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut keywords = Vec::new();

    for line in text.lines() {
        for piece in line.split(',') {
            let cleaned = clean_item(piece);
            if cleaned.is_empty() {
                continue;
            }
            if seen.insert(cleaned.to_lowercase()) {
                keywords.push(cleaned);
            }
        }
    }

    keywords
}

/// Parse a single-value answer: first non-empty line, quotes stripped.
pub fn parse_single_value(text: &str) -> String {
    text.lines()
        .map(clean_item)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
}

/// Parse an intent answer down to one of the four labels, or `unknown`.
pub fn parse_intent(text: &str) -> String {
    let lowered = text.to_lowercase();
    for label in ["commercial", "informational", "navigational", "transactional"] {
        if lowered.contains(label) {
            return label.to_string();
        }
    }
    "unknown".to_string()
}

fn clean_item(raw: &str) -> String {
    let mut item = raw.trim();

    // Strip list markers: "1.", "2)", "-", "*"
    item = item.trim_start_matches(['-', '*', '•']).trim_start();
    let digits = item.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &item[digits..];
        if let Some(stripped) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            item = stripped.trim_start();
        }
    }

    item.trim_matches(['"', '\'', '`', '.', ':'])
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keyword_list_strips_numbering() {
        let text = "1. best running shoes\n2) trail runners\n- marathon training\n";
        assert_eq!(
            parse_keyword_list(text),
            vec!["best running shoes", "trail runners", "marathon training"]
        );
    }

    #[test]
    fn test_parse_keyword_list_dedupes_case_insensitively() {
        let text = "Rust tutorials, rust tutorials, Rust Basics";
        assert_eq!(
            parse_keyword_list(text),
            vec!["Rust tutorials", "Rust Basics"]
        );
    }

    #[test]
    fn test_parse_single_value_skips_blank_lines() {
        assert_eq!(
            parse_single_value("\n\n\"Technology & Gadgets\"\nextra"),
            "Technology & Gadgets"
        );
    }

    #[test]
    fn test_parse_intent() {
        assert_eq!(parse_intent("Transactional."), "transactional");
        assert_eq!(parse_intent("The intent is informational"), "informational");
        assert_eq!(parse_intent("no idea"), "unknown");
    }
}
