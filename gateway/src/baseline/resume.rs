//! Keyword-matching resume parser.

use std::sync::OnceLock;

use jobmatch_common::{ParseResumeRequest, ParseResumeResponse};
use regex::Regex;

const SUMMARY_CHARS: usize = 200;

/// Recognized skills, in reporting order.
const SKILL_VOCABULARY: &[&str] = &[
    "python",
    "javascript",
    "java",
    "c++",
    "c#",
    "go",
    "rust",
    "ruby",
    "typescript",
    "sql",
    "nosql",
    "mongodb",
    "postgresql",
    "mysql",
    "react",
    "angular",
    "vue",
    "node.js",
    "django",
    "flask",
    "fastapi",
    "aws",
    "gcp",
    "azure",
    "docker",
    "kubernetes",
    "terraform",
    "machine learning",
    "deep learning",
    "tensorflow",
    "pytorch",
    "keras",
    "pandas",
    "numpy",
    "scikit-learn",
    "spark",
    "hadoop",
    "git",
    "ci/cd",
    "jenkins",
    "github actions",
    "agile",
    "scrum",
    "jira",
    "project management",
    "html",
    "css",
    "sass",
    "tailwind",
    "rest api",
    "graphql",
    "microservices",
    "linux",
    "bash",
    "shell scripting",
];

pub fn parse_resume(request: &ParseResumeRequest) -> ParseResumeResponse {
    let lowered = request.resume_text.to_lowercase();

    let skills = SKILL_VOCABULARY
        .iter()
        .filter(|skill| contains_term(&lowered, skill))
        .map(|skill| skill.to_string())
        .collect();

    ParseResumeResponse {
        skills,
        experience_years: experience_years(&lowered),
        education: serde_json::Map::new(),
        work_history: vec![],
        summary: summarize(&request.resume_text),
        method: Some("keyword_matching".to_string()),
    }
}

/// True if `term` occurs in `text` delimited by non-alphanumeric characters
/// or the ends of the text.
fn contains_term(text: &str, term: &str) -> bool {
    text.match_indices(term).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + term.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn years_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(\d+)\+?\s*years?").ok())
        .as_ref()
}

/// Largest "N years" / "N+ years" figure in the text.
fn experience_years(text: &str) -> Option<u32> {
    years_pattern()?
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .max()
}

fn summarize(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= SUMMARY_CHARS {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(SUMMARY_CHARS).collect();
    format!("{}...", head.trim_end())
}
