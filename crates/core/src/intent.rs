use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Intent;

static CAREER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)become (?:a |an )?(\w+)").expect("career pattern is valid"));

static SKILL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:learn|improve) (?:my )?(\w+)").expect("skill pattern is valid")
});

const PLACE_TYPES: &[(&str, &[&str])] = &[
    ("gym", &["gym", "fitness"]),
    ("library", &["library", "libraries"]),
    ("cafe", &["cafe", "café", "coffee"]),
    ("hospital", &["hospital", "clinic"]),
    ("pharmacy", &["pharmacy", "chemist", "medical store"]),
    ("park", &["park"]),
    ("restaurant", &["restaurant", "food"]),
    ("bookstore", &["bookstore", "book shop", "bookshop"]),
    ("atm", &["atm", "cash"]),
];

pub fn normalize_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// First matching rule wins, so the order below is part of the contract:
/// "learn to become a pilot" is a career question, not a skill one.
pub fn classify_intent(text: &str) -> Intent {
    let lower = text.to_lowercase();

    if contains_any(&lower, &["nearby", "near me"]) {
        return Intent::Places;
    }

    if contains_any(&lower, &["become", "career"]) {
        return Intent::Career;
    }

    if contains_any(&lower, &["skill", "learn"]) {
        return Intent::Skill;
    }

    if contains_any(&lower, &["jee", "gate", "cat", "exam"]) {
        return Intent::Exam;
    }

    Intent::General
}

pub fn extract_career(text: &str) -> Option<String> {
    capture_word(&CAREER_PATTERN, text)
}

pub fn extract_skill(text: &str) -> Option<String> {
    capture_word(&SKILL_PATTERN, text)
}

/// The parameter a parametrized search needs for `intent`, if any.
pub fn extract_parameter(intent: Intent, text: &str) -> Option<String> {
    match intent {
        Intent::Career => extract_career(text),
        Intent::Skill => extract_skill(text),
        Intent::Places => detect_place_type(text).map(ToString::to_string),
        Intent::Exam | Intent::General => None,
    }
}

pub fn detect_place_type(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    PLACE_TYPES
        .iter()
        .find(|(_, keywords)| contains_any(&lower, keywords))
        .map(|(place_type, _)| *place_type)
}

pub fn career_query(career: &str) -> String {
    format!("how to become a {} career guide", career)
}

pub fn skill_query(skill: &str) -> String {
    format!("{} tutorial for beginners", skill)
}

fn capture_word(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|word| word.as_str().to_string())
}

fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}
