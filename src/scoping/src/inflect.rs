//! Singular/plural association names derived from type names
//!
//! Association inference compares relationship field names against the
//! singular and plural forms of a scoping type (`City` → `city`, `cities`).
//! Persistence layers with their own naming rules plug in an [`Inflector`].

use heck::ToSnakeCase;

/// Words whose plural is not formed by a regular rule
const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("ox", "oxen"),
    ("leaf", "leaves"),
    ("half", "halves"),
    ("knife", "knives"),
    ("wife", "wives"),
    ("life", "lives"),
    ("quiz", "quizzes"),
];

/// Words with identical singular and plural forms
const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "news",
    "police",
];

/// Derives association names from a type name
pub trait Inflector: Send + Sync {
    /// Singular association name (`UserGroup` → `user_group`)
    fn singular(&self, type_name: &str) -> String;

    /// Plural association name (`UserGroup` → `user_groups`)
    fn plural(&self, type_name: &str) -> String;
}

/// Snake-case English inflection with regular plural rules
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishInflector;

impl EnglishInflector {
    pub fn new() -> Self {
        Self
    }
}

impl Inflector for EnglishInflector {
    fn singular(&self, type_name: &str) -> String {
        base_name(type_name).to_snake_case()
    }

    fn plural(&self, type_name: &str) -> String {
        let singular = self.singular(type_name);
        match singular.rsplit_once('_') {
            Some((head, last)) => format!("{head}_{}", pluralize_word(last)),
            None => pluralize_word(&singular),
        }
    }
}

/// Drop any module path (`Authz::Role`, `crate::models::City`)
fn base_name(type_name: &str) -> &str {
    type_name
        .rsplit("::")
        .next()
        .unwrap_or(type_name)
}

/// Pluralize a single lowercase word
pub fn pluralize_word(word: &str) -> String {
    if word.is_empty() || UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }

    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == word) {
        return (*plural).to_string();
    }

    if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| word.ends_with(suffix)) {
        return format!("{word}es");
    }

    if let Some(stem) = word.strip_suffix('y') {
        let preceded_by_vowel = stem
            .chars()
            .last()
            .is_some_and(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'));
        if !stem.is_empty() && !preceded_by_vowel {
            return format!("{stem}ies");
        }
    }

    format!("{word}s")
}
