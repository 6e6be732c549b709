//! Rule short-circuit for canned conversational phrases.
//!
//! Matching: exact phrase first, then the first phrase (in table order) that
//! occurs anywhere in the normalized query.

use serde::{Deserialize, Serialize};

/// One phrase → response entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub phrase: String,
    pub response: String,
}

impl Rule {
    pub fn new(phrase: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into().trim().to_lowercase(),
            response: response.into(),
        }
    }
}

/// Default rule table. Order is the substring tie-break.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new("hello", "Hello! How can I help you today?"),
        Rule::new("hi", "Hi there! What can I do for you?"),
        Rule::new("bye", "Goodbye! Have a great day!"),
        Rule::new("thanks", "You're welcome!"),
        Rule::new(
            "help",
            "I can help you with:\n1. Answering questions about documents\n2. General conversation\n3. Specific queries based on rules",
        ),
    ]
}

/// Static phrase table matcher. Pure; no side effects.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<Rule>,
}

impl RuleEngine {
    pub fn new(rules: Vec<Rule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|r| Rule::new(r.phrase, r.response))
            .filter(|r| !r.phrase.is_empty())
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Respond to a query, or `None` when no rule matches.
    pub fn respond(&self, query: &str) -> Option<&str> {
        let query = query.trim().to_lowercase();

        if let Some(rule) = self.rules.iter().find(|r| r.phrase == query) {
            return Some(&rule.response);
        }

        self.rules
            .iter()
            .find(|r| query.contains(&r.phrase))
            .map(|r| r.response.as_str())
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_ignores_case_and_whitespace() {
        let engine = RuleEngine::default();
        assert_eq!(
            engine.respond("  HeLLo \n"),
            Some("Hello! How can I help you today?")
        );
    }

    #[test]
    fn substring_match_finds_farewell() {
        let engine = RuleEngine::default();
        assert_eq!(
            engine.respond("ok, bye for now"),
            Some("Goodbye! Have a great day!")
        );
    }

    #[test]
    fn no_match_returns_none() {
        let engine = RuleEngine::default();
        assert_eq!(engine.respond("what is the grading policy"), None);
    }

    #[test]
    fn first_rule_in_table_order_wins() {
        let engine = RuleEngine::default();
        // Contains both "hello" and "hi"; "hello" is defined first.
        assert_eq!(
            engine.respond("hello, this is odd"),
            Some("Hello! How can I help you today?")
        );
    }

    #[test]
    fn exact_match_beats_earlier_substring() {
        let engine = RuleEngine::new(vec![
            Rule::new("thanks", "You're welcome!"),
            Rule::new("thanks a lot", "Any time!"),
        ]);
        assert_eq!(engine.respond("Thanks a lot"), Some("Any time!"));
        assert_eq!(engine.respond("thanks a lot again"), Some("You're welcome!"));
    }

    #[test]
    fn custom_rules_are_normalized() {
        let engine = RuleEngine::new(vec![
            Rule::new("  Office Hours ", "Tuesdays 2-4pm"),
            Rule::new("   ", "never matches"),
        ]);
        assert_eq!(engine.rules().len(), 1);
        assert_eq!(engine.respond("when are office hours?"), Some("Tuesdays 2-4pm"));
    }
}
