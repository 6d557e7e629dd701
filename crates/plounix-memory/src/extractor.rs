// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fact extraction from a single conversational turn.
//!
//! Two strategies sit behind [`FactExtractor`]: a conservative rule list
//! (every rule needs an explicit lexical trigger) and an oracle-backed
//! extractor whose JSON output is validated before use.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use plounix_core::types::MemoryType;
use plounix_core::{OracleAdapter, PlounixError};
use regex::Regex;
use tracing::{debug, warn};

use crate::types::{CandidateFact, ExtractedFact, truncate_chars};

/// Longest verbatim excerpt kept from a user message.
pub const MAX_EXCERPT_CHARS: usize = 200;

/// Longest item phrase accepted by the price inquiry rule, in words.
const MAX_ITEM_WORDS: usize = 6;

/// Currency amounts: `₱55,000`, `PHP 1,200.50`, `P500`, `20k pesos`, `300 php`.
static CURRENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:₱\s?|\bphp\s?|\bp\s?)\d[\d,]*(?:\.\d+)?k?|\b\d[\d,]*(?:\.\d+)?k?\s?(?:pesos?|php)\b",
    )
    .expect("currency pattern is valid")
});

static PRICE_TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\bhow\s+much(?:\s+(?:is|are|was|were|for|does|do|did|would|will|should|can|could|has|have))?|\bmagkano(?:\s+(?:po|ba|kaya))*|\b(?:price|cost|presyo)\s+(?:of|ng|for))\s+(?P<item>[^?!.\n]+)",
    )
    .expect("price trigger pattern is valid")
});

/// Words that end an item phrase.
static ITEM_STOP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(?:is|are|for|ng|cost|costs)\b").expect("item stop pattern is valid")
});

static INCOME_VOCAB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:income|salary|sahod|sweldo|suweldo|kinikita|earn|earns|earning|allowance)\b",
    )
    .expect("income pattern is valid")
});

static SAVINGS_VOCAB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:save|saving|savings|ipon|mag-?ipon|makaipon|mag-?save)\b")
        .expect("savings pattern is valid")
});

static CONCERN_VOCAB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:problem|problems|problema|worried|worry|worrying|stressed|stress|can[’']t afford|cannot afford|struggling|broke|utang|debt|debts|hirap|nag-?aalala)\b",
    )
    .expect("concern pattern is valid")
});

static PREFERENCE_VOCAB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:prefer|prefers|preferred|gusto|favorite|favourite|favorites)\b")
        .expect("preference pattern is valid")
});

/// One conversational turn, as seen by the extraction rules.
#[derive(Debug, Clone, Copy)]
pub struct Turn<'a> {
    pub user_message: &'a str,
    pub assistant_reply: &'a str,
}

/// Derives candidate facts from a turn.
#[async_trait]
pub trait FactExtractor: Send + Sync {
    /// Extract zero or more candidates. A turn with nothing memorable yields
    /// an empty list, not an error.
    async fn extract(
        &self,
        user_message: &str,
        assistant_reply: &str,
    ) -> Result<Vec<CandidateFact>, PlounixError>;
}

/// A single independent pattern-to-candidate rule.
pub trait ExtractionRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, turn: &Turn<'_>) -> Option<CandidateFact>;
}

/// First currency amount in `text`, as written.
pub fn find_amount(text: &str) -> Option<&str> {
    CURRENCY
        .find(text)
        .map(|m| m.as_str().trim_end_matches([',', '.']).trim())
}

/// Lowercase `[a-z0-9_]` slug of an item phrase.
pub fn slugify(phrase: &str) -> String {
    let mut slug = String::with_capacity(phrase.len());
    for c in phrase.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

/// Price inquiry: "how much is X?" paired with the amount in the reply.
pub struct PriceInquiryRule;

impl PriceInquiryRule {
    const LEADING_ARTICLES: [&'static str; 6] = ["ang", "the", "a", "an", "yung", "'yung"];
    const TRAILING_PARTICLES: [&'static str; 4] = ["po", "ba", "kaya", "ngayon"];
    const FIRST_PERSON: [&'static str; 6] = ["i", "my", "me", "we", "ako", "ko"];

    fn item_phrase(user_message: &str) -> Option<String> {
        let caps = PRICE_TRIGGER.captures(user_message)?;
        let raw = caps.name("item")?.as_str();
        let raw = ITEM_STOP.split(raw).next().unwrap_or(raw);

        let mut words: Vec<&str> = raw.split_whitespace().collect();
        while words
            .first()
            .is_some_and(|w| Self::LEADING_ARTICLES.contains(&w.to_lowercase().as_str()))
        {
            words.remove(0);
        }
        while words
            .last()
            .is_some_and(|w| Self::TRAILING_PARTICLES.contains(&w.to_lowercase().as_str()))
        {
            words.pop();
        }

        if words.is_empty() || words.len() > MAX_ITEM_WORDS {
            return None;
        }
        if words
            .iter()
            .any(|w| Self::FIRST_PERSON.contains(&w.to_lowercase().as_str()))
        {
            return None;
        }
        Some(words.join(" "))
    }
}

impl ExtractionRule for PriceInquiryRule {
    fn name(&self) -> &'static str {
        "price_inquiry"
    }

    fn apply(&self, turn: &Turn<'_>) -> Option<CandidateFact> {
        let item = Self::item_phrase(turn.user_message)?;
        let slug = slugify(&item);
        if slug.is_empty() {
            return None;
        }
        let price = find_amount(turn.assistant_reply).unwrap_or("price discussed");
        Some(
            CandidateFact::new(MemoryType::Item, format!("item_{slug}"), format!("{item}: {price}"), 8)
                .with_category("purchase_inquiry")
                .with_context(truncate_chars(turn.user_message, MAX_EXCERPT_CHARS)),
        )
    }
}

/// Vocabulary trigger plus a currency amount in the user message, stored
/// under a fixed key so later disclosures overwrite earlier ones.
pub struct AmountDisclosureRule {
    name: &'static str,
    trigger: &'static Regex,
    memory_type: MemoryType,
    category: &'static str,
    key: &'static str,
    label: &'static str,
    importance: i64,
}

impl AmountDisclosureRule {
    pub fn income() -> Self {
        Self {
            name: "income",
            trigger: &INCOME_VOCAB,
            memory_type: MemoryType::Fact,
            category: "income",
            key: "monthly_income",
            label: "Monthly income",
            importance: 9,
        }
    }

    pub fn savings_goal() -> Self {
        Self {
            name: "savings_goal",
            trigger: &SAVINGS_VOCAB,
            memory_type: MemoryType::Goal,
            category: "savings",
            key: "savings_goal",
            label: "Savings goal",
            importance: 8,
        }
    }
}

impl ExtractionRule for AmountDisclosureRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply(&self, turn: &Turn<'_>) -> Option<CandidateFact> {
        if !self.trigger.is_match(turn.user_message) {
            return None;
        }
        let amount = find_amount(turn.user_message)?;
        Some(
            CandidateFact::new(
                self.memory_type,
                self.key,
                format!("{}: {amount}", self.label),
                self.importance,
            )
            .with_category(self.category)
            .with_context(truncate_chars(turn.user_message, MAX_EXCERPT_CHARS)),
        )
    }
}

/// Vocabulary trigger that keeps the user's own words. Used for
/// accumulating types, so `key` is a base key.
pub struct VerbatimRule {
    name: &'static str,
    trigger: &'static Regex,
    memory_type: MemoryType,
    category: &'static str,
    importance: i64,
}

impl VerbatimRule {
    pub fn concern() -> Self {
        Self {
            name: "concern",
            trigger: &CONCERN_VOCAB,
            memory_type: MemoryType::Concern,
            category: "financial",
            importance: 7,
        }
    }

    pub fn preference() -> Self {
        Self {
            name: "preference",
            trigger: &PREFERENCE_VOCAB,
            memory_type: MemoryType::Preference,
            category: "general",
            importance: 6,
        }
    }
}

impl ExtractionRule for VerbatimRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply(&self, turn: &Turn<'_>) -> Option<CandidateFact> {
        let message = turn.user_message.trim();
        if message.is_empty() || !self.trigger.is_match(message) {
            return None;
        }
        Some(
            CandidateFact::new(
                self.memory_type,
                self.name,
                truncate_chars(message, MAX_EXCERPT_CHARS),
                self.importance,
            )
            .with_category(self.category),
        )
    }
}

/// The five baseline rules, in evaluation order.
pub fn default_rules() -> Vec<Box<dyn ExtractionRule>> {
    vec![
        Box::new(PriceInquiryRule),
        Box::new(AmountDisclosureRule::income()),
        Box::new(AmountDisclosureRule::savings_goal()),
        Box::new(VerbatimRule::concern()),
        Box::new(VerbatimRule::preference()),
    ]
}

/// Deterministic extractor evaluating an ordered list of rules.
pub struct RuleBasedExtractor {
    rules: Vec<Box<dyn ExtractionRule>>,
}

impl Default for RuleBasedExtractor {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

impl RuleBasedExtractor {
    /// An extractor with no rules; add them with [`RuleBasedExtractor::with_rule`].
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: impl ExtractionRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Pure, synchronous form of [`FactExtractor::extract`].
    pub fn extract_turn(&self, user_message: &str, assistant_reply: &str) -> Vec<CandidateFact> {
        let turn = Turn {
            user_message,
            assistant_reply,
        };
        self.rules
            .iter()
            .filter_map(|rule| {
                let candidate = rule.apply(&turn)?;
                debug!(rule = rule.name(), key = %candidate.key, "rule matched");
                Some(candidate)
            })
            .collect()
    }
}

#[async_trait]
impl FactExtractor for RuleBasedExtractor {
    async fn extract(
        &self,
        user_message: &str,
        assistant_reply: &str,
    ) -> Result<Vec<CandidateFact>, PlounixError> {
        Ok(self.extract_turn(user_message, assistant_reply))
    }
}

/// Prompt for oracle-backed extraction.
const EXTRACTION_PROMPT: &str = r#"Extract durable facts about the user from this conversation turn that would help a personal-finance assistant in future conversations. Output a JSON array.

Each element must be an object with:
- "memory_type": one of "fact", "preference", "goal", "item", "concern"
- "category": short label such as "income", "savings", "purchase_inquiry", "financial", "general"
- "key": snake_case deduplication key, e.g. "monthly_income", "savings_goal", "item_iphone_15"
- "value": the fact as a short standalone statement (at most 200 characters)
- "importance": integer from 1 (trivial) to 10 (central)

Only include facts stated by the user. Do not infer or guess. If nothing is worth remembering, return [].

User: {user_message}
Assistant: {assistant_reply}

Output the JSON array only, no explanation:"#;

/// Extractor that asks the oracle for structured output and validates it.
pub struct OracleExtractor {
    oracle: Arc<dyn OracleAdapter>,
}

impl OracleExtractor {
    pub fn new(oracle: Arc<dyn OracleAdapter>) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl FactExtractor for OracleExtractor {
    async fn extract(
        &self,
        user_message: &str,
        assistant_reply: &str,
    ) -> Result<Vec<CandidateFact>, PlounixError> {
        let prompt = EXTRACTION_PROMPT
            .replace("{user_message}", user_message)
            .replace("{assistant_reply}", assistant_reply);
        let response = self.oracle.complete(&prompt).await?;
        Ok(validate_extracted(parse_extraction_response(&response)))
    }
}

/// Parse an oracle extraction response into raw items.
///
/// Handles bare JSON arrays, markdown code fences and surrounding prose.
/// Returns an empty Vec when no array can be parsed.
pub fn parse_extraction_response(response: &str) -> Vec<ExtractedFact> {
    let trimmed = response.trim();
    let (Some(start), Some(end)) = (trimmed.find('['), trimmed.rfind(']')) else {
        warn!("extraction response contains no JSON array");
        debug!(response, "raw extraction response");
        return Vec::new();
    };
    if end < start {
        return Vec::new();
    }

    // Items are parsed one by one so a single malformed object is dropped alone.
    match serde_json::from_str::<Vec<serde_json::Value>>(&trimmed[start..=end]) {
        Ok(items) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<ExtractedFact>(item) {
                Ok(fact) => Some(fact),
                Err(e) => {
                    warn!(error = %e, "dropping malformed extraction item");
                    None
                }
            })
            .collect(),
        Err(e) => {
            warn!(error = %e, "failed to parse extraction response");
            debug!(response, "raw extraction response");
            Vec::new()
        }
    }
}

/// Convert raw items into candidates, dropping and logging invalid ones.
pub fn validate_extracted(items: Vec<ExtractedFact>) -> Vec<CandidateFact> {
    items
        .into_iter()
        .filter_map(|item| match CandidateFact::try_from(item) {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                warn!(error = %e, "rejected extraction candidate");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use plounix_core::types::{AdapterType, HealthStatus};
    use plounix_core::PluginAdapter;

    fn extract(user: &str, reply: &str) -> Vec<CandidateFact> {
        RuleBasedExtractor::default().extract_turn(user, reply)
    }

    #[test]
    fn tagalog_price_inquiry_pairs_reply_amount() {
        let facts = extract("Magkano po ang iPhone 15?", "Around ₱55,000 po");
        assert_eq!(facts.len(), 1);
        let item = &facts[0];
        assert_eq!(item.memory_type, MemoryType::Item);
        assert_eq!(item.category.as_deref(), Some("purchase_inquiry"));
        assert_eq!(item.key, "item_iphone_15");
        assert!(item.value.contains("55,000"), "value was {}", item.value);
        assert_eq!(item.importance, 8);
    }

    #[test]
    fn extraction_is_deterministic() {
        let first = extract("Magkano po ang iPhone 15?", "Around ₱55,000 po");
        for _ in 0..10 {
            assert_eq!(extract("Magkano po ang iPhone 15?", "Around ₱55,000 po"), first);
        }
    }

    #[test]
    fn english_price_inquiry_without_amount() {
        let facts = extract("How much is the MacBook Air?", "It depends on the configuration.");
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].key, "item_macbook_air");
        assert_eq!(facts[0].value, "MacBook Air: price discussed");
    }

    #[test]
    fn price_phrase_stops_at_connector() {
        let facts = extract("What's the price of a rice cooker for my mom?", "About P1,500.");
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].key, "item_rice_cooker");
        assert!(facts[0].value.ends_with("P1,500"));
    }

    #[test]
    fn first_person_questions_are_not_items() {
        assert!(extract("how much do I earn?", "").is_empty());
        assert!(extract("How much should I save each month?", "").is_empty());
    }

    #[test]
    fn income_disclosure_needs_an_amount() {
        let facts = extract("My monthly income is ₱18,000", "Got it!");
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].key, "monthly_income");
        assert_eq!(facts[0].memory_type, MemoryType::Fact);
        assert_eq!(facts[0].value, "Monthly income: ₱18,000");
        assert_eq!(facts[0].importance, 9);

        assert!(extract("I want a higher income someday", "").is_empty());
    }

    #[test]
    fn savings_goal_with_suffix_amount() {
        let facts = extract("Gusto kong mag-ipon ng 10,000 pesos", "Kaya mo yan!");
        let goal = facts.iter().find(|f| f.key == "savings_goal").unwrap();
        assert_eq!(goal.memory_type, MemoryType::Goal);
        assert_eq!(goal.value, "Savings goal: 10,000 pesos");
        // "gusto" is preference vocabulary too; rules are independent.
        assert!(facts.iter().any(|f| f.memory_type == MemoryType::Preference));
    }

    #[test]
    fn concern_keeps_truncated_message() {
        let long = format!("I'm worried I can't afford rent {}", "x".repeat(300));
        let facts = extract(&long, "");
        let concern = facts.iter().find(|f| f.memory_type == MemoryType::Concern).unwrap();
        assert_eq!(concern.key, "concern");
        assert_eq!(concern.importance, 7);
        assert_eq!(concern.value.chars().count(), MAX_EXCERPT_CHARS);
        assert!(concern.value.starts_with("I'm worried"));
    }

    #[test]
    fn preference_rule() {
        let facts = extract("I prefer cash over cards", "Noted.");
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].memory_type, MemoryType::Preference);
        assert_eq!(facts[0].category.as_deref(), Some("general"));
        assert_eq!(facts[0].importance, 6);
    }

    #[test]
    fn small_talk_yields_nothing() {
        assert!(extract("hello Fili!", "Hi! How can I help?").is_empty());
    }

    #[test]
    fn currency_forms() {
        assert_eq!(find_amount("it is ₱55,000, po"), Some("₱55,000"));
        assert_eq!(find_amount("PHP 1,200.50 lang"), Some("PHP 1,200.50"));
        assert_eq!(find_amount("about 20k pesos"), Some("20k pesos"));
        assert_eq!(find_amount("P500 only"), Some("P500"));
        assert_eq!(find_amount("step 5 of 10"), None);
    }

    #[test]
    fn custom_rule_can_be_added() {
        struct Allowance;
        impl ExtractionRule for Allowance {
            fn name(&self) -> &'static str {
                "weekly_allowance"
            }
            fn apply(&self, turn: &Turn<'_>) -> Option<CandidateFact> {
                turn.user_message
                    .contains("baon")
                    .then(|| CandidateFact::new(MemoryType::Fact, "weekly_allowance", "has baon", 7))
            }
        }

        let extractor = RuleBasedExtractor::empty().with_rule(Allowance);
        assert_eq!(extractor.rule_names(), vec!["weekly_allowance"]);
        assert_eq!(extractor.extract_turn("my baon is small", "").len(), 1);
        assert!(extractor.extract_turn("My monthly income is ₱18,000", "").is_empty());
    }

    #[test]
    fn parse_fenced_json_with_prose() {
        let response = r#"Here you go:
```json
[{"memory_type": "fact", "category": "income", "key": "monthly_income", "value": "Earns ₱25,000 monthly", "importance": 9}]
```
Hope that helps."#;
        let items = parse_extraction_response(response);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].key, "monthly_income");
    }

    #[test]
    fn parse_garbage_yields_nothing() {
        assert!(parse_extraction_response("I could not find anything.").is_empty());
        assert!(parse_extraction_response("[not json").is_empty());
        assert!(parse_extraction_response("] backwards [").is_empty());
    }

    #[test]
    fn invalid_items_are_dropped_individually() {
        let response = r#"[
            {"memory_type": "opinion", "key": "x", "value": "y", "importance": 5},
            {"memory_type": "goal", "key": "savings_goal", "value": "Save ₱5,000", "importance": 42},
            {"memory_type": "goal", "key": "savings_goal", "value": "Save ₱5,000", "importance": 8},
            {"key": "no_type"},
            "just a string"
        ]"#;
        let candidates = validate_extracted(parse_extraction_response(response));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].memory_type, MemoryType::Goal);
        assert_eq!(candidates[0].importance, 8);
    }

    struct CannedOracle(&'static str);

    #[async_trait]
    impl PluginAdapter for CannedOracle {
        fn name(&self) -> &str {
            "canned"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Oracle
        }
        async fn health_check(&self) -> Result<HealthStatus, PlounixError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), PlounixError> {
            Ok(())
        }
    }

    #[async_trait]
    impl OracleAdapter for CannedOracle {
        async fn complete(&self, prompt: &str) -> Result<String, PlounixError> {
            assert!(prompt.contains("User: I earn ₱30,000"));
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn oracle_extractor_validates_output() {
        let oracle = Arc::new(CannedOracle(
            r#"[{"memory_type":"fact","category":"income","key":"monthly_income","value":"Monthly income: ₱30,000","importance":9},
                {"memory_type":"fact","key":"","value":"blank key","importance":5}]"#,
        ));
        let extractor = OracleExtractor::new(oracle);
        let facts = extractor.extract("I earn ₱30,000", "Nice!").await.unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].key, "monthly_income");
    }
}
