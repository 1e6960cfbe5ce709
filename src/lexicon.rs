//! Categorized trigger lexicon
//!
//! The lexicon maps each [`LexiconCategory`] to an ordered list of lowercase
//! phrases. Phrases are unique within a category; inserting a duplicate is a
//! silent no-op. The store is seeded from the built-in corpus and only changes
//! through explicit add/remove calls or a configuration update.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::TriggerKind;

/// Version of the built-in trigger corpus
pub const LEXICON_VERSION: &str = "4.0";

/// Fixed set of lexicon categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LexiconCategory {
    #[serde(rename = "comparisonTriggers")]
    Comparison,
    #[serde(rename = "anxietyTriggers")]
    Anxiety,
    #[serde(rename = "depressionTriggers")]
    Depression,
    #[serde(rename = "bodyImageTriggers")]
    BodyImage,
    #[serde(rename = "materialismTriggers")]
    Materialism,
    #[serde(rename = "ostentationPatterns")]
    Ostentation,
    #[serde(rename = "toxicEmojis")]
    ToxicEmojis,
    #[serde(rename = "toxicHashtags")]
    ToxicHashtags,
}

impl LexiconCategory {
    /// Every category, in storage order
    pub const ALL: [LexiconCategory; 8] = [
        LexiconCategory::Comparison,
        LexiconCategory::Anxiety,
        LexiconCategory::Depression,
        LexiconCategory::BodyImage,
        LexiconCategory::Materialism,
        LexiconCategory::Ostentation,
        LexiconCategory::ToxicEmojis,
        LexiconCategory::ToxicHashtags,
    ];

    /// Phrase categories scanned by the scoring engine, in scan order.
    /// The scan order decides which category labels an assessment.
    pub const SCORED: [LexiconCategory; 6] = [
        LexiconCategory::Comparison,
        LexiconCategory::Anxiety,
        LexiconCategory::Depression,
        LexiconCategory::BodyImage,
        LexiconCategory::Materialism,
        LexiconCategory::Ostentation,
    ];

    /// Categories whose phrases count towards keyword density
    pub const DENSITY: [LexiconCategory; 5] = [
        LexiconCategory::Comparison,
        LexiconCategory::Anxiety,
        LexiconCategory::Depression,
        LexiconCategory::BodyImage,
        LexiconCategory::Materialism,
    ];

    /// Storage key of the category
    pub fn key(&self) -> &'static str {
        match self {
            LexiconCategory::Comparison => "comparisonTriggers",
            LexiconCategory::Anxiety => "anxietyTriggers",
            LexiconCategory::Depression => "depressionTriggers",
            LexiconCategory::BodyImage => "bodyImageTriggers",
            LexiconCategory::Materialism => "materialismTriggers",
            LexiconCategory::Ostentation => "ostentationPatterns",
            LexiconCategory::ToxicEmojis => "toxicEmojis",
            LexiconCategory::ToxicHashtags => "toxicHashtags",
        }
    }

    /// Resolve a category from its storage key or short name
    /// (`comparisonTriggers`, `comparison`, `body_image`, ...)
    pub fn from_key(key: &str) -> Option<Self> {
        let normalized = key.trim();
        Self::ALL.into_iter().find(|c| {
            c.key() == normalized
                || c.short_name() == normalized
                || c.short_name().eq_ignore_ascii_case(&normalized.replace('_', ""))
        })
    }

    /// Short name, also used as the sensitivity key
    pub fn short_name(&self) -> &'static str {
        match self {
            LexiconCategory::Comparison => "comparison",
            LexiconCategory::Anxiety => "anxiety",
            LexiconCategory::Depression => "depression",
            LexiconCategory::BodyImage => "bodyImage",
            LexiconCategory::Materialism => "materialism",
            LexiconCategory::Ostentation => "ostentation",
            LexiconCategory::ToxicEmojis => "toxicEmojis",
            LexiconCategory::ToxicHashtags => "toxicHashtags",
        }
    }

    /// Base weight of a hit before specificity and sensitivity scaling
    pub fn base_weight(&self) -> f64 {
        match self {
            LexiconCategory::Depression => 25.0,
            LexiconCategory::BodyImage => 22.0,
            LexiconCategory::Comparison => 20.0,
            LexiconCategory::Anxiety => 18.0,
            LexiconCategory::Materialism => 15.0,
            _ => 15.0,
        }
    }

    /// Factor applied to a hit's weight when adding it to the toxicity total
    pub fn toxicity_multiplier(&self) -> f64 {
        match self {
            LexiconCategory::Comparison => 0.8,
            LexiconCategory::Anxiety => 0.7,
            LexiconCategory::Depression => 1.2,
            LexiconCategory::BodyImage => 0.9,
            LexiconCategory::Materialism => 0.6,
            _ => 1.0,
        }
    }

    /// Trigger kind reported when this category produces the first hit
    pub fn trigger_kind(&self) -> Option<TriggerKind> {
        match self {
            LexiconCategory::Comparison => Some(TriggerKind::SocialComparison),
            LexiconCategory::Anxiety => Some(TriggerKind::AnxietyFomo),
            LexiconCategory::Depression => Some(TriggerKind::DepressionRisk),
            LexiconCategory::BodyImage => Some(TriggerKind::BodyImage),
            LexiconCategory::Materialism => Some(TriggerKind::ExcessiveMaterialism),
            LexiconCategory::Ostentation => Some(TriggerKind::Ostentation),
            LexiconCategory::ToxicEmojis | LexiconCategory::ToxicHashtags => None,
        }
    }
}

/// Mutable store of categorized trigger phrases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<LexiconCategory, Vec<String>>",
    into = "BTreeMap<LexiconCategory, Vec<String>>"
)]
pub struct LexiconStore {
    categories: BTreeMap<LexiconCategory, Vec<String>>,
}

impl Default for LexiconStore {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LexiconStore {
    /// Create a store with every category present and empty
    pub fn empty() -> Self {
        Self {
            categories: LexiconCategory::ALL
                .into_iter()
                .map(|c| (c, Vec::new()))
                .collect(),
        }
    }

    /// Create a store seeded with the built-in trigger corpus
    pub fn builtin() -> Self {
        let mut store = Self::empty();
        for (category, phrases) in corpus::SEED {
            for phrase in phrases.iter() {
                store.insert(*category, phrase);
            }
        }
        store
    }

    /// Insert a phrase (lowercased). Returns `false` for duplicates and blanks.
    pub fn insert(&mut self, category: LexiconCategory, phrase: &str) -> bool {
        let phrase = phrase.to_lowercase();
        if phrase.trim().is_empty() {
            return false;
        }
        let entries = self.categories.entry(category).or_default();
        if entries.contains(&phrase) {
            return false;
        }
        entries.push(phrase);
        true
    }

    /// Remove a phrase (matched lowercased). Returns `true` if it was present.
    pub fn remove(&mut self, category: LexiconCategory, phrase: &str) -> bool {
        let phrase = phrase.to_lowercase();
        match self.categories.get_mut(&category) {
            Some(entries) => {
                let before = entries.len();
                entries.retain(|p| p != &phrase);
                entries.len() != before
            }
            None => false,
        }
    }

    /// Replace a whole category, normalizing case and dropping duplicates
    pub fn replace(&mut self, category: LexiconCategory, phrases: Vec<String>) {
        self.categories.insert(category, Vec::with_capacity(phrases.len()));
        for phrase in phrases {
            self.insert(category, &phrase);
        }
    }

    /// Phrases of a category in insertion order
    pub fn phrases(&self, category: LexiconCategory) -> &[String] {
        self.categories
            .get(&category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, category: LexiconCategory, phrase: &str) -> bool {
        self.phrases(category).contains(&phrase.to_lowercase())
    }

    /// Total number of entries across all categories
    pub fn total_entries(&self) -> usize {
        self.categories.values().map(|v| v.len()).sum()
    }

    /// Number of categories held by the store
    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// Entry count per category key
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.categories
            .iter()
            .map(|(c, v)| (c.key().to_string(), v.len()))
            .collect()
    }

    /// All phrases that count towards keyword density
    pub fn density_phrases(&self) -> impl Iterator<Item = &str> {
        LexiconCategory::DENSITY
            .into_iter()
            .flat_map(move |c| self.phrases(c).iter().map(|s| s.as_str()))
    }
}

impl From<BTreeMap<LexiconCategory, Vec<String>>> for LexiconStore {
    fn from(raw: BTreeMap<LexiconCategory, Vec<String>>) -> Self {
        let mut store = Self::empty();
        for (category, phrases) in raw {
            store.replace(category, phrases);
        }
        store
    }
}

impl From<LexiconStore> for BTreeMap<LexiconCategory, Vec<String>> {
    fn from(store: LexiconStore) -> Self {
        store.categories
    }
}

/// Built-in trigger corpus (Portuguese and English)
#[rustfmt::skip]
mod corpus {
    use super::LexiconCategory;

    pub(super) const SEED: &[(LexiconCategory, &[&str])] = &[
        (LexiconCategory::Comparison, COMPARISON),
        (LexiconCategory::Anxiety, ANXIETY),
        (LexiconCategory::Depression, DEPRESSION),
        (LexiconCategory::BodyImage, BODY_IMAGE),
        (LexiconCategory::Materialism, MATERIALISM),
        (LexiconCategory::Ostentation, OSTENTATION),
        (LexiconCategory::ToxicEmojis, TOXIC_EMOJIS),
        (LexiconCategory::ToxicHashtags, TOXIC_HASHTAGS),
    ];

    const COMPARISON: &[&str] = &[
        "vida perfeita", "sucesso extremo", "blessed", "richlife", "lifestyle perfeito",
        "corpo perfeito", "relacionamento perfeito", "viagem dos sonhos", "casa dos sonhos",
        "carro novo", "marca de luxo", "riqueza", "conquista", "achievement",
        "melhor que", "superior", "único", "especial", "privilegiado", "inveja",
        "todos querem", "ninguém tem", "só eu tenho", "consegui", "conquistei",
        "perfect life", "extreme success", "blessed life", "rich lifestyle",
        "perfect body", "perfect relationship", "dream vacation", "dream house",
        "new car", "luxury brand", "wealth", "achievement", "accomplished",
        "better than", "superior", "unique", "special", "privileged", "envy",
        "everyone wants", "nobody has", "only I have", "achieved", "conquered",
    ];

    const ANXIETY: &[&str] = &[
        "fomo", "urgência", "limitado", "apenas hoje", "última chance", "vai acabar",
        "você está perdendo", "todos estão fazendo", "não perca", "exclusivo",
        "limited edition", "sold out", "running out", "deadline", "pressure",
        "pressa", "ansiedade", "stress", "overwhelmed", "panic", "desespero",
        "urgency", "limited", "only today", "last chance", "running out",
        "you are missing", "everyone is doing", "dont miss", "exclusive",
        "limited edition", "sold out", "deadline", "pressure", "hurry",
        "anxiety", "stress", "overwhelmed", "panic", "desperation",
    ];

    const DEPRESSION: &[&str] = &[
        "não sou suficiente", "por que eu não tenho", "minha vida é um fracasso",
        "nunca vou conseguir", "sou um perdedor", "todo mundo menos eu",
        "não mereço", "sou inadequado", "sem esperança", "sem sentido",
        "vazio", "quebrado", "inútil", "fracasso", "desistir", "sem valor",
        "not enough", "why dont I have", "my life is a failure",
        "never going to make it", "I am a loser", "everyone but me",
        "dont deserve", "inadequate", "hopeless", "meaningless",
        "empty", "broken", "worthless", "failure", "give up", "no value",
    ];

    const BODY_IMAGE: &[&str] = &[
        "corpo dos sonhos", "transformação radical", "antes e depois", "peso ideal",
        "bodygoals", "fitness inspiration", "perfect body", "summer body",
        "bikini body", "abs", "sixpack", "diet", "skinny", "magra", "gorda",
        "fat loss", "muscle gain", "transformation", "glow up", "makeover",
        "corpo perfeito", "shape", "forma física", "medidas", "silhueta",
        "dream body", "radical transformation", "before and after", "ideal weight",
        "body goals", "fitness inspiration", "perfect body", "summer body",
        "bikini body", "abs", "six pack", "diet", "skinny", "fat", "thin",
        "fat loss", "muscle gain", "transformation", "glow up", "makeover",
    ];

    const MATERIALISM: &[&str] = &[
        "nova compra", "produto caro", "vale muito", "investimento caro",
        "shopping", "haul", "expensive", "luxury", "designer", "marca cara",
        "brand new", "worth it", "splurge", "treat myself", "me dei de presente",
        "money spent", "cost", "price", "expensive taste", "gosto caro",
        "new purchase", "expensive product", "worth a lot", "expensive investment",
        "shopping", "haul", "expensive", "luxury", "designer", "expensive brand",
        "brand new", "worth it", "splurge", "treat myself", "gave myself",
        "money spent", "cost", "price", "expensive taste",
    ];

    const OSTENTATION: &[&str] = &[
        "olhem meu", "vejam minha", "consegui comprar", "acabei de ganhar",
        "meu novo", "minha nova", "finalmente consegui", "me dei o luxo",
        "posso pagar", "caro mas vale", "dinheiro bem gasto", "investimento",
        "look at my", "check out my", "just bought", "just got",
        "my new", "finally got", "treated myself", "can afford",
        "expensive but worth it", "money well spent", "investment",
    ];

    const TOXIC_EMOJIS: &[&str] = &[
        "💎", "🏖️", "✨", "🚗", "🏠", "💰", "👑", "🔥", "💪", "🎉",
        "🏆", "💯", "🤑", "💸", "🥇", "⭐", "🌟", "💫", "🎯", "🚀",
    ];

    const TOXIC_HASHTAGS: &[&str] = &[
        "#blessed", "#richlife", "#luxury", "#expensive", "#perfect",
        "#goals", "#rich", "#money", "#success", "#winning", "#winner",
        "#bodygoals", "#fitspiration", "#thinspiration", "#perfectbody",
        "#lifestyle", "#flexing", "#showoff", "#humblebrag", "#flex",
        "#richkid", "#luxurylife", "#moneytalks", "#successmindset",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_phrases_are_unique_and_lowercase() {
        let store = LexiconStore::builtin();
        for category in LexiconCategory::ALL {
            let phrases = store.phrases(category);
            assert!(!phrases.is_empty(), "{} is empty", category.key());
            for (i, p) in phrases.iter().enumerate() {
                assert_eq!(p, &p.to_lowercase());
                assert!(!phrases[i + 1..].contains(p), "duplicate {p}");
            }
        }
    }

    #[test]
    fn test_builtin_keeps_first_occurrence_order() {
        let store = LexiconStore::builtin();
        let comparison = store.phrases(LexiconCategory::Comparison);
        assert_eq!(comparison[0], "vida perfeita");
        assert_eq!(comparison[2], "blessed");
        assert!(store.contains(LexiconCategory::Comparison, "only i have"));
        assert!(store.contains(LexiconCategory::Comparison, "Only I Have"));
    }

    #[test]
    fn test_insert_duplicate_is_noop() {
        let mut store = LexiconStore::empty();
        assert!(store.insert(LexiconCategory::Anxiety, "Hurry Up"));
        assert!(!store.insert(LexiconCategory::Anxiety, "hurry up"));
        assert!(!store.insert(LexiconCategory::Anxiety, "   "));
        assert_eq!(store.phrases(LexiconCategory::Anxiety), &["hurry up".to_string()]);
    }

    #[test]
    fn test_remove() {
        let mut store = LexiconStore::builtin();
        assert!(store.remove(LexiconCategory::Depression, "HOPELESS"));
        assert!(!store.contains(LexiconCategory::Depression, "hopeless"));
        assert!(!store.remove(LexiconCategory::Depression, "hopeless"));
    }

    #[test]
    fn test_category_from_key() {
        assert_eq!(
            LexiconCategory::from_key("comparisonTriggers"),
            Some(LexiconCategory::Comparison)
        );
        assert_eq!(
            LexiconCategory::from_key("bodyImage"),
            Some(LexiconCategory::BodyImage)
        );
        assert_eq!(
            LexiconCategory::from_key("body_image"),
            Some(LexiconCategory::BodyImage)
        );
        assert_eq!(
            LexiconCategory::from_key("ostentationPatterns"),
            Some(LexiconCategory::Ostentation)
        );
        assert_eq!(LexiconCategory::from_key("perfectionismTriggers"), None);
    }

    #[test]
    fn test_serde_normalizes_entries() {
        let json = r#"{"comparisonTriggers": ["Foo", "foo", "bar"], "toxicEmojis": ["🔥"]}"#;
        let store: LexiconStore = serde_json::from_str(json).unwrap();
        assert_eq!(
            store.phrases(LexiconCategory::Comparison),
            &["foo".to_string(), "bar".to_string()]
        );
        assert_eq!(store.category_count(), LexiconCategory::ALL.len());
        assert!(store.phrases(LexiconCategory::Anxiety).is_empty());

        let back = serde_json::to_value(&store).unwrap();
        assert_eq!(back["comparisonTriggers"][1], "bar");
    }

    #[test]
    fn test_density_phrases_exclude_ostentation_and_symbols() {
        let store = LexiconStore::builtin();
        let phrases: Vec<&str> = store.density_phrases().collect();
        assert!(phrases.contains(&"blessed"));
        assert!(!phrases.contains(&"olhem meu"));
        assert!(!phrases.contains(&"#blessed"));
    }
}
