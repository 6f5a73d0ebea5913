//! Industry-specific response guidelines.

use std::collections::HashMap;

pub const GENERAL: &str = "general";

const BUILTIN: &[(&str, &str)] = &[
    (
        GENERAL,
        "Be clear and courteous. Keep answers short, and ask a clarifying question \
         when the request is ambiguous.",
    ),
    (
        "ecommerce",
        "Reference order numbers, shipping times and return windows precisely. Never \
         promise refunds or delivery dates the knowledge does not state.",
    ),
    (
        "healthcare",
        "Do not diagnose or give medical advice. For symptoms or emergencies, direct \
         the person to a qualified professional or emergency services.",
    ),
    (
        "finance",
        "Do not give personalised investment, tax or legal advice. Never ask for full \
         card numbers, passwords or PINs.",
    ),
    (
        "saas",
        "Give step-by-step instructions where possible and mention the plan a feature \
         belongs to when the knowledge says so.",
    ),
    (
        "real_estate",
        "Quote prices, availability and viewing times only from the knowledge. Offer to \
         arrange a viewing with an agent.",
    ),
    (
        "hospitality",
        "Be warm and welcoming. Confirm dates, party size and special requests before \
         suggesting a booking.",
    ),
];

/// Guideline text by industry key, with a `general` fallback.
#[derive(Debug, Clone)]
pub struct IndustryGuidelines {
    entries: HashMap<String, String>,
}

impl IndustryGuidelines {
    /// Built-in guidelines, with `overrides` replacing or extending them.
    pub fn new(overrides: HashMap<String, String>) -> Self {
        let mut entries: HashMap<String, String> = BUILTIN
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        entries.extend(overrides.into_iter().map(|(k, v)| (k.to_lowercase(), v)));
        Self { entries }
    }

    pub fn lookup(&self, industry: &str) -> &str {
        self.entries
            .get(&industry.to_lowercase())
            .or_else(|| self.entries.get(GENERAL))
            .map(String::as_str)
            .unwrap_or_default()
    }
}

impl Default for IndustryGuidelines {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}
