use std::collections::HashMap;

use serde::Serialize;

/// Authored copy shown next to a gap topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Narrative {
    pub gap_detail: String,
    pub recommended_action: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NarrativeCatalog {
    entries: HashMap<String, Narrative>,
}

impl NarrativeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, topic_id: impl Into<String>, narrative: Narrative) {
        self.entries.insert(topic_id.into(), narrative);
    }

    pub fn get(&self, topic_id: &str) -> Option<&Narrative> {
        self.entries.get(topic_id)
    }

    pub fn builtin() -> Self {
        let mut catalog = Self::new();

        catalog.insert(
            "pto-time-off",
            Narrative {
                gap_detail: "Employees frequently ask about PTO accrual rates, rollover policies, \
                             and blackout dates. Many questions go unresolved or get routed to HR. \
                             Content exists but doesn't cover site-specific rules."
                    .to_string(),
                recommended_action: "Update EA knowledge base with site-specific PTO rules for \
                                     Aurora, Newark, and Irving. Current content is generic; \
                                     each site has different accrual rates and blackout periods."
                    .to_string(),
                note: None,
            },
        );
        catalog.insert(
            "benefits-insurance",
            Narrative {
                gap_detail: "Open enrollment questions spike seasonally. Current EA content covers \
                             basic plan info but can't answer questions about eligibility changes, \
                             life events, or HSA details."
                    .to_string(),
                recommended_action: "Add life event and eligibility change content. Most \
                                     unresolved questions are about mid-year changes (marriage, \
                                     new child, address change), not basic plan info."
                    .to_string(),
                note: Some("Volume estimate applies to non-enrollment periods.".to_string()),
            },
        );
        catalog.insert(
            "safety-protocols",
            Narrative {
                gap_detail: "Sharp increase tied to new OSHA requirements. EA has outdated safety \
                             content that doesn't reflect January 2026 policy updates. High volume \
                             of repeat questions about PPE requirements."
                    .to_string(),
                recommended_action: "Replace outdated safety content with January 2026 OSHA \
                                     updates. Specific gap: PPE requirements for cold storage \
                                     areas and new chemical handling procedures."
                    .to_string(),
                note: Some(
                    "Also a compliance risk: employees may be following outdated procedures."
                        .to_string(),
                ),
            },
        );
        catalog.insert(
            "attendance-points",
            Narrative {
                gap_detail: "Employees ask about their current balance, how points are calculated, \
                             and when points expire. EA cannot pull live points data and routes \
                             all questions to HR."
                    .to_string(),
                recommended_action: "Add FAQ content explaining points calculation, expiration \
                                     timelines, and threshold consequences."
                    .to_string(),
                note: Some("Live balance lookup requires integration work.".to_string()),
            },
        );

        catalog
    }
}
