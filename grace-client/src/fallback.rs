//! Local canned replies used when the relay cannot answer.
//!
//! Classification is a case-insensitive substring match checked in a fixed
//! precedence order, so the same text always lands in the same category.
//! None of the replies quote a dollar figure or promise claim approval.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackCategory {
    Storm,
    Insurance,
    Cost,
    Scheduling,
    Quote,
    Services,
    General,
}

/// Precedence order matters: "storm damage claim" is a storm question.
const RULES: &[(FallbackCategory, &[&str])] = &[
    (FallbackCategory::Storm, &["storm", "damage"]),
    (FallbackCategory::Insurance, &["insurance", "claim"]),
    (FallbackCategory::Cost, &["pay", "cost", "price", "deductible"]),
    (
        FallbackCategory::Scheduling,
        &["schedule", "inspection", "appointment"],
    ),
    (FallbackCategory::Quote, &["quote", "estimate"]),
    (FallbackCategory::Services, &["service", "offer", "do you do"]),
];

impl FallbackCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackCategory::Storm => "storm",
            FallbackCategory::Insurance => "insurance",
            FallbackCategory::Cost => "cost",
            FallbackCategory::Scheduling => "scheduling",
            FallbackCategory::Quote => "quote",
            FallbackCategory::Services => "services",
            FallbackCategory::General => "general",
        }
    }
}

impl fmt::Display for FallbackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the category for a user message.
pub fn classify(text: &str) -> FallbackCategory {
    let lower = text.to_lowercase();
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(FallbackCategory::General)
}

pub fn canned_reply(category: FallbackCategory) -> &'static str {
    match category {
        FallbackCategory::Storm => {
            "If you've noticed damage after a storm, the first step is to call us for a free inspection. \
             We'll document everything and help you understand if you have a valid insurance claim. \
             Call 855-424-5911 or schedule online!"
        }
        FallbackCategory::Insurance => {
            "Great question! The insurance claims process starts with a free inspection. \
             We document all damage, help you file your claim, meet with the adjuster on your behalf, \
             and then handle all repairs. Most homeowners only pay their deductible."
        }
        FallbackCategory::Cost => {
            "Most of our customers only pay their insurance deductible for covered storm damage repairs. \
             We work directly with your insurance company so there are no surprise costs. \
             Want us to take a look? It's completely free!"
        }
        FallbackCategory::Scheduling => {
            "I'd love to help you schedule a free inspection! You can call us directly at 855-424-5911, \
             or visit our contact page to fill out a form. We typically respond within 24 hours."
        }
        FallbackCategory::Quote => {
            "I'd be happy to help you get a quote! For the most accurate estimate, I recommend scheduling \
             a free inspection. You can call us at 855-424-5911 or fill out the form on our contact page."
        }
        FallbackCategory::Services => {
            "Guardian offers comprehensive exterior services: roof replacement and repairs, vinyl and \
             fiber cement siding, gutters and downspouts, and storm damage restoration. We're certified \
             by GAF and CertainTeed, and we specialize in helping homeowners navigate insurance claims."
        }
        FallbackCategory::General => {
            "I'd be happy to help! I can answer questions about storm damage, insurance claims, our \
             services, or help you schedule a free inspection. What would you like to know?"
        }
    }
}

/// Classify `text` and return its category with the canned reply.
pub fn reply_for(text: &str) -> (FallbackCategory, &'static str) {
    let category = classify(text);
    (category, canned_reply(category))
}
