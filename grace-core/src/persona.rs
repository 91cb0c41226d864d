//! Persona configuration for the assistant.
//!
//! A `PersonaConfig` is loaded once at start-up (from the `[persona]` table or the
//! built-in Guardian defaults) and rendered into the system prompt exactly once.
//! Nothing mutates it afterwards.

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PersonaConfig {
    pub assistant_name: String,
    pub company: String,
    pub title: String,
    pub mission: String,
    pub personality: String,
    pub facts: BusinessFacts,
    pub emphasis: Vec<String>,
    pub goals: Vec<String>,
    pub style: ResponseStyle,
    /// Verbatim prompt that replaces the rendered one when set.
    pub system_prompt: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BusinessFacts {
    pub founder: String,
    pub headquarters: String,
    pub phone: String,
    pub licensed_states: Vec<String>,
    pub services: Vec<String>,
    pub certifications: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ResponseStyle {
    pub length_guidance: String,
    /// Forwarded to the provider as its reply token cap.
    pub max_reply_tokens: u32,
    pub prohibited: Vec<String>,
    pub always: Vec<String>,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            assistant_name: "Grace".to_string(),
            company: "Guardian Roofing & Siding".to_string(),
            title: "AI Insurance Claims Specialist".to_string(),
            mission: "You help homeowners understand the storm damage insurance claims process."
                .to_string(),
            personality: "Warm, knowledgeable, reassuring, patient. Professional but friendly, never condescending."
                .to_string(),
            facts: BusinessFacts::default(),
            emphasis: vec![
                "FREE inspections, no obligation".to_string(),
                "Guardian meets with insurance adjusters on homeowners' behalf".to_string(),
                "Most customers pay only their deductible (little to nothing out of pocket)"
                    .to_string(),
                "Over 100 years combined team experience".to_string(),
            ],
            goals: vec![
                "Educate homeowners about the claims process".to_string(),
                "Reassure them that Guardian handles everything".to_string(),
                "Qualify if they may have a valid claim".to_string(),
                "Encourage them to schedule a free inspection".to_string(),
            ],
            style: ResponseStyle::default(),
            system_prompt: None,
        }
    }
}

impl Default for BusinessFacts {
    fn default() -> Self {
        Self {
            founder: "Family-owned company founded by Bobby Frehafer, based on Christian values"
                .to_string(),
            headquarters: "610 Lakeside Dr, Southampton, PA 18966".to_string(),
            phone: "855-424-5911".to_string(),
            licensed_states: ["PA", "NJ", "DE", "MD", "VA", "NY"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            services: ["Roofing", "Siding", "Gutters", "Storm Damage Repair"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            certifications: [
                "BBB A+ Rating",
                "GAF Certified",
                "CertainTeed Master Shingle Applicator",
                "Atlas Pro+ Diamond Level",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Default for ResponseStyle {
    fn default() -> Self {
        Self {
            length_guidance:
                "Keep responses concise (2-4 sentences) unless they ask for detailed explanations."
                    .to_string(),
            max_reply_tokens: 500,
            prohibited: vec![
                "Never provide specific dollar estimates or guarantee claim approval.".to_string(),
            ],
            always: vec![
                "Always recommend scheduling a free inspection for personalized assessment."
                    .to_string(),
            ],
        }
    }
}

impl PersonaConfig {
    /// Render the system prompt sent ahead of every transcript.
    pub fn render_system_prompt(&self) -> String {
        if let Some(prompt) = self.system_prompt.as_deref().filter(|p| !p.trim().is_empty()) {
            return prompt.to_string();
        }

        let facts = &self.facts;
        let mut out = format!(
            "You are {}, {}'s {}. {}\n\nYour personality: {}\n\nKey information about {}:\n",
            self.assistant_name,
            self.company,
            self.title,
            self.mission,
            self.personality,
            short_name(&self.company),
        );

        push_bullet(&mut out, &facts.founder);
        push_bullet(&mut out, &format!("Headquarters: {}", facts.headquarters));
        push_bullet(&mut out, &format!("Phone: {}", facts.phone));
        push_bullet(
            &mut out,
            &format!("Licensed in {}", facts.licensed_states.join(", ")),
        );
        push_bullet(&mut out, &format!("Services: {}", facts.services.join(", ")));
        push_bullet(
            &mut out,
            &format!("Certifications: {}", facts.certifications.join(", ")),
        );

        if !self.emphasis.is_empty() {
            out.push_str("\nKey points to emphasize:\n");
            for point in &self.emphasis {
                push_bullet(&mut out, point);
            }
        }

        if !self.goals.is_empty() {
            out.push_str("\nYour goals:\n");
            for (i, goal) in self.goals.iter().enumerate() {
                out.push_str(&format!("{}. {}\n", i + 1, goal));
            }
        }

        out.push('\n');
        for line in self.style.prohibited.iter().chain(self.style.always.iter()) {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&self.style.length_guidance);

        out
    }
}

fn push_bullet(out: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    out.push_str("- ");
    out.push_str(text);
    out.push('\n');
}

/// "Guardian Roofing & Siding" -> "Guardian"
fn short_name(company: &str) -> &str {
    company.split_whitespace().next().unwrap_or(company)
}
