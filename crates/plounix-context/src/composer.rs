// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt composition.
//!
//! [`PromptComposer::compose`] is a pure function of its inputs. Sections
//! appear in a fixed order and empty sections are omitted entirely.

use std::fmt::Write;

use plounix_core::types::ChatRole;
use plounix_memory::ScoredFact;

use crate::profile::ProfileSnapshot;
use crate::session::SessionTurn;

const INSTRUCTIONS: &[&str] = &[
    "Use the user's name naturally when you know it.",
    "For questions about what the user just said, rely on the recent conversation.",
    "For questions about earlier conversations, rely on what you remember about the user.",
    "Never invent facts about the user that are not listed above.",
];

/// Formats retrieved memory, session history and the financial profile
/// into the single prompt sent to the oracle.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    assistant_name: String,
    max_turn_chars: usize,
}

impl PromptComposer {
    pub fn new(assistant_name: impl Into<String>, max_turn_chars: usize) -> Self {
        Self {
            assistant_name: assistant_name.into(),
            max_turn_chars,
        }
    }

    pub fn compose(
        &self,
        user_id: &str,
        message: &str,
        facts: &[ScoredFact],
        session: &[SessionTurn],
        profile: Option<&ProfileSnapshot>,
    ) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "You are {}, a friendly personal finance assistant for young Filipinos.",
            self.assistant_name
        );

        out.push_str("\n## User\n");
        let name = profile.and_then(|p| p.display_name.as_deref());
        let email = profile.and_then(|p| p.email.as_deref());
        match (name, email) {
            (Some(name), Some(email)) => {
                let _ = writeln!(out, "Name: {name}\nEmail: {email}");
            }
            (Some(name), None) => {
                let _ = writeln!(out, "Name: {name}");
            }
            (None, Some(email)) => {
                let _ = writeln!(out, "Email: {email}");
            }
            (None, None) => out.push_str("anonymous\n"),
        }
        let _ = writeln!(out, "User id: {user_id}");

        if !facts.is_empty() {
            out.push_str("\n## What you remember about this user\n");
            for scored in facts {
                let _ = writeln!(out, "- [{}] {}", scored.fact.memory_type, scored.fact.value);
            }
        }

        if !session.is_empty() {
            out.push_str("\n## Recent conversation\n");
            for turn in session {
                let speaker = match turn.role {
                    ChatRole::User => "User",
                    ChatRole::Assistant => self.assistant_name.as_str(),
                };
                let _ = writeln!(out, "{speaker}: {}", self.clip(&turn.content));
            }
        }

        if let Some(profile) = profile.filter(|p| p.has_profile_details()) {
            out.push_str("\n## Financial profile\n");
            render_profile(&mut out, profile);
        }

        out.push_str("\n## Current message\n");
        out.push_str(message.trim());
        out.push('\n');

        out.push_str("\n## Instructions\n");
        for line in INSTRUCTIONS {
            let _ = writeln!(out, "- {line}");
        }
        out
    }

    fn clip(&self, content: &str) -> String {
        let content = content.trim();
        match content.char_indices().nth(self.max_turn_chars) {
            Some((idx, _)) => format!("{}...", &content[..idx]),
            None => content.to_string(),
        }
    }
}

fn render_profile(out: &mut String, profile: &ProfileSnapshot) {
    if let Some(persona) = &profile.persona {
        let _ = writeln!(out, "Persona: {persona}");
    }
    if let Some(income) = profile.monthly_income {
        let _ = writeln!(out, "Monthly income: {}", format_peso(income));
    }
    if let Some(language) = &profile.preferred_language {
        let _ = writeln!(out, "Preferred language: {language}");
    }
    if let Some(style) = &profile.communication_style {
        let _ = writeln!(out, "Communication style: {style}");
    }
    if profile.transaction_count > 0 {
        let _ = writeln!(
            out,
            "Last {} transactions: income {}, expenses {}",
            profile.transaction_count,
            format_peso(profile.income_total),
            format_peso(profile.expense_total)
        );
        if !profile.top_spending.is_empty() {
            let categories: Vec<String> = profile
                .top_spending
                .iter()
                .map(|(category, amount)| format!("{category} {}", format_peso(*amount)))
                .collect();
            let _ = writeln!(out, "Top spending: {}", categories.join(", "));
        }
    }
    if !profile.active_goals.is_empty() {
        out.push_str("Active goals:\n");
        for goal in &profile.active_goals {
            let _ = writeln!(
                out,
                "- {}: {} of {}",
                goal.title,
                format_peso(goal.current_amount),
                format_peso(goal.target_amount)
            );
        }
    }
    if !profile.active_challenges.is_empty() {
        out.push_str("Active challenges:\n");
        for challenge in &profile.active_challenges {
            let _ = writeln!(out, "- {} ({}%)", challenge.title, challenge.progress);
        }
    }
}

/// Peso amount with thousands separators, e.g. `₱18,000` or `₱1,234.50`.
pub fn format_peso(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let (whole, frac) = (cents / 100, cents % 100);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    if frac == 0 {
        format!("{sign}₱{grouped}")
    } else {
        format!("{sign}₱{grouped}.{frac:02}")
    }
}
