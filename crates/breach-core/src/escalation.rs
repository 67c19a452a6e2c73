//! Root escalation: solve a challenge to earn a one-time root password,
//! then trade the password for a root shell.
//!
//! `attempts` counts answers against the current challenge and resets
//! whenever the challenge is replaced or cleared. A solved challenge is
//! discarded. `is_root` stays set until `exit_root`.

use crate::challenge::{verify, Challenge, ChallengeRegistry, ChallengeType};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Failed attempts after which the hint is shown.
pub const HINT_AFTER: u32 = 2;
/// Failed attempts after which the explanation is shown.
pub const EXPLANATION_AFTER: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SolveOutcome {
    NoChallenge,
    Solved {
        password: String,
        attempts: u32,
    },
    Incorrect {
        attempts: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_challenge: Option<Challenge>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_password: Option<String>,
    #[serde(default)]
    pub is_root: bool,
}

impl EscalationState {
    /// Replace the current challenge. `kind = None` picks a random type.
    pub fn generate_new_challenge(
        &mut self,
        registry: &ChallengeRegistry,
        kind: Option<ChallengeType>,
        rng: &mut dyn RngCore,
    ) -> Option<&Challenge> {
        self.current_challenge = match kind {
            Some(k) => registry.generate_by_type(k, rng),
            None => registry.generate_random(rng),
        };
        self.attempts = 0;
        self.current_challenge.as_ref()
    }

    pub fn clear_challenge(&mut self) {
        self.current_challenge = None;
        self.attempts = 0;
    }

    pub fn solve_challenge(&mut self, answer: &str, now: DateTime<Utc>) -> SolveOutcome {
        let Some(challenge) = self.current_challenge.take() else {
            return SolveOutcome::NoChallenge;
        };
        self.attempts += 1;
        let attempts = self.attempts;

        if verify(&challenge, answer) {
            let password = derive_root_password(&challenge.answer, now);
            self.root_password = Some(password.clone());
            self.clear_challenge();
            tracing::info!(attempts, "challenge solved");
            return SolveOutcome::Solved { password, attempts };
        }

        let outcome = SolveOutcome::Incorrect {
            attempts,
            hint: (attempts >= HINT_AFTER).then(|| challenge.hint.clone()),
            explanation: (attempts >= EXPLANATION_AFTER).then(|| challenge.explanation.clone()),
        };
        self.current_challenge = Some(challenge);
        outcome
    }

    /// Trade the one-time password for root. The password is consumed on
    /// success.
    pub fn become_root(&mut self, password: &str) -> bool {
        if self.is_root {
            return true;
        }
        match &self.root_password {
            Some(expected) if expected == password.trim() => {
                self.root_password = None;
                self.is_root = true;
                true
            }
            _ => false,
        }
    }

    /// Returns true if the player was root.
    pub fn exit_root(&mut self) -> bool {
        std::mem::replace(&mut self.is_root, false)
    }
}

/// Answer folded to lowercase alphanumerics plus a suffix from the clock.
pub fn derive_root_password(answer: &str, now: DateTime<Utc>) -> String {
    let stem: String = answer
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let stem = if stem.is_empty() { "root".to_string() } else { stem };
    let suffix = now.timestamp_millis().rem_euclid(0x10000);
    format!("{stem}-{suffix:04x}")
}
