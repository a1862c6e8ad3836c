//! Canonical team identities.
//!
//! Season team names carry sponsors and engine suppliers
//! ("Red Bull Racing Renault", "Scuderia Toro Rosso Honda"). Trend tables
//! need one identity per team lineage, so names are mapped through an
//! ordered rule table where the first matching rule wins. New sponsor eras
//! are added as rule data, in a new revision, without touching matching.

use serde::{Deserialize, Serialize};

/// Which part of a team name a rule inspects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamMatcher {
    /// Whole name equals
    Exact(String),
    /// Name has exactly this many space-separated tokens
    TokenCount(usize),
    /// Name has at least this many tokens
    TokenCountAtLeast(usize),
    /// Name has exactly `token_count` tokens and starts with `token`
    Leading { token: String, token_count: usize },
    /// Name contains the substring
    Contains(String),
}

/// What a matching rule returns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamAction {
    Keep,
    FirstTokens(usize),
    Rename(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRule {
    pub matcher: TeamMatcher,
    pub action: TeamAction,
}

impl TeamRule {
    pub fn new(matcher: TeamMatcher, action: TeamAction) -> Self {
        Self { matcher, action }
    }

    fn rename(matcher: TeamMatcher, canonical: &str) -> Self {
        Self::new(matcher, TeamAction::Rename(canonical.to_string()))
    }

    fn matches(&self, name: &str, tokens: &[&str]) -> bool {
        match &self.matcher {
            TeamMatcher::Exact(exact) => name == exact,
            TeamMatcher::TokenCount(n) => tokens.len() == *n,
            TeamMatcher::TokenCountAtLeast(n) => tokens.len() >= *n,
            TeamMatcher::Leading { token, token_count } => {
                tokens.len() == *token_count && tokens.first() == Some(&token.as_str())
            }
            TeamMatcher::Contains(part) => name.contains(part.as_str()),
        }
    }

    fn apply(&self, name: &str, tokens: &[&str]) -> String {
        match &self.action {
            TeamAction::Keep => name.to_string(),
            TeamAction::FirstTokens(n) => tokens[..(*n).min(tokens.len())].join(" "),
            TeamAction::Rename(canonical) => canonical.clone(),
        }
    }
}

pub const TORO_ROSSO: &str = "Toro Rosso";
pub const FORCE_INDIA_RP: &str = "Force India/RP";
pub const SAUBER_ALFA: &str = "Sauber/Alfa";

/// Ordered, versioned team-name rule table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamNameRules {
    pub revision: u32,
    pub rules: Vec<TeamRule>,
}

impl Default for TeamNameRules {
    fn default() -> Self {
        Self::latest()
    }
}

impl TeamNameRules {
    /// Revision 1: the token heuristics used for the 1990s-2010s archive
    pub fn v1() -> Self {
        use TeamMatcher::*;

        let lead = |token: &str| Leading {
            token: token.to_string(),
            token_count: 2,
        };
        let exact = |name: &str| Exact(name.to_string());
        let contains = |part: &str| Contains(part.to_string());

        let rules = vec![
            TeamRule::new(TokenCount(1), TeamAction::Keep),
            TeamRule::rename(lead("AlphaTauri"), TORO_ROSSO),
            TeamRule::rename(lead("Toro"), TORO_ROSSO),
            TeamRule::rename(lead("Sauber"), SAUBER_ALFA),
            TeamRule::new(TokenCount(2), TeamAction::FirstTokens(1)),
            TeamRule::rename(exact("Alfa Romeo Racing Ferrari"), SAUBER_ALFA),
            TeamRule::rename(exact("Scuderia Toro Rosso Honda"), TORO_ROSSO),
            TeamRule::rename(exact("Force India Mercedes"), FORCE_INDIA_RP),
            TeamRule::rename(exact("Force India Sahara"), FORCE_INDIA_RP),
            TeamRule::rename(exact("Racing Point BWT Mercedes"), FORCE_INDIA_RP),
            TeamRule::new(TokenCountAtLeast(3), TeamAction::FirstTokens(2)),
            TeamRule::rename(contains("Toro Rosso"), TORO_ROSSO),
            TeamRule::rename(contains("AlphaTauri"), TORO_ROSSO),
            TeamRule::rename(contains("Force India"), FORCE_INDIA_RP),
            TeamRule::rename(contains("Racing Point"), FORCE_INDIA_RP),
            TeamRule::rename(contains("Sauber"), SAUBER_ALFA),
            TeamRule::rename(contains("Alfa"), SAUBER_ALFA),
        ];

        Self { revision: 1, rules }
    }

    /// Revision 2: revision 1 plus sponsor names from 2021 onward
    pub fn v2() -> Self {
        let modern = [
            ("Alfa Romeo Ferrari", SAUBER_ALFA),
            ("Kick Sauber Ferrari", SAUBER_ALFA),
            ("RB Honda RBPT", TORO_ROSSO),
            ("AlphaTauri Honda RBPT", TORO_ROSSO),
            ("Aston Martin Aramco Mercedes", FORCE_INDIA_RP),
            ("Aston Martin Mercedes", FORCE_INDIA_RP),
        ];

        let mut rules: Vec<TeamRule> = modern
            .iter()
            .map(|(name, canonical)| {
                TeamRule::rename(TeamMatcher::Exact(name.to_string()), canonical)
            })
            .collect();
        rules.extend(Self::v1().rules);

        Self { revision: 2, rules }
    }

    pub fn latest() -> Self {
        Self::v2()
    }

    /// Canonical identity for a season team name
    pub fn canonical(&self, team: &str) -> String {
        let name = team.trim();
        let tokens: Vec<&str> = name.split(' ').collect();
        self.rules
            .iter()
            .find(|rule| rule.matches(name, &tokens))
            .map(|rule| rule.apply(name, &tokens))
            .unwrap_or_else(|| name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_token_heuristics() {
        let rules = TeamNameRules::v1();
        assert_eq!(rules.canonical("Ferrari"), "Ferrari");
        assert_eq!(rules.canonical("Williams Renault"), "Williams");
        assert_eq!(rules.canonical("Red Bull Racing Renault"), "Red Bull");
        assert_eq!(rules.canonical("McLaren Mercedes"), "McLaren");
    }

    #[test]
    fn test_v1_lineage_chains() {
        let rules = TeamNameRules::v1();
        assert_eq!(rules.canonical("Toro Rosso"), TORO_ROSSO);
        assert_eq!(rules.canonical("AlphaTauri Honda"), TORO_ROSSO);
        assert_eq!(rules.canonical("Scuderia Toro Rosso Honda"), TORO_ROSSO);
        assert_eq!(rules.canonical("Sauber Petronas"), SAUBER_ALFA);
        assert_eq!(rules.canonical("Alfa Romeo Racing Ferrari"), SAUBER_ALFA);
        assert_eq!(rules.canonical("Force India Mercedes"), FORCE_INDIA_RP);
        assert_eq!(rules.canonical("Force India Sahara"), FORCE_INDIA_RP);
        assert_eq!(rules.canonical("Racing Point BWT Mercedes"), FORCE_INDIA_RP);
    }

    #[test]
    fn test_v1_keeps_unlisted_long_names_by_prefix() {
        // Not in the exception list, so the generic three-token rule applies
        let rules = TeamNameRules::v1();
        assert_eq!(rules.canonical("Force India Ferrari"), "Force India");
        assert_eq!(rules.canonical("Alfa Romeo Ferrari"), "Alfa Romeo");
    }

    #[test]
    fn test_v2_adds_modern_names_without_changing_v1_results() {
        let rules = TeamNameRules::latest();
        assert_eq!(rules.revision, 2);
        assert_eq!(rules.canonical("Alfa Romeo Ferrari"), SAUBER_ALFA);
        assert_eq!(rules.canonical("Kick Sauber Ferrari"), SAUBER_ALFA);
        assert_eq!(rules.canonical("RB Honda RBPT"), TORO_ROSSO);
        assert_eq!(rules.canonical("Aston Martin Aramco Mercedes"), FORCE_INDIA_RP);

        let v1 = TeamNameRules::v1();
        for name in ["Williams Renault", "Red Bull Racing Renault", "Toro Rosso", "Ferrari"] {
            assert_eq!(rules.canonical(name), v1.canonical(name));
        }
    }

    #[test]
    fn test_rules_extend_as_data() {
        let mut rules = TeamNameRules::v1();
        rules.rules.insert(
            0,
            TeamRule::new(
                TeamMatcher::Contains("Brawn".to_string()),
                TeamAction::Rename("Mercedes".to_string()),
            ),
        );
        assert_eq!(rules.canonical("Brawn GP Mercedes"), "Mercedes");
    }
}
