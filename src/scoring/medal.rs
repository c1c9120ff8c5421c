//! Medal tiers derived from a score, with manual overrides.

use std::fmt;

use crate::scoring::team::{AUTO_MEDAL, is_absent};

const GOLD_THRESHOLD: f64 = 80.0;
const SILVER_THRESHOLD: f64 = 70.0;
const BRONZE_THRESHOLD: f64 = 60.0;

/// Label reported for teams carrying the absence sentinel.
pub const DID_NOT_PARTICIPATE: &str = "did not participate";

/// Medal displayed for a team result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
    Participant,
    /// Score is the absence sentinel; replaces both medal and rank.
    DidNotParticipate,
    /// Operator-entered medal, reported verbatim.
    Manual(String),
    /// No usable score yet.
    NotScored,
}

impl Medal {
    pub fn label(&self) -> &str {
        match self {
            Medal::Gold => "Gold",
            Medal::Silver => "Silver",
            Medal::Bronze => "Bronze",
            Medal::Participant => "Participant",
            Medal::DidNotParticipate => DID_NOT_PARTICIPATE,
            Medal::Manual(label) => label,
            Medal::NotScored => "",
        }
    }
}

impl fmt::Display for Medal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether `medal` overrides the computed tier.
pub fn is_manual(medal: &str) -> bool {
    let medal = medal.trim();
    !medal.is_empty() && !medal.eq_ignore_ascii_case(AUTO_MEDAL)
}

/// Classify a score, `None` standing for an empty or non-numeric value.
pub fn classify(score: Option<f64>, manual_medal: &str) -> Medal {
    if score.is_some_and(is_absent) {
        return Medal::DidNotParticipate;
    }

    if is_manual(manual_medal) {
        return Medal::Manual(manual_medal.trim().to_string());
    }

    match score {
        Some(score) if score >= GOLD_THRESHOLD => Medal::Gold,
        Some(score) if score >= SILVER_THRESHOLD => Medal::Silver,
        Some(score) if score >= BRONZE_THRESHOLD => Medal::Bronze,
        Some(score) if score > 0.0 => Medal::Participant,
        _ => Medal::NotScored,
    }
}

/// Classify raw score text as typed by an operator.
pub fn classify_str(score: &str, manual_medal: &str) -> Medal {
    let score = score
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite());
    classify(score, manual_medal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_split_tiers() {
        assert_eq!(classify(Some(100.0), ""), Medal::Gold);
        assert_eq!(classify(Some(80.0), ""), Medal::Gold);
        assert_eq!(classify(Some(79.99), ""), Medal::Silver);
        assert_eq!(classify(Some(70.0), ""), Medal::Silver);
        assert_eq!(classify(Some(69.5), ""), Medal::Bronze);
        assert_eq!(classify(Some(60.0), ""), Medal::Bronze);
        assert_eq!(classify(Some(59.9), ""), Medal::Participant);
        assert_eq!(classify(Some(0.5), ""), Medal::Participant);
    }

    #[test]
    fn tiers_agree_with_ranges_across_the_domain() {
        for tenth in 1..=1000 {
            let score = f64::from(tenth) / 10.0;
            let medal = classify(Some(score), "");
            let expected = if score >= 80.0 {
                Medal::Gold
            } else if score >= 70.0 {
                Medal::Silver
            } else if score >= 60.0 {
                Medal::Bronze
            } else {
                Medal::Participant
            };
            assert_eq!(medal, expected, "score {score}");
        }
    }

    #[test]
    fn absence_wins_over_manual_medal() {
        assert_eq!(classify(Some(-1.0), ""), Medal::DidNotParticipate);
        assert_eq!(classify(Some(-1.0), "Gold"), Medal::DidNotParticipate);
        assert_eq!(classify_str("-1", "Special"), Medal::DidNotParticipate);
        assert_eq!(Medal::DidNotParticipate.label(), "did not participate");
    }

    #[test]
    fn manual_medal_wins_over_score() {
        assert_eq!(
            classify(Some(45.0), "Gold"),
            Medal::Manual("Gold".to_string())
        );
        assert_eq!(
            classify(None, "Honourable mention"),
            Medal::Manual("Honourable mention".to_string())
        );
    }

    #[test]
    fn auto_marker_falls_back_to_thresholds() {
        assert_eq!(classify(Some(85.0), "auto"), Medal::Gold);
        assert_eq!(classify(Some(85.0), "AUTO"), Medal::Gold);
        assert_eq!(classify(Some(65.0), "  "), Medal::Bronze);
    }

    #[test]
    fn missing_scores_are_not_scored() {
        assert_eq!(classify(None, ""), Medal::NotScored);
        assert_eq!(classify(Some(0.0), ""), Medal::NotScored);
        assert_eq!(classify_str("", ""), Medal::NotScored);
        assert_eq!(classify_str("abc", ""), Medal::NotScored);
        assert_eq!(classify_str(" 72 ", "").label(), "Silver");
        assert_eq!(Medal::NotScored.label(), "");
    }
}
