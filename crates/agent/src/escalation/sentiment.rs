//! Lexicon sentiment scorer.
//!
//! Averages the weights of known sentiment words, with simple negation
//! ("not helpful") and intensifiers ("very angry"). Output is in [-1, 1].

const LEXICON: &[(&str, f32)] = &[
    // negative
    ("angry", -1.0),
    ("furious", -1.0),
    ("terrible", -1.0),
    ("awful", -1.0),
    ("horrible", -1.0),
    ("worst", -1.0),
    ("hate", -1.0),
    ("unacceptable", -1.0),
    ("scam", -1.0),
    ("useless", -0.8),
    ("ridiculous", -0.8),
    ("pathetic", -0.8),
    ("sucks", -0.8),
    ("frustrated", -0.7),
    ("frustrating", -0.7),
    ("waste", -0.7),
    ("disappointed", -0.6),
    ("annoyed", -0.6),
    ("upset", -0.6),
    ("bad", -0.5),
    ("poor", -0.5),
    ("slow", -0.3),
    ("broken", -0.4),
    // positive
    ("excellent", 0.9),
    ("amazing", 0.8),
    ("awesome", 0.8),
    ("love", 0.8),
    ("perfect", 0.8),
    ("great", 0.7),
    ("helpful", 0.6),
    ("happy", 0.6),
    ("appreciate", 0.6),
    ("thanks", 0.5),
    ("thank", 0.5),
    ("good", 0.4),
    ("fine", 0.2),
];

const NEGATORS: &[&str] = &["not", "no", "never", "don't", "isn't", "wasn't", "aren't", "didn't"];
const INTENSIFIERS: &[&str] = &["very", "so", "really", "extremely", "totally", "absolutely"];

/// Sentiment of `text` in [-1, 1]; 0 when no sentiment word is present.
pub fn score(text: &str) -> f32 {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .collect();

    let mut total = 0.0f32;
    let mut hits = 0usize;

    for (i, token) in tokens.iter().enumerate() {
        let Some(weight) = LEXICON.iter().find(|(w, _)| w == token).map(|(_, v)| *v) else {
            continue;
        };

        let window = &tokens[i.saturating_sub(2)..i];
        let mut value = weight;
        if window.iter().any(|t| INTENSIFIERS.contains(t)) {
            value *= 1.5;
        }
        if window.iter().any(|t| NEGATORS.contains(t)) {
            value = -value * 0.5;
        }

        total += value;
        hits += 1;
    }

    if hits == 0 {
        return 0.0;
    }
    (total / hits as f32).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_text_scores_zero() {
        assert_eq!(score("Where is my parcel?"), 0.0);
        assert_eq!(score(""), 0.0);
    }

    #[test]
    fn strongly_negative_text() {
        assert!(score("This is terrible, I'm furious!") < -0.5);
        assert!(score("I am very frustrated") < -0.5);
    }

    #[test]
    fn positive_text() {
        assert!(score("Thanks, that was really helpful") > 0.5);
    }

    #[test]
    fn negation_softens_and_flips() {
        let plain = score("helpful");
        let negated = score("not helpful");
        assert!(plain > 0.0);
        assert!(negated < 0.0);
        assert!(negated > -0.5);
    }

    #[test]
    fn output_is_bounded() {
        let s = score("extremely terrible absolutely horrible so awful");
        assert!((-1.0..=1.0).contains(&s));
    }
}
