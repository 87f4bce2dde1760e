//! Lexicon-based caption polarity, the sentiment backend for the feature
//! deriver. Scores land in [-1, 1]; unknown or empty text scores 0.

const LEXICON: &[(&str, f64)] = &[
    // Positive signals
    ("love", 0.5),
    ("loved", 0.5),
    ("amazing", 0.5),
    ("awesome", 0.5),
    ("best", 0.5),
    ("beautiful", 0.4),
    ("great", 0.4),
    ("excited", 0.4),
    ("happy", 0.4),
    ("perfect", 0.5),
    ("stunning", 0.4),
    ("wonderful", 0.5),
    ("good", 0.3),
    ("fun", 0.3),
    ("win", 0.4),
    ("winner", 0.4),
    ("favorite", 0.4),
    ("grateful", 0.4),
    ("blessed", 0.4),
    ("proud", 0.4),
    // Negative signals
    ("bad", -0.4),
    ("worst", -0.6),
    ("terrible", -0.6),
    ("awful", -0.6),
    ("hate", -0.5),
    ("sad", -0.4),
    ("angry", -0.4),
    ("disappointed", -0.5),
    ("boring", -0.4),
    ("fail", -0.4),
    ("failed", -0.4),
    ("broken", -0.4),
    ("ugly", -0.4),
    ("annoying", -0.4),
    ("problem", -0.3),
    ("never", -0.2),
    ("lost", -0.3),
    ("scam", -0.6),
    ("fake", -0.4),
    ("waste", -0.5),
];

/// Polarity of a caption: matching word weights summed, clamped to [-1, 1].
pub fn polarity(text: &str) -> f64 {
    let mut score = 0.0_f64;
    for word in text.split_whitespace() {
        let w = word
            .trim_matches(|c: char| !c.is_alphabetic())
            .to_lowercase();
        if w.is_empty() {
            continue;
        }
        for &(lex_word, weight) in LEXICON {
            if w == lex_word {
                score += weight;
                break;
            }
        }
    }
    score.clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_scores_zero() {
        assert_eq!(polarity(""), 0.0);
        assert_eq!(polarity("   "), 0.0);
    }

    #[test]
    fn unknown_words_score_zero() {
        assert_eq!(polarity("the quick brown fox"), 0.0);
    }

    #[test]
    fn positive_caption_scores_positive() {
        assert!(polarity("what an amazing sunset") > 0.0);
    }

    #[test]
    fn negative_caption_scores_negative() {
        assert!(polarity("worst day, so disappointed") < 0.0);
    }

    #[test]
    fn score_is_clamped() {
        let stacked = "love amazing awesome best perfect wonderful great";
        assert_eq!(polarity(stacked), 1.0);
    }

    #[test]
    fn punctuation_is_stripped() {
        assert!(polarity("Amazing!!!") > 0.0);
    }
}
