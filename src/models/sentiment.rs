use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Overall sentiment of a piece of feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Words the model uses in place of the three canonical labels.
const SENTIMENT_SYNONYMS: &[(&str, Sentiment)] = &[
    ("positive", Sentiment::Positive),
    ("praise", Sentiment::Positive),
    ("good", Sentiment::Positive),
    ("great", Sentiment::Positive),
    ("excellent", Sentiment::Positive),
    ("happy", Sentiment::Positive),
    ("negative", Sentiment::Negative),
    ("bad", Sentiment::Negative),
    ("issue", Sentiment::Negative),
    ("problem", Sentiment::Negative),
    ("bug", Sentiment::Negative),
    ("complaint", Sentiment::Negative),
    ("poor", Sentiment::Negative),
    ("neutral", Sentiment::Neutral),
];

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Self::Positive, Self::Negative, Self::Neutral];

    /// Maps free-form model output onto a sentiment.
    ///
    /// Matching ignores case and surrounding whitespace. Anything unrecognised
    /// is `Neutral`, so this never fails.
    ///
    /// ```
    /// use feda::Sentiment;
    ///
    /// assert_eq!(Sentiment::normalize("Great"), Sentiment::Positive);
    /// assert_eq!(Sentiment::normalize("BUG"), Sentiment::Negative);
    /// assert_eq!(Sentiment::normalize("meh"), Sentiment::Neutral);
    /// ```
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        SENTIMENT_SYNONYMS
            .iter()
            .find(|(word, _)| *word == lowered)
            .map(|(_, sentiment)| *sentiment)
            .unwrap_or(Self::Neutral)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse of a stored label. Use [`Sentiment::normalize`] for model output.
impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            "neutral" => Ok(Self::Neutral),
            other => Err(format!("unknown sentiment: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Sentiment::Positive).unwrap(), r#""positive""#);
        assert_eq!(serde_json::to_string(&Sentiment::Negative).unwrap(), r#""negative""#);
        assert_eq!(serde_json::to_string(&Sentiment::Neutral).unwrap(), r#""neutral""#);
    }

    #[test]
    fn test_sentiment_deserialization_fails_on_unknown_variant() {
        let result: Result<Sentiment, _> = serde_json::from_str(r#""ecstatic""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_maps_synonyms() {
        assert_eq!(Sentiment::normalize("praise"), Sentiment::Positive);
        assert_eq!(Sentiment::normalize("good"), Sentiment::Positive);
        assert_eq!(Sentiment::normalize(" Great "), Sentiment::Positive);
        assert_eq!(Sentiment::normalize("bad"), Sentiment::Negative);
        assert_eq!(Sentiment::normalize("Issue"), Sentiment::Negative);
        assert_eq!(Sentiment::normalize("problem"), Sentiment::Negative);
        assert_eq!(Sentiment::normalize("bug"), Sentiment::Negative);
    }

    #[test]
    fn test_normalize_falls_back_to_neutral() {
        assert_eq!(Sentiment::normalize(""), Sentiment::Neutral);
        assert_eq!(Sentiment::normalize("mixed"), Sentiment::Neutral);
        assert_eq!(Sentiment::normalize("NEUTRAL"), Sentiment::Neutral);
    }

    #[test]
    fn test_normalize_is_identity_on_canonical_labels() {
        for sentiment in Sentiment::ALL {
            assert_eq!(Sentiment::normalize(sentiment.as_str()), sentiment);
        }
    }

    #[test]
    fn test_from_str_is_strict() {
        assert_eq!("negative".parse::<Sentiment>(), Ok(Sentiment::Negative));
        assert!("Negative".parse::<Sentiment>().is_err());
        assert!("bad".parse::<Sentiment>().is_err());
    }
}
