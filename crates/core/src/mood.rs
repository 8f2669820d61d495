use serde::{Deserialize, Serialize};

use crate::error::MoodError;
use crate::models::{MoodLabel, MoodResult};

pub const MOOD_QUESTIONS: [&str; 6] = [
    "How stressed do you feel today?",
    "How well did you sleep last night?",
    "How motivated are you to study?",
    "How anxious do you feel?",
    "How energetic do you feel?",
    "How satisfied are you with your progress?",
];

pub const MIN_ANSWER: u8 = 1;
pub const MAX_ANSWER: u8 = 5;
const DEFAULT_ANSWER: u8 = 3;

const DAILY_QUOTES: [&str; 3] = [
    "Believe you can and you're halfway there.",
    "The future belongs to those who believe in the beauty of their dreams.",
    "Success is not final, failure is not fatal: it is the courage to continue that counts.",
];

/// Slider values for the fixed questionnaire, one per entry of
/// [`MOOD_QUESTIONS`], each in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct MoodAnswers([u8; MOOD_QUESTIONS.len()]);

impl Default for MoodAnswers {
    fn default() -> Self {
        Self([DEFAULT_ANSWER; MOOD_QUESTIONS.len()])
    }
}

impl MoodAnswers {
    pub fn new(values: [u8; MOOD_QUESTIONS.len()]) -> Result<Self, MoodError> {
        for (index, value) in values.iter().enumerate() {
            if !(MIN_ANSWER..=MAX_ANSWER).contains(value) {
                return Err(MoodError::OutOfRange {
                    index,
                    value: *value,
                });
            }
        }
        Ok(Self(values))
    }

    pub fn from_slice(values: &[u8]) -> Result<Self, MoodError> {
        let fixed: [u8; MOOD_QUESTIONS.len()] =
            values.try_into().map_err(|_| MoodError::WrongLength {
                expected: MOOD_QUESTIONS.len(),
                actual: values.len(),
            })?;
        Self::new(fixed)
    }

    pub fn set(&mut self, index: usize, value: u8) -> Result<(), MoodError> {
        if index >= self.0.len() {
            return Err(MoodError::WrongLength {
                expected: self.0.len(),
                actual: index + 1,
            });
        }
        if !(MIN_ANSWER..=MAX_ANSWER).contains(&value) {
            return Err(MoodError::OutOfRange { index, value });
        }
        self.0[index] = value;
        Ok(())
    }

    pub fn values(&self) -> &[u8] {
        &self.0
    }

    pub fn average(&self) -> f64 {
        let sum: u32 = self.0.iter().map(|value| u32::from(*value)).sum();
        f64::from(sum) / self.0.len() as f64
    }
}

impl TryFrom<Vec<u8>> for MoodAnswers {
    type Error = MoodError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_slice(&value)
    }
}

impl From<MoodAnswers> for Vec<u8> {
    fn from(value: MoodAnswers) -> Self {
        value.0.to_vec()
    }
}

pub fn compute_mood(answers: &MoodAnswers) -> MoodResult {
    let score = answers.average();
    let label = mood_label_for(score);

    MoodResult {
        score,
        label,
        suggestions: suggestions_for(label)
            .iter()
            .map(|suggestion| suggestion.to_string())
            .collect(),
    }
}

/// Checked in order: `<= 2`, `<= 3`, `>= 4`, otherwise neutral. Only the
/// open interval `(3, 4)` reaches neutral.
pub fn mood_label_for(average: f64) -> MoodLabel {
    if average <= 2.0 {
        MoodLabel::Stressed
    } else if average <= 3.0 {
        MoodLabel::Tired
    } else if average >= 4.0 {
        MoodLabel::Motivated
    } else {
        MoodLabel::Neutral
    }
}

pub fn suggestions_for(label: MoodLabel) -> [&'static str; 4] {
    match label {
        MoodLabel::Stressed => [
            "Take a 10-minute break",
            "Try deep breathing exercises",
            "Talk to a friend or counselor",
            "Get some fresh air",
        ],
        MoodLabel::Tired => [
            "Get 7-8 hours of sleep tonight",
            "Take short power naps",
            "Stay hydrated",
            "Reduce screen time before bed",
        ],
        MoodLabel::Motivated => [
            "Great! Use this energy to tackle your goals",
            "Break down tasks into smaller steps",
            "Celebrate small wins",
            "Help others who might need support",
        ],
        MoodLabel::Neutral => [
            "Maintain a balanced routine",
            "Set achievable daily goals",
            "Stay connected with friends",
            "Practice self-care",
        ],
    }
}

/// Dashboard emoji for a stored label; unknown labels render as neutral.
pub fn mood_emoji(label: &str) -> &'static str {
    match MoodLabel::parse(label) {
        Some(MoodLabel::Stressed) => "😰",
        Some(MoodLabel::Tired) => "😴",
        Some(MoodLabel::Motivated) => "🔥",
        Some(MoodLabel::Neutral) | None => "😊",
    }
}

pub fn daily_quote(seed: usize) -> &'static str {
    DAILY_QUOTES[seed % DAILY_QUOTES.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(values: [u8; 6]) -> MoodAnswers {
        MoodAnswers::new(values).unwrap()
    }

    #[test]
    fn defaults_to_three_everywhere() {
        let defaults = MoodAnswers::default();
        assert_eq!(defaults.values(), &[3, 3, 3, 3, 3, 3]);
        assert_eq!(compute_mood(&defaults).label, MoodLabel::Tired);
    }

    #[test]
    fn boundary_averages_map_to_expected_labels() {
        assert_eq!(compute_mood(&answers([2; 6])).label, MoodLabel::Stressed);
        assert_eq!(compute_mood(&answers([1; 6])).label, MoodLabel::Stressed);
        assert_eq!(mood_label_for(2.01), MoodLabel::Tired);
        assert_eq!(compute_mood(&answers([3; 6])).label, MoodLabel::Tired);
        assert_eq!(
            compute_mood(&answers([3, 4, 3, 4, 3, 4])).label,
            MoodLabel::Neutral
        );
        assert_eq!(compute_mood(&answers([4; 6])).label, MoodLabel::Motivated);
        assert_eq!(compute_mood(&answers([5; 6])).label, MoodLabel::Motivated);
    }

    #[test]
    fn just_above_two_is_tired() {
        // avg = 13 / 6 ≈ 2.17
        let result = compute_mood(&answers([2, 2, 2, 2, 2, 3]));
        assert_eq!(result.label, MoodLabel::Tired);
    }

    #[test]
    fn neutral_only_inside_open_interval() {
        for tenth in 30..=40 {
            let average = f64::from(tenth) / 10.0;
            let label = mood_label_for(average);
            if average > 3.0 && average < 4.0 {
                assert_eq!(label, MoodLabel::Neutral, "avg {average}");
            } else {
                assert_ne!(label, MoodLabel::Neutral, "avg {average}");
            }
        }
    }

    #[test]
    fn every_label_has_four_suggestions() {
        for label in [
            MoodLabel::Stressed,
            MoodLabel::Tired,
            MoodLabel::Motivated,
            MoodLabel::Neutral,
        ] {
            assert_eq!(suggestions_for(label).len(), 4);
        }
        let result = compute_mood(&answers([5, 4, 5, 4, 5, 4]));
        assert_eq!(result.suggestions[0], "Great! Use this energy to tackle your goals");
    }

    #[test]
    fn scoring_is_idempotent() {
        let input = answers([1, 5, 2, 4, 3, 3]);
        assert_eq!(compute_mood(&input), compute_mood(&input));
    }

    #[test]
    fn rejects_out_of_range_and_wrong_length() {
        assert!(matches!(
            MoodAnswers::new([3, 3, 0, 3, 3, 3]),
            Err(MoodError::OutOfRange { index: 2, value: 0 })
        ));
        assert!(matches!(
            MoodAnswers::from_slice(&[3, 3, 3]),
            Err(MoodError::WrongLength {
                expected: 6,
                actual: 3
            })
        ));
        let mut slider = MoodAnswers::default();
        assert!(slider.set(1, 6).is_err());
        slider.set(1, 5).unwrap();
        assert_eq!(slider.values()[1], 5);
    }

    #[test]
    fn deserializes_from_json_array() {
        let parsed: MoodAnswers = serde_json::from_str("[1,2,3,4,5,1]").unwrap();
        assert_eq!(parsed.values(), &[1, 2, 3, 4, 5, 1]);
        assert!(serde_json::from_str::<MoodAnswers>("[1,2,3]").is_err());
    }

    #[test]
    fn unknown_label_falls_back_to_neutral_emoji() {
        assert_eq!(mood_emoji("stressed"), "😰");
        assert_eq!(mood_emoji("something"), "😊");
        assert_eq!(daily_quote(4), daily_quote(1));
    }
}
