use serde::{
    Deserialize,
    Serialize,
};

pub type CardId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: CardId,
    #[serde(alias = "card_front")]
    pub front: String,
    #[serde(alias = "card_back")]
    pub back: String,
}

impl Flashcard {
    pub fn new(id: CardId, front: impl Into<String>, back: impl Into<String>) -> Self {
        Self { id, front: front.into(), back: back.into() }
    }

    /// Case-insensitive comparison of the trimmed answer against the back text.
    pub fn accepts(&self, answer: &str) -> bool {
        answer.trim().to_lowercase() == self.back.to_lowercase()
    }

    pub fn matches_search(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query = query.to_lowercase();
        self.front.to_lowercase().contains(&query) || self.back.to_lowercase().contains(&query)
    }
}

/// Binary spaced-repetition quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Grade {
    Low,
    High,
}

impl Grade {
    pub fn value(self) -> u8 {
        match self {
            Grade::Low => 1,
            Grade::High => 3,
        }
    }
}

impl From<Grade> for u8 {
    fn from(grade: Grade) -> Self {
        grade.value()
    }
}

impl TryFrom<u8> for Grade {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Grade::Low),
            3 => Ok(Grade::High),
            other => Err(format!("unsupported grade {other}")),
        }
    }
}

/// Per-cycle review state. `pending_grade` is only set between answer
/// submission and completion of the review call; `last_grade` keeps the
/// verdict for the confirm screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub current_card: Option<Flashcard>,
    pub prefetched_card: Option<Flashcard>,
    pub pending_grade: Option<Grade>,
    pub last_answer: Option<String>,
    pub last_grade: Option<Grade>,
    pub correct_count: u32,
}

impl SessionState {
    /// Grades `answer` against the current card and records it.
    pub fn record_answer(&mut self, answer: &str) -> Option<Grade> {
        let card = self.current_card.as_ref()?;
        let grade = if card.accepts(answer) { Grade::High } else { Grade::Low };
        if grade == Grade::High {
            self.correct_count += 1;
        }
        self.pending_grade = Some(grade);
        self.last_grade = Some(grade);
        self.last_answer = Some(answer.to_string());
        Some(grade)
    }

    /// Promotes the prefetched card. Returns false when nothing was prefetched.
    pub fn promote_prefetched(&mut self) -> bool {
        match self.prefetched_card.take() {
            Some(card) => {
                self.current_card = Some(card);
                self.last_answer = None;
                self.last_grade = None;
                self.pending_grade = None;
                true
            }
            None => false,
        }
    }

    /// Minutes until the next reminder when a cycle closes.
    pub fn reminder_minutes(&self) -> u32 {
        self.correct_count.max(1)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(back: &str) -> SessionState {
        SessionState { current_card: Some(Flashcard::new(7, "capital of France", back)), ..Default::default() }
    }

    #[test]
    fn test_exact_answer_grades_high() {
        let mut session = session_with("Paris");

        assert_eq!(session.record_answer("  pARIS "), Some(Grade::High));
        assert_eq!(session.correct_count, 1);
        assert_eq!(session.pending_grade, Some(Grade::High));
        assert_eq!(session.last_answer.as_deref(), Some("  pARIS "));
        assert_eq!(session.last_grade, Some(Grade::High));
    }

    #[test]
    fn test_back_text_is_not_trimmed() {
        let mut session = session_with("Paris ");

        assert_eq!(session.record_answer("Paris"), Some(Grade::Low));
        assert_eq!(session.record_answer(" paris  "), Some(Grade::Low));
    }

    #[test]
    fn test_promotion_clears_verdict() {
        let mut session = session_with("Paris");
        session.prefetched_card = Some(Flashcard::new(8, "capital of Italy", "Rome"));
        session.record_answer("Paris");

        assert!(session.promote_prefetched());
        assert_eq!(session.last_grade, None);
        assert_eq!(session.last_answer, None);
        assert_eq!(session.correct_count, 1);
    }

    #[test]
    fn test_other_answers_grade_low() {
        let mut session = session_with("Paris");

        for answer in ["Pari", "Paris!", "", "Lyon"] {
            assert_eq!(session.record_answer(answer), Some(Grade::Low));
        }
        assert_eq!(session.correct_count, 0);
        assert_eq!(session.pending_grade, Some(Grade::Low));
    }

    #[test]
    fn test_no_card_no_grade() {
        let mut session = SessionState::default();
        assert_eq!(session.record_answer("anything"), None);
        assert_eq!(session.pending_grade, None);
    }

    #[test]
    fn test_reminder_minutes_floor_and_reset() {
        let mut session = session_with("a");
        assert_eq!(session.reminder_minutes(), 1);
        session.correct_count = 4;
        assert_eq!(session.reminder_minutes(), 4);

        session.prefetched_card = Some(Flashcard::new(8, "b", "c"));
        session.reset();
        assert_eq!(session, SessionState::default());
    }

    #[test]
    fn test_search_matches_front_or_back() {
        let cards =
            vec![Flashcard::new(1, "a", "b"), Flashcard::new(2, "apple", "fruit")];
        let found: Vec<_> = cards.iter().filter(|c| c.matches_search("app")).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].front, "apple");

        assert!(cards[1].matches_search("FRU"));
        assert!(cards[0].matches_search(""));
    }

    #[test]
    fn test_grade_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Grade::High).unwrap(), "3");
        assert_eq!(serde_json::from_str::<Grade>("1").unwrap(), Grade::Low);
        assert!(serde_json::from_str::<Grade>("2").is_err());
    }
}
