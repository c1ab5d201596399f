use crate::{
    core::{
        CardId,
        Flashcard,
        Grade,
        SessionState,
    },
    overlay::{
        Element,
        UiAction,
        View,
    },
};

pub const ANSWER_INPUT: &str = "answer";
pub const SEARCH_INPUT: &str = "search";
pub const FRONT_INPUT: &str = "front";
pub const BACK_INPUT: &str = "back";

pub const END_OF_SESSION: &str = "That's all for now. No more cards to review.";

/// Card being edited, or a new card when `card_id` is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditDraft {
    pub card_id: Option<CardId>,
    pub front: String,
    pub back: String,
    pub error: Option<String>,
}

impl EditDraft {
    pub fn existing(card: &Flashcard) -> Self {
        Self {
            card_id: Some(card.id),
            front: card.front.clone(),
            back: card.back.clone(),
            error: None,
        }
    }
}

/// List screen state. `cards` is fetched once per opening.
#[derive(Debug, Clone, Default)]
pub struct ListState {
    pub cards: Option<Vec<Flashcard>>,
    pub query: String,
    pub error: Option<String>,
}

impl ListState {
    pub fn visible(&self) -> Vec<&Flashcard> {
        self.cards
            .iter()
            .flatten()
            .filter(|card| card.matches_search(&self.query))
            .collect()
    }
}

/// Outcome of the confirm screen's prefetch step.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum NextCard {
    #[default]
    Unknown,
    Ready,
    SessionOver,
    Failed(String),
}

fn text(value: impl Into<String>) -> Element {
    Element::Text(value.into())
}

pub fn question(session: &SessionState) -> View {
    let mut view = View::new();
    match &session.current_card {
        Some(card) => {
            view.push(Element::Heading(card.front.clone()))
                .push(Element::input(ANSWER_INPUT, "Answer", "").on_submit(UiAction::SubmitAnswer))
                .push(Element::button("check", "Check", UiAction::SubmitAnswer));
        }
        None => {
            view.push(Element::Notice("This card is no longer available.".to_string()))
                .push(Element::button("close", "Close", UiAction::Close));
        }
    }
    view.push(Element::button("cards", "Cards", UiAction::OpenList));
    view
}

pub fn confirm(session: &SessionState, next: &NextCard) -> View {
    let mut view = View::new();

    match &session.current_card {
        Some(card) => {
            let answer = session.last_answer.as_deref().unwrap_or_default();
            let verdict = match session.last_grade {
                Some(Grade::High) => "Correct!",
                _ => "Not quite.",
            };
            view.push(Element::Heading(verdict.to_string()))
                .push(text(format!("{} = {}", card.front, card.back)));
            if !answer.trim().is_empty() {
                view.push(text(format!("You answered: {answer}")));
            }
        }
        None => {
            view.push(Element::Notice("This card was deleted.".to_string()));
        }
    }

    match next {
        NextCard::SessionOver => {
            view.push(Element::Notice(END_OF_SESSION.to_string()));
        }
        NextCard::Failed(message) => {
            view.push(Element::Error(message.clone()));
        }
        NextCard::Ready | NextCard::Unknown => {}
    }

    let has_next = session.prefetched_card.is_some();
    if has_next {
        view.push(Element::button("another", "Another", UiAction::Another));
    }
    if session.correct_count > 0 || !has_next {
        view.push(Element::button("close", "Done", UiAction::Close));
    }
    if session.current_card.is_some() {
        view.push(Element::button("edit", "Edit", UiAction::EditCurrent));
    }
    view
}

pub fn edit(draft: &EditDraft) -> View {
    let mut view = View::new();
    let title = if draft.card_id.is_some() { "Edit card" } else { "New card" };

    view.push(Element::Heading(title.to_string()))
        .push(Element::input(FRONT_INPUT, "Front", &draft.front))
        .push(Element::input(BACK_INPUT, "Back", &draft.back).on_submit(UiAction::SaveEdit));
    if let Some(error) = &draft.error {
        view.push(Element::Error(error.clone()));
    }
    view.push(Element::button("save", "Save", UiAction::SaveEdit))
        .push(Element::button("cancel", "Cancel", UiAction::CancelEdit));
    if draft.card_id.is_some() {
        view.push(Element::button("delete", "Delete", UiAction::DeleteEditing));
    }
    view
}

pub fn list(state: &ListState) -> View {
    let mut view = View::new();
    view.push(Element::Heading("Cards".to_string()))
        .push(Element::input(SEARCH_INPUT, "Search", &state.query).on_change(UiAction::Search));

    if let Some(error) = &state.error {
        view.push(Element::Error(error.clone()));
    }

    let cards = state.visible();
    if cards.is_empty() && state.cards.is_some() {
        view.push(Element::Notice("No matching cards.".to_string()));
    }
    for card in cards {
        view.push(text(format!("{} / {}", card.front, card.back)))
            .push(Element::button(&format!("edit-{}", card.id), "Edit", UiAction::EditListed(card.id)))
            .push(Element::button(
                &format!("delete-{}", card.id),
                "Delete",
                UiAction::DeleteListed(card.id),
            ));
    }

    view.push(Element::button("new", "New card", UiAction::NewCard))
        .push(Element::button("close-list", "Close", UiAction::CloseList));
    view
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answered(answer: &str, prefetched: bool, correct: u32) -> SessionState {
        let card = Flashcard::new(1, "rouge", "red");
        let grade = if card.accepts(answer) { Grade::High } else { Grade::Low };
        SessionState {
            current_card: Some(card),
            prefetched_card: prefetched.then(|| Flashcard::new(2, "bleu", "blue")),
            pending_grade: None,
            last_answer: Some(answer.to_string()),
            last_grade: Some(grade),
            correct_count: correct,
        }
    }

    #[test]
    fn test_confirm_buttons_follow_session() {
        let wrong_with_next = confirm(&answered("rose", true, 0), &NextCard::Ready);
        assert_eq!(wrong_with_next.button_labels(), vec!["Another", "Edit"]);

        let right_with_next = confirm(&answered("Red", true, 1), &NextCard::Ready);
        assert_eq!(right_with_next.button_labels(), vec!["Another", "Done", "Edit"]);

        let over = confirm(&answered("rose", false, 0), &NextCard::SessionOver);
        assert_eq!(over.button_labels(), vec!["Done", "Edit"]);
        assert!(over.text_lines().contains(&END_OF_SESSION));
    }

    #[test]
    fn test_verdict_comes_from_recorded_grade() {
        let mut session = answered("red", true, 1);
        session.current_card = Some(Flashcard::new(1, "rouge", "crimson"));

        let view = confirm(&session, &NextCard::Ready);
        assert_eq!(view.text_lines()[0], "Correct!");
    }

    #[test]
    fn test_list_filters_on_query() {
        let state = ListState {
            cards: Some(vec![Flashcard::new(1, "a", "b"), Flashcard::new(2, "apple", "fruit")]),
            query: "APP".to_string(),
            error: None,
        };
        let ids: Vec<CardId> = state.visible().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2]);

        let view = list(&state);
        assert_eq!(view.focusable_ids().first(), Some(&SEARCH_INPUT));
        assert!(view.has_button("delete-2"));
        assert!(!view.has_button("delete-1"));
    }
}
