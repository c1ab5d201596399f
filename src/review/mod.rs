pub mod views;


use tracing::{
    debug,
    error,
    info,
    warn,
};
use views::{
    EditDraft,
    ListState,
    NextCard,
    BACK_INPUT,
    FRONT_INPUT,
    SEARCH_INPUT,
};

use crate::{
    api::ServiceMessage,
    bridge::BridgeClient,
    core::{
        CardId,
        CardpopError,
        Flashcard,
        SessionState,
    },
    overlay::{
        Arbitration,
        FocusTarget,
        HostPage,
        Key,
        KeyOutcome,
        OverlayHost,
        PriorityStateMachine,
        ScreenId,
        UiAction,
    },
};

/// Minutes before asking again when no card could be fetched.
pub const RETRY_MINUTES: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewPhase {
    NoCard,
    ShowingQuestion,
    AwaitingGradeSubmit,
    ShowingConfirm,
}

/// Drives one page's review cycle: fetch, ask, grade, submit, prefetch.
/// Owns the session, the screen arbitration and the overlay of that page.
pub struct ReviewFlowController<H: HostPage> {
    bridge: BridgeClient,
    screens: PriorityStateMachine,
    overlay: OverlayHost<H>,
    session: SessionState,
    phase: ReviewPhase,
    next: NextCard,
    draft: Option<EditDraft>,
    list: ListState,
}

impl<H: HostPage> ReviewFlowController<H> {
    pub fn new(bridge: BridgeClient, page: H) -> Self {
        Self {
            bridge,
            screens: PriorityStateMachine::new(),
            overlay: OverlayHost::new(page),
            session: SessionState::default(),
            phase: ReviewPhase::NoCard,
            next: NextCard::Unknown,
            draft: None,
            list: ListState::default(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn phase(&self) -> ReviewPhase {
        self.phase
    }

    pub fn screens(&self) -> &PriorityStateMachine {
        &self.screens
    }

    pub fn overlay(&self) -> &OverlayHost<H> {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut OverlayHost<H> {
        &mut self.overlay
    }

    pub fn draft(&self) -> Option<&EditDraft> {
        self.draft.as_ref()
    }

    pub fn visible_cards(&self) -> Vec<&Flashcard> {
        self.list.visible()
    }

    /// Shows the question screen for the current card, fetching one first if
    /// none is cached. An empty queue or a failed fetch re-arms the reminder
    /// for a short retry instead.
    pub async fn present_next(&mut self) {
        if self.screens.is_active(ScreenId::Flashcard) {
            debug!("[Review] A card is already on screen");
            return;
        }

        if self.session.current_card.is_none() {
            match self.bridge.fetch_next_flashcard().await {
                Ok(card) => {
                    debug!("[Review] Fetched card {}", card.id);
                    self.session.current_card = Some(card);
                }
                Err(e) if e.is_no_cards() => {
                    debug!("[Review] Nothing due, retrying in {} minute(s)", RETRY_MINUTES);
                    self.schedule_reminder(RETRY_MINUTES).await;
                    return;
                }
                Err(e) => {
                    error!("[Review] Failed to fetch next card: {}", e);
                    self.schedule_reminder(RETRY_MINUTES).await;
                    return;
                }
            }
        }

        let paused = self.overlay.page_mut().pause_media();
        if paused > 0 {
            debug!("[Review] Paused {} media player(s)", paused);
        }
        self.phase = ReviewPhase::ShowingQuestion;
        let arbitration = self.screens.activate(ScreenId::Flashcard);
        self.apply(arbitration).await;
    }

    /// Routes a key through the overlay and performs the action it triggered.
    pub async fn handle_key(&mut self, key: Key) -> KeyOutcome {
        let outcome = self.overlay.handle_key(key);
        if let Some(action) = outcome.action.clone() {
            self.perform(action).await;
        }
        outcome
    }

    pub fn on_focus_in(&mut self, target: FocusTarget) {
        self.overlay.on_focus_in(target);
    }

    /// The host finished the overlay's opacity transition.
    pub fn on_transition_end(&mut self) -> bool {
        self.overlay.on_transition_end()
    }

    pub async fn perform(&mut self, action: UiAction) {
        debug!("[Review] {:?}", action);
        match action {
            UiAction::SubmitAnswer => self.submit_answer().await,
            UiAction::Another => self.another().await,
            UiAction::Close => self.close().await,
            UiAction::EditCurrent => {
                let draft = self.session.current_card.as_ref().map(EditDraft::existing);
                if let Some(draft) = draft {
                    self.open_editor(draft).await;
                }
            }
            UiAction::OpenList => {
                self.list = ListState::default();
                let arbitration = self.screens.activate(ScreenId::List);
                self.apply(arbitration).await;
            }
            UiAction::CloseList => {
                let arbitration = self.screens.deactivate(ScreenId::List);
                self.apply(arbitration).await;
            }
            UiAction::Search => {
                let query = self.overlay.view().input_value(SEARCH_INPUT).unwrap_or_default();
                self.list.query = query.to_string();
                self.rerender(ScreenId::List).await;
            }
            UiAction::EditListed(card_id) => {
                let draft = self
                    .list
                    .cards
                    .iter()
                    .flatten()
                    .find(|c| c.id == card_id)
                    .map(EditDraft::existing);
                if let Some(draft) = draft {
                    self.open_editor(draft).await;
                }
            }
            UiAction::DeleteListed(card_id) => {
                if let Err(e) = self.delete_card(card_id).await {
                    self.list.error = Some(e.to_string());
                }
                self.rerender(ScreenId::List).await;
            }
            UiAction::NewCard => self.open_editor(EditDraft::default()).await,
            UiAction::SaveEdit => self.save_edit().await,
            UiAction::CancelEdit => self.close_editor().await,
            UiAction::DeleteEditing => {
                let Some(card_id) = self.draft.as_ref().and_then(|d| d.card_id) else {
                    return;
                };
                match self.delete_card(card_id).await {
                    Ok(()) => self.close_editor().await,
                    Err(e) => {
                        if let Some(draft) = &mut self.draft {
                            draft.error = Some(e.to_string());
                        }
                        self.rerender(ScreenId::Edit).await;
                    }
                }
            }
        }
    }

    /// Grades the typed answer and moves to the confirm screen.
    pub async fn submit_answer(&mut self) {
        let answer = self.overlay.view().input_value(views::ANSWER_INPUT).unwrap_or_default();
        let answer = answer.to_string();
        let Some(grade) = self.session.record_answer(&answer) else {
            warn!("[Review] Answer submitted without a card");
            return;
        };
        debug!("[Review] Graded {:?}", grade);

        self.phase = ReviewPhase::AwaitingGradeSubmit;
        self.next = NextCard::Unknown;
        let arbitration = self.screens.activate(ScreenId::Confirm);
        self.apply(arbitration).await;
    }

    /// Promotes the prefetched card and asks it.
    pub async fn another(&mut self) {
        if !self.session.promote_prefetched() {
            return;
        }
        self.phase = ReviewPhase::ShowingQuestion;
        self.next = NextCard::Unknown;
        let arbitration = self.screens.deactivate(ScreenId::Confirm);
        self.apply(arbitration).await;
    }

    /// Ends the cycle: re-arms the reminder, resets the session and hides
    /// both review screens.
    pub async fn close(&mut self) {
        if !self.screens.is_active(ScreenId::Flashcard) && !self.screens.is_active(ScreenId::Confirm) {
            debug!("[Review] Close ignored, no review screen is active");
            return;
        }
        let minutes = self.session.reminder_minutes();
        self.schedule_reminder(minutes).await;
        info!("[Review] Session closed after {} correct answer(s)", self.session.correct_count);

        self.session.reset();
        self.phase = ReviewPhase::NoCard;
        self.next = NextCard::Unknown;

        let arbitration = self.screens.deactivate(ScreenId::Flashcard);
        self.apply(arbitration).await;
        let arbitration = self.screens.deactivate(ScreenId::Confirm);
        self.apply(arbitration).await;
    }

    pub async fn login(&mut self) -> Result<(), CardpopError> {
        self.bridge.login().await.inspect_err(|e| warn!("[Review] Login failed: {}", e))
    }

    pub async fn logout(&mut self) -> Result<ServiceMessage, CardpopError> {
        let reply = self.bridge.logout().await?;
        info!("[Review] {}", reply.message);
        Ok(reply)
    }

    async fn schedule_reminder(&self, minutes: u32) {
        // Best-effort: a lost reminder only delays the next prompt.
        if let Err(e) = self.bridge.reset_timer(minutes).await {
            warn!("[Review] Failed to schedule reminder: {}", e);
        }
    }

    async fn open_editor(&mut self, draft: EditDraft) {
        self.draft = Some(draft);
        let arbitration = self.screens.activate(ScreenId::Edit);
        self.apply(arbitration).await;
    }

    async fn close_editor(&mut self) {
        self.draft = None;
        let arbitration = self.screens.deactivate(ScreenId::Edit);
        self.apply(arbitration).await;
    }

    async fn save_edit(&mut self) {
        let Some(mut draft) = self.draft.take() else {
            return;
        };
        let view = self.overlay.view();
        draft.front = view.input_value(FRONT_INPUT).unwrap_or_default().trim().to_string();
        draft.back = view.input_value(BACK_INPUT).unwrap_or_default().trim().to_string();

        if draft.front.is_empty() || draft.back.is_empty() {
            draft.error = Some("Both sides need some text.".to_string());
            self.draft = Some(draft);
            self.rerender(ScreenId::Edit).await;
            return;
        }

        let result = match draft.card_id {
            Some(card_id) => self
                .bridge
                .edit_flashcard(card_id, &draft.front, &draft.back)
                .await
                .map(|_| Flashcard::new(card_id, draft.front.clone(), draft.back.clone())),
            None => self.bridge.add_flashcard(&draft.front, &draft.back).await.map(|reply| {
                Flashcard::new(reply.id.unwrap_or_default(), draft.front.clone(), draft.back.clone())
            }),
        };

        match result {
            Ok(card) => {
                info!("[Review] Saved card {}", card.id);
                self.replace_card(card);
                self.list.cards = None;
                self.close_editor().await;
            }
            Err(e) => {
                warn!("[Review] Failed to save card: {}", e);
                draft.error = Some(e.to_string());
                self.draft = Some(draft);
                self.rerender(ScreenId::Edit).await;
            }
        }
    }

    fn replace_card(&mut self, card: Flashcard) {
        for slot in [&mut self.session.current_card, &mut self.session.prefetched_card] {
            if slot.as_ref().is_some_and(|c| c.id == card.id) {
                *slot = Some(card.clone());
            }
        }
    }

    async fn delete_card(&mut self, card_id: CardId) -> Result<(), CardpopError> {
        self.bridge.delete_flashcard(card_id).await?;
        info!("[Review] Deleted card {}", card_id);

        for slot in [&mut self.session.current_card, &mut self.session.prefetched_card] {
            if slot.as_ref().is_some_and(|c| c.id == card_id) {
                *slot = None;
            }
        }
        if self.session.current_card.is_none() {
            self.session.pending_grade = None;
        }
        self.list.cards = None;
        self.list.error = None;
        Ok(())
    }

    /// Carries out what the state machine decided.
    async fn apply(&mut self, arbitration: Arbitration) {
        match arbitration {
            Arbitration::Render(id) => {
                if let Err(e) = self.overlay.ensure_mounted() {
                    error!("[Review] Could not mount overlay: {}", e);
                    self.drop_overlay();
                    return;
                }
                self.render(id).await;
            }
            Arbitration::Unchanged(id) => {
                if !self.overlay.is_present() {
                    warn!("[Review] Overlay vanished while {} was active", id);
                    self.drop_overlay();
                }
            }
            Arbitration::Hide => self.overlay.begin_fade_out(),
        }
    }

    /// Rebuilds the visible screen after its own state changed.
    async fn rerender(&mut self, id: ScreenId) {
        if self.screens.current_visible() == Some(id) {
            self.render(id).await;
        }
    }

    async fn render(&mut self, id: ScreenId) {
        let view = match id {
            ScreenId::Flashcard => views::question(&self.session),
            ScreenId::Confirm => {
                self.prepare_confirm().await;
                views::confirm(&self.session, &self.next)
            }
            ScreenId::Edit => views::edit(self.draft.as_ref().unwrap_or(&EditDraft::default())),
            ScreenId::List => {
                self.load_list().await;
                views::list(&self.list)
            }
        };

        // The page may have dropped the tree while we waited on the bridge.
        if !self.overlay.is_present() {
            warn!("[Review] Overlay vanished while rendering {}", id);
            self.drop_overlay();
            return;
        }
        self.overlay.show(view);
    }

    /// Submits the pending grade, then prefetches the next card. The grade is
    /// taken before the call so a re-render can never submit it twice.
    async fn prepare_confirm(&mut self) {
        if let Some(grade) = self.session.pending_grade.take() {
            if let Some(card) = &self.session.current_card {
                if let Err(e) = self.bridge.review_flashcard(card.id, grade).await {
                    warn!("[Review] Review of card {} not recorded: {}", card.id, e);
                }
            }
        }
        self.phase = ReviewPhase::ShowingConfirm;

        if self.session.prefetched_card.is_some() {
            self.next = NextCard::Ready;
            return;
        }

        self.next = match self.bridge.fetch_next_flashcard().await {
            Ok(card) => {
                self.session.prefetched_card = Some(card);
                NextCard::Ready
            }
            Err(e) if e.is_no_cards() => {
                debug!("[Review] Queue empty after this card");
                NextCard::SessionOver
            }
            Err(e) => {
                warn!("[Review] Prefetch failed: {}", e);
                NextCard::Failed(e.to_string())
            }
        };
    }

    async fn load_list(&mut self) {
        if self.list.cards.is_some() {
            return;
        }
        match self.bridge.list_flashcards().await {
            Ok(cards) => {
                self.list.cards = Some(cards);
                self.list.error = None;
            }
            Err(e) => {
                warn!("[Review] Failed to list cards: {}", e);
                self.list.error = Some(e.to_string());
            }
        }
    }

    fn drop_overlay(&mut self) {
        self.screens.deactivate_all();
        self.overlay.forget_detached();
        self.phase = ReviewPhase::NoCard;
    }
}
