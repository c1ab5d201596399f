//! In-memory stand-ins for the host page, the flashcard service and popups.

use std::{
    collections::{
        HashSet,
        VecDeque,
    },
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    api::{
        FlashcardService,
        ServiceMessage,
    },
    auth::{
        WindowHandle,
        WindowManager,
    },
    core::{
        CardId,
        CardpopError,
        Flashcard,
        Grade,
        NO_CARDS_MESSAGE,
    },
    overlay::{
        FocusTarget,
        HostPage,
        View,
    },
};

pub struct FakeHost {
    pub mounted: bool,
    pub mounts: usize,
    pub unmounts: usize,
    pub opacity: f32,
    pub overflow: String,
    pub overflow_writes: usize,
    pub painted: Vec<View>,
    pub focus: FocusTarget,
    pub playing_media: usize,
    pub fail_mount: bool,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            mounted: false,
            mounts: 0,
            unmounts: 0,
            opacity: 0.0,
            overflow: "auto".to_string(),
            overflow_writes: 0,
            painted: Vec::new(),
            focus: FocusTarget::Page,
            playing_media: 0,
            fail_mount: false,
        }
    }
}

impl FakeHost {
    pub fn last_painted(&self) -> Option<&View> {
        self.painted.last()
    }
}

impl HostPage for FakeHost {
    fn mount_overlay(&mut self) -> Result<(), CardpopError> {
        if self.fail_mount {
            return Err(CardpopError::Overlay("document has no body".to_string()));
        }
        self.mounted = true;
        self.mounts += 1;
        Ok(())
    }

    fn overlay_mounted(&self) -> bool {
        self.mounted
    }

    fn unmount_overlay(&mut self) {
        self.mounted = false;
        self.unmounts += 1;
    }

    fn set_overlay_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
    }

    fn scroll_overflow(&self) -> String {
        self.overflow.clone()
    }

    fn set_scroll_overflow(&mut self, value: &str) {
        self.overflow = value.to_string();
        self.overflow_writes += 1;
    }

    fn paint(&mut self, view: &View) {
        self.painted.push(view.clone());
    }

    fn move_focus(&mut self, target: &FocusTarget) {
        self.focus = target.clone();
    }

    fn pause_media(&mut self) -> usize {
        std::mem::take(&mut self.playing_media)
    }
}

#[derive(Default)]
struct ServiceState {
    queue: VecDeque<Flashcard>,
    deck: Vec<Flashcard>,
    reviews: Vec<(CardId, Grade)>,
    edits: Vec<(CardId, String, String)>,
    adds: Vec<(String, String)>,
    deletes: Vec<CardId>,
    list_calls: usize,
    fetch_calls: usize,
    validate_calls: usize,
    auth_message: Option<String>,
    fail_validation: bool,
    fail_reviews: bool,
    fail_fetch: Option<String>,
    next_id: CardId,
}

/// Flashcard service double. `queue` feeds `fetch_next`; `deck` feeds `list`.
#[derive(Default)]
pub struct FakeService {
    state: Mutex<ServiceState>,
}

impl FakeService {
    pub fn with_queue(cards: Vec<Flashcard>) -> Self {
        let service = Self::default();
        {
            let mut state = service.state.lock().unwrap();
            state.deck = cards.clone();
            state.queue = cards.into();
        }
        service
    }

    pub fn set_auth_message(&self, message: &str) {
        self.state.lock().unwrap().auth_message = Some(message.to_string());
    }

    pub fn fail_validation(&self, fail: bool) {
        self.state.lock().unwrap().fail_validation = fail;
    }

    pub fn fail_reviews(&self, fail: bool) {
        self.state.lock().unwrap().fail_reviews = fail;
    }

    pub fn fail_fetch(&self, message: Option<&str>) {
        self.state.lock().unwrap().fail_fetch = message.map(str::to_string);
    }

    pub fn reviews(&self) -> Vec<(CardId, Grade)> {
        self.state.lock().unwrap().reviews.clone()
    }

    pub fn edits(&self) -> Vec<(CardId, String, String)> {
        self.state.lock().unwrap().edits.clone()
    }

    pub fn adds(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().adds.clone()
    }

    pub fn deletes(&self) -> Vec<CardId> {
        self.state.lock().unwrap().deletes.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn fetch_calls(&self) -> usize {
        self.state.lock().unwrap().fetch_calls
    }

    pub fn validate_calls(&self) -> usize {
        self.state.lock().unwrap().validate_calls
    }
}

#[async_trait]
impl FlashcardService for FakeService {
    async fn fetch_next(&self) -> Result<Flashcard, CardpopError> {
        let mut state = self.state.lock().unwrap();
        state.fetch_calls += 1;
        if let Some(message) = &state.fail_fetch {
            return Err(CardpopError::Service {
                status: 500,
                status_text: "Internal Server Error".to_string(),
                message: message.clone(),
            });
        }
        // Same shape the HTTP client produces for an empty queue.
        state.queue.pop_front().ok_or_else(|| CardpopError::Service {
            status: 404,
            status_text: "Not Found".to_string(),
            message: NO_CARDS_MESSAGE.to_string(),
        })
    }

    async fn review(&self, card_id: CardId, grade: Grade) -> Result<ServiceMessage, CardpopError> {
        let mut state = self.state.lock().unwrap();
        state.reviews.push((card_id, grade));
        if state.fail_reviews {
            return Err(CardpopError::Custom("review rejected".to_string()));
        }
        Ok(ServiceMessage::new("Review recorded"))
    }

    async fn edit(
        &self,
        card_id: CardId,
        front: &str,
        back: &str,
    ) -> Result<ServiceMessage, CardpopError> {
        let mut state = self.state.lock().unwrap();
        state.edits.push((card_id, front.to_string(), back.to_string()));
        if let Some(card) = state.deck.iter_mut().find(|c| c.id == card_id) {
            *card = Flashcard::new(card_id, front, back);
        }
        Ok(ServiceMessage::new("Card updated"))
    }

    async fn add(&self, front: &str, back: &str) -> Result<ServiceMessage, CardpopError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = 1000 + state.next_id;
        state.adds.push((front.to_string(), back.to_string()));
        state.deck.push(Flashcard::new(id, front, back));
        Ok(ServiceMessage { message: "Card added".to_string(), id: Some(id) })
    }

    async fn delete(&self, card_id: CardId) -> Result<ServiceMessage, CardpopError> {
        let mut state = self.state.lock().unwrap();
        state.deletes.push(card_id);
        state.deck.retain(|c| c.id != card_id);
        Ok(ServiceMessage::new("Card deleted"))
    }

    async fn list(&self) -> Result<Vec<Flashcard>, CardpopError> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        Ok(state.deck.clone())
    }

    async fn validate_authentication(&self) -> Result<ServiceMessage, CardpopError> {
        let mut state = self.state.lock().unwrap();
        state.validate_calls += 1;
        if state.fail_validation {
            return Err(CardpopError::Service {
                status: 502,
                status_text: "Bad Gateway".to_string(),
                message: "upstream down".to_string(),
            });
        }
        let message = state.auth_message.clone().unwrap_or_else(|| "Not authenticated".to_string());
        Ok(ServiceMessage::new(message))
    }

    async fn logout(&self) -> Result<ServiceMessage, CardpopError> {
        Ok(ServiceMessage::new("Logged out"))
    }

    fn login_url(&self) -> String {
        "http://cards.test/login".to_string()
    }
}

#[derive(Default)]
struct WindowState {
    next: u64,
    open: HashSet<WindowHandle>,
    opened_urls: Vec<String>,
    fail_close: HashSet<WindowHandle>,
    fail_open: bool,
}

#[derive(Default)]
pub struct FakeWindows {
    state: Mutex<WindowState>,
}

impl FakeWindows {
    pub fn close_by_user(&self, handle: WindowHandle) {
        self.state.lock().unwrap().open.remove(&handle);
    }

    pub fn fail_close(&self, handle: WindowHandle) {
        self.state.lock().unwrap().fail_close.insert(handle);
    }

    pub fn fail_open(&self, fail: bool) {
        self.state.lock().unwrap().fail_open = fail;
    }

    pub fn open_count(&self) -> usize {
        self.state.lock().unwrap().open.len()
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.state.lock().unwrap().opened_urls.clone()
    }
}

impl WindowManager for FakeWindows {
    fn open(&self, url: &str) -> Result<WindowHandle, CardpopError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_open {
            return Err(CardpopError::Window("popup blocked".to_string()));
        }
        state.next += 1;
        let handle = WindowHandle(state.next);
        state.open.insert(handle);
        state.opened_urls.push(url.to_string());
        Ok(handle)
    }

    fn is_open(&self, handle: WindowHandle) -> bool {
        self.state.lock().unwrap().open.contains(&handle)
    }

    fn close(&self, handle: WindowHandle) -> Result<(), CardpopError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_close.contains(&handle) {
            return Err(CardpopError::Window("window refused to close".to_string()));
        }
        state.open.remove(&handle);
        Ok(())
    }
}

pub fn deck(cards: &[(CardId, &str, &str)]) -> Vec<Flashcard> {
    cards.iter().map(|(id, front, back)| Flashcard::new(*id, *front, *back)).collect()
}
