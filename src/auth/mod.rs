pub mod window;

use std::{
    sync::{
        Arc,
        Mutex,
    },
    time::Duration,
};

use tokio::time::{
    interval_at,
    Instant,
};
use tracing::{
    debug,
    error,
    info,
    warn,
};
pub use window::{
    LoginWindowSet,
    WindowHandle,
    WindowManager,
};

use crate::{
    api::FlashcardService,
    core::{
        tasks::{
            CancelToken,
            TaskHandle,
        },
        CardpopError,
    },
};

pub const LOGIN_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Idle,
    WindowOpen,
    Polling,
    Authenticated,
    Closed,
    Failed(String),
}

impl AuthState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuthState::Authenticated | AuthState::Closed | AuthState::Failed(_))
    }
}

/// Shared pieces the poll task needs after the session call has returned.
#[derive(Clone)]
struct PollContext {
    windows: Arc<dyn WindowManager>,
    service: Arc<dyn FlashcardService>,
    tracked: Arc<Mutex<LoginWindowSet>>,
    state: Arc<Mutex<AuthState>>,
}

impl PollContext {
    fn set_state(&self, next: AuthState) {
        if let Ok(mut state) = self.state.lock() {
            debug!("[Auth] {:?} -> {:?}", *state, next);
            *state = next;
        }
    }

    fn untrack(&self, handle: WindowHandle) {
        if let Ok(mut tracked) = self.tracked.lock() {
            tracked.remove(handle);
        }
    }

    /// Closes every tracked window. A failing close is logged and the rest
    /// are still closed; every handle leaves the set either way.
    fn close_all(&self) {
        let handles = match self.tracked.lock() {
            Ok(tracked) => tracked.handles(),
            Err(_) => return,
        };

        for handle in handles {
            if self.windows.is_open(handle) {
                if let Err(e) = self.windows.close(handle) {
                    warn!("[Auth] Failed to close login window {:?}: {}", handle, e);
                }
            }
            self.untrack(handle);
        }
    }
}

/// Popup login flow: open the service's login page, then poll until the user
/// closes the window or the service reports an authenticated session.
pub struct AuthSession {
    context: PollContext,
    poll: Mutex<Option<TaskHandle>>,
    interval: Duration,
}

impl AuthSession {
    pub fn new(windows: Arc<dyn WindowManager>, service: Arc<dyn FlashcardService>) -> Self {
        Self::with_interval(windows, service, LOGIN_POLL_INTERVAL)
    }

    pub fn with_interval(
        windows: Arc<dyn WindowManager>,
        service: Arc<dyn FlashcardService>,
        interval: Duration,
    ) -> Self {
        Self {
            context: PollContext {
                windows,
                service,
                tracked: Arc::new(Mutex::new(LoginWindowSet::default())),
                state: Arc::new(Mutex::new(AuthState::Idle)),
            },
            poll: Mutex::new(None),
            interval,
        }
    }

    pub fn state(&self) -> AuthState {
        self.context.state.lock().map(|state| state.clone()).unwrap_or(AuthState::Idle)
    }

    pub fn tracked_count(&self) -> usize {
        self.context.tracked.lock().map(|tracked| tracked.len()).unwrap_or(0)
    }

    pub fn is_polling(&self) -> bool {
        self.poll
            .lock()
            .map(|poll| poll.as_ref().map(|task| !task.is_finished()).unwrap_or(false))
            .unwrap_or(false)
    }

    /// Starts a login attempt, abandoning any attempt still in progress.
    pub fn start(&self) -> Result<(), CardpopError> {
        self.stop_polling();
        self.context.close_all();

        match self.begin() {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("[Auth] Login failed to start: {}", e);
                self.stop_polling();
                self.context.close_all();
                self.context.set_state(AuthState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    fn begin(&self) -> Result<(), CardpopError> {
        let url = self.context.service.login_url();
        let handle = self.context.windows.open(&url)?;
        self.context
            .tracked
            .lock()
            .map_err(|_| CardpopError::Window("Window set poisoned".to_string()))?
            .insert(handle);
        self.context.set_state(AuthState::WindowOpen);
        info!("[Auth] Opened login window {:?} at {}", handle, url);

        let token = CancelToken::new();
        let join_handle =
            tokio::spawn(poll_login(self.context.clone(), handle, token.clone(), self.interval));

        let mut poll = self
            .poll
            .lock()
            .map_err(|_| CardpopError::Window("Poll slot poisoned".to_string()))?;
        *poll = Some(TaskHandle::new(token, join_handle));
        self.context.set_state(AuthState::Polling);
        Ok(())
    }

    /// Abandons the attempt: stops polling and closes every login window.
    pub fn cancel(&self) {
        self.stop_polling();
        self.context.close_all();
        if !self.state().is_terminal() {
            self.context.set_state(AuthState::Closed);
        }
    }

    fn stop_polling(&self) {
        if let Ok(mut poll) = self.poll.lock() {
            if let Some(task) = poll.take() {
                task.cancel();
            }
        }
    }
}

async fn poll_login(
    context: PollContext,
    handle: WindowHandle,
    token: CancelToken,
    period: Duration,
) {
    let mut ticker = interval_at(Instant::now() + period, period);

    loop {
        ticker.tick().await;
        if token.is_cancelled() {
            return;
        }

        if !context.windows.is_open(handle) {
            info!("[Auth] Login window {:?} closed by the user", handle);
            context.untrack(handle);
            context.set_state(AuthState::Closed);
            return;
        }

        match context.service.validate_authentication().await {
            Ok(reply) if reply.is_authenticated() => {
                // The window may have been closed or the attempt cancelled meanwhile.
                if token.is_cancelled() {
                    return;
                }
                info!("[Auth] Authenticated: {}", reply.message);
                context.close_all();
                context.set_state(AuthState::Authenticated);
                return;
            }
            Ok(reply) => debug!("[Auth] Not signed in yet: {}", reply.message),
            Err(e) => debug!("[Auth] Validation attempt failed: {}", e),
        }
    }
}
