pub mod hosts;

use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
};

pub use hosts::{
    HostCommand,
    HostRegistry,
};
use serde_json::{
    json,
    Value,
};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
};
use tracing::{
    debug,
    info,
};

use crate::{
    api::FlashcardService,
    auth::{
        AuthSession,
        WindowManager,
    },
    bridge::{
        self,
        types::{
            CardPayload,
            CardRef,
            ConfigPayload,
            ReviewPayload,
            TimerPayload,
        },
        Action,
        BridgeClient,
        Router,
    },
    core::{
        tasks::{
            Scheduler,
            REMINDER_ALARM,
        },
        CardpopError,
        ConfigStore,
        Flashcard,
    },
};

/// The controller layer: owns the service client, the reminder alarm, the
/// login session and the pages connected over the bridge.
pub struct Background {
    scheduler: Scheduler,
    config: Arc<ConfigStore>,
    auth: Arc<AuthSession>,
    hosts: Mutex<HostRegistry>,
    router: Router,
}

impl Background {
    /// Returns the controller and the receiver of fired alarm names, to be
    /// handed to `run_alarms`.
    pub fn new(
        service: Arc<dyn FlashcardService>,
        windows: Arc<dyn WindowManager>,
        config: Arc<ConfigStore>,
    ) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (scheduler, alarms) = Scheduler::new();
        let auth = Arc::new(AuthSession::new(windows, service.clone()));
        let router = build_router(&service, &scheduler, &config, &auth);

        let background =
            Self { scheduler, config, auth, hosts: Mutex::new(HostRegistry::default()), router };
        (background, alarms)
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    fn hosts(&self) -> MutexGuard<'_, HostRegistry> {
        self.hosts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn host_count(&self) -> usize {
        self.hosts().len()
    }

    /// Arms the first reminder of the process.
    pub fn start(&self) {
        let minutes = self.config.get().initial_delay_minutes;
        info!("[Background] First reminder in {} minute(s)", minutes);
        self.scheduler.schedule_minutes(REMINDER_ALARM, minutes);
    }

    /// Connects a page: opens a bridge served by this controller's handlers
    /// and registers the page for reminders.
    pub fn connect(&self, site: &str) -> (BridgeClient, mpsc::UnboundedReceiver<HostCommand>) {
        let (client, port) = bridge::open();
        self.router.clone().serve(port);
        let commands = self.hosts().register(site);
        (client, commands)
    }

    /// Reacts to a fired alarm. Returns how many pages were told to present.
    pub fn on_alarm(&self, name: &str) -> usize {
        if name != REMINDER_ALARM {
            debug!("[Background] Ignoring alarm '{}'", name);
            return 0;
        }
        let config = self.config.get();
        let delivered = self.hosts().present_next(&config);
        info!("[Background] Reminder fired, {} page(s) notified", delivered);
        delivered
    }

    pub fn run_alarms(self: Arc<Self>, mut alarms: mpsc::UnboundedReceiver<String>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(name) = alarms.recv().await {
                self.on_alarm(&name);
            }
            debug!("[Background] Alarm channel closed");
        })
    }
}

fn build_router(
    service: &Arc<dyn FlashcardService>,
    scheduler: &Scheduler,
    config: &Arc<ConfigStore>,
    auth: &Arc<AuthSession>,
) -> Router {
    let mut router = Router::new();

    let svc = service.clone();
    router.register(Action::FetchNextFlashcard, move |_| {
        let service = svc.clone();
        async move {
            let flashcard = service.fetch_next().await?;
            Ok(json!({ "flashcard": flashcard }))
        }
    });

    let svc = service.clone();
    router.register(Action::ReviewFlashcard, move |payload| {
        let service = svc.clone();
        async move {
            let ReviewPayload { card_id, grade } = serde_json::from_value(payload)?;
            Ok(serde_json::to_value(service.review(card_id, grade).await?)?)
        }
    });

    let svc = service.clone();
    router.register(Action::EditFlashcard, move |payload| {
        let service = svc.clone();
        async move {
            let CardPayload { card_id, card_front, card_back } = serde_json::from_value(payload)?;
            let card_id = card_id
                .ok_or_else(|| CardpopError::Bridge("Editing needs a card_id".to_string()))?;
            let reply = service.edit(card_id, &card_front, &card_back).await?;
            let flashcard = Flashcard::new(card_id, card_front, card_back);
            Ok(json!({ "message": reply.message, "flashcard": flashcard }))
        }
    });

    let svc = service.clone();
    router.register(Action::AddFlashcard, move |payload| {
        let service = svc.clone();
        async move {
            let CardPayload { card_front, card_back, .. } = serde_json::from_value(payload)?;
            let reply = service.add(&card_front, &card_back).await?;
            let flashcard = reply.id.map(|id| Flashcard::new(id, card_front, card_back));
            Ok(json!({ "message": reply.message, "id": reply.id, "flashcard": flashcard }))
        }
    });

    let svc = service.clone();
    router.register(Action::DeleteFlashcard, move |payload| {
        let service = svc.clone();
        async move {
            let CardRef { card_id } = serde_json::from_value(payload)?;
            Ok(serde_json::to_value(service.delete(card_id).await?)?)
        }
    });

    let svc = service.clone();
    router.register(Action::ListFlashcards, move |_| {
        let service = svc.clone();
        async move {
            let flashcards = service.list().await?;
            Ok(json!({ "flashcards": flashcards }))
        }
    });

    let session = auth.clone();
    router.register(Action::Login, move |_| {
        let auth = session.clone();
        async move {
            auth.start()?;
            Ok(Value::Null)
        }
    });

    let svc = service.clone();
    router.register(Action::Logout, move |_| {
        let service = svc.clone();
        async move { Ok(serde_json::to_value(service.logout().await?)?) }
    });

    let svc = service.clone();
    router.register(Action::ValidateAuthentication, move |_| {
        let service = svc.clone();
        async move { Ok(serde_json::to_value(service.validate_authentication().await?)?) }
    });

    let timers = scheduler.clone();
    router.register(Action::ResetTimer, move |payload| {
        let scheduler = timers.clone();
        async move {
            let TimerPayload { minutes } = serde_json::from_value(payload)?;
            scheduler.schedule_minutes(REMINDER_ALARM, minutes);
            Ok(json!({ "minutes": minutes }))
        }
    });

    let store = config.clone();
    router.register(Action::GetConfig, move |_| {
        let config = store.clone();
        async move { Ok(json!({ "config": config.get() })) }
    });

    let store = config.clone();
    router.register(Action::SetConfig, move |payload| {
        let config = store.clone();
        async move {
            let ConfigPayload { config: next } = serde_json::from_value(payload)?;
            Ok(json!({ "config": config.set(next)? }))
        }
    });

    router
}
