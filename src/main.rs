use std::{
    sync::Arc,
    time::Duration,
};

use cardpop::{
    api::{
        FlashcardService,
        RemoteServiceClient,
    },
    console::{
        parse_command,
        Command,
        ConsoleHost,
        ConsoleWindows,
    },
    overlay::{
        Key,
        OverlayPhase,
    },
    Background,
    CardpopError,
    ConfigStore,
    ReviewFlowController,
};
use tokio::{
    io::{
        AsyncBufReadExt,
        BufReader,
    },
    time::{
        sleep_until,
        Instant,
    },
};
use tracing::{
    error,
    info,
};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CARDPOP_LOG";
const FADE_DURATION: Duration = Duration::from_millis(300);

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        error!("cardpop stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CardpopError> {
    let config = Arc::new(ConfigStore::load_default());
    info!("Using flashcard service at {}", config.base_url());

    let service: Arc<dyn FlashcardService> = Arc::new(RemoteServiceClient::new(config.clone())?);
    let windows = Arc::new(ConsoleWindows::default());
    let (background, alarms) = Background::new(service, windows.clone(), config);
    let background = Arc::new(background);
    background.clone().run_alarms(alarms);
    background.start();

    let (bridge, mut commands) = background.connect("console");
    let mut controller = ReviewFlowController::new(bridge, ConsoleHost::default());

    println!("cardpop is running. A card shows up when the reminder fires (:next to ask now).");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut fade_deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let Some(command) = parse_command(&line) else {
                    continue;
                };
                if command == Command::Quit {
                    break;
                }
                run_command(&mut controller, &windows, command).await;
            }
            Some(_) = commands.recv() => {
                controller.present_next().await;
            }
            _ = sleep_until(fade_deadline.unwrap_or_else(Instant::now)), if fade_deadline.is_some() => {
                controller.on_transition_end();
            }
        }

        fade_deadline = match controller.overlay().phase() {
            OverlayPhase::FadingOut => fade_deadline.or_else(|| Some(Instant::now() + FADE_DURATION)),
            _ => None,
        };
    }

    background.auth().cancel();
    info!("Bye");
    Ok(())
}

async fn run_command(
    controller: &mut ReviewFlowController<ConsoleHost>,
    windows: &ConsoleWindows,
    command: Command,
) {
    match command {
        Command::Key(key) => {
            if controller.handle_key(key).await.propagate {
                println!("(no card on screen, :next to ask for one)");
            }
        }
        Command::Type(text) => {
            for c in text.chars() {
                controller.handle_key(Key::Char(c)).await;
            }
        }
        Command::Login => {
            if let Err(e) = controller.login().await {
                println!("Login failed: {e}");
            }
        }
        Command::Logout => match controller.logout().await {
            Ok(reply) => println!("{}", reply.message),
            Err(e) => println!("Logout failed: {e}"),
        },
        Command::CloseLogin => {
            let closed = windows.close_all();
            println!("Closed {closed} login window(s)");
        }
        Command::Next => controller.present_next().await,
        Command::Fade => {
            controller.on_transition_end();
        }
        Command::Quit => {}
    }
}
