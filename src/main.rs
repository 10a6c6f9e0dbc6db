use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time;

use cortex_chat::app::app::InitProps;
use cortex_chat::app::services::{ActionService, ClipboardService, EventService, ShutdownCoordinator};
use cortex_chat::backend::new_backend;
use cortex_chat::config::verbose;
use cortex_chat::config::{Configuration, init_logger, init_theme};
use cortex_chat::models::{Event, NoticeMessage};
use cortex_chat::session::ChatSession;
use cortex_chat::{
    app::{App, destruct_terminal_for_panic},
    cli::Command,
};
use eyre::Result;
use tokio::{sync::mpsc, task};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Command::new();
    if cmd.version() {
        cmd.print_version();
        return Ok(());
    }

    std::panic::set_hook(Box::new(|panic_info| {
        destruct_terminal_for_panic();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let config = cmd.get_config()?;
    init_logger(&config.log)?;
    Configuration::init(config)?;
    verbose!("[+] Logger initialized");

    let config = Configuration::instance();
    let theme = init_theme(&config.theme)?;
    verbose!("[+] Theme initialized");

    if config.server.endpoint.is_empty() {
        eyre::bail!("No backend endpoint configured");
    }

    verbose!("[+] Connecting to {}", config.server.endpoint);
    let backend = new_backend(&config.server);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let (action_tx, action_rx) = mpsc::unbounded_channel();

    let mut events = EventService::default();

    let mut task_set = task::JoinSet::new();
    let token = CancellationToken::new();
    let pending_tasks = Arc::new(AtomicUsize::new(0));

    let mut action_service = ActionService::new(
        Arc::new(events.event_tx()),
        action_rx,
        backend.clone(),
        token.clone(),
        pending_tasks.clone(),
    );

    task_set.spawn(async move { action_service.start().await });

    verbose!("[+] Fetching semantic models...");
    let mut connected = true;
    let semantic_models = match backend.list_semantic_models().await {
        Ok(models) => {
            verbose!("[+] Fetched {} semantic models", models.len());
            models
        }
        Err(err) => {
            log::warn!("Failed to fetch semantic models: {err}");
            let _ = events.event_tx().send(Event::Notice(NoticeMessage::error(
                "Could not reach the backend, check your connection",
            )));
            connected = false;
            Vec::new()
        }
    };

    verbose!("[+] Fetching conversations...");
    let conversations = match backend.list_conversations().await {
        Ok(conversations) => conversations,
        Err(err) => {
            log::warn!("Failed to fetch conversations: {err}");
            Vec::new()
        }
    };

    let session = ChatSession::new(config.server.mode, semantic_models);

    let mut app = App::new(
        theme,
        action_tx,
        &mut events,
        token.clone(),
        InitProps {
            session,
            conversations,
            connected,
        },
    );

    if let Err(err) = ClipboardService::init() {
        log::warn!("Clipboard service is not available: {err}");
    } else {
        let token_clone = token.clone();
        task_set.spawn(async move { ClipboardService::start(token_clone).await });
    }

    let coordinator = ShutdownCoordinator {
        cancel_token: token.clone(),
        pending_tasks: pending_tasks.clone(),
        shutdown_complete: shutdown_tx,
        timeout: None,
    };

    task_set.spawn(coordinator.wait_for_completion());

    if let Err(err) = app.run().await {
        eprintln!("Error: {}", err);
    }

    match tokio::time::timeout(time::Duration::from_secs(15), shutdown_rx).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => eprintln!("Shutdown error: {}", e),
        Err(_) => eprintln!("Shutdown timeout reached"),
    }

    task_set.abort_all();
    while let Some(res) = task_set.join_next().await {
        match res {
            Ok(_) => {}
            Err(err) => log::error!("Task error: {}", err),
        }
    }

    Ok(())
}
