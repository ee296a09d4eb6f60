//! Wires configuration, tracing, the connection registry, reconnect broker, dispatcher
//! and every mode manager behind one axum HTTP/WS listener (§5, §6), plus the admin
//! endpoints and graceful shutdown the teacher's `main.rs` covers with `/enlist` and
//! `/reload`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::stream::StreamExt;
use futures_util::SinkExt;
use mode_arena::ArenaManager;
use mode_board::BoardManager;
use mode_openworld::OpenWorldManager;
use mode_rhythm::RhythmManager;
use mode_warfront::WarfrontManager;
use protocol::SessionId;
use serde_json::json;
use sim_core::registry::ContentRegistry;
use server_core::{
    Broadcaster, Config, ConnectionRegistry, Dispatcher, InMemoryPersistenceAdapter, ModeRouter,
    NoopPersistenceAdapter, PersistenceAdapter, ReconnectBroker, SharedConnectionRegistry,
    TickScheduler, Watchdog,
};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct AppState {
    config: Config,
    connections: SharedConnectionRegistry,
    reconnects: Mutex<ReconnectBroker>,
    dispatcher: Dispatcher,
    board: Arc<BoardManager>,
    warfront: Arc<WarfrontManager>,
    arena: Arc<ArenaManager>,
    rhythm: Arc<RhythmManager>,
    open_world: Arc<OpenWorldManager>,
    #[allow(dead_code)]
    persistence: Arc<dyn PersistenceAdapter>,
    started_at: Instant,
}

impl AppState {
    async fn room_count(&self) -> usize {
        self.board.room_count().await
            + self.warfront.room_count().await
            + self.arena.room_count().await
            + self.rhythm.room_count().await
            + self.open_world.room_count().await
    }

    async fn notify_session_disconnected(&self, session_id: &SessionId) {
        self.board.handle_session_disconnected(session_id).await;
        self.warfront.handle_session_disconnected(session_id).await;
        self.arena.handle_session_disconnected(session_id).await;
        self.rhythm.handle_session_disconnected(session_id).await;
        self.open_world.handle_session_disconnected(session_id).await;
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    let config = Config::from_env();
    let connections = Arc::new(ConnectionRegistry::new());
    let broadcaster: Arc<dyn Broadcaster> = connections.clone();

    let registry = Arc::new(ContentRegistry::default());
    let board = Arc::new(BoardManager::new(registry, broadcaster.clone()));
    let warfront = Arc::new(WarfrontManager::new(broadcaster.clone()));
    let arena = Arc::new(ArenaManager::new(broadcaster.clone()));
    let rhythm = Arc::new(RhythmManager::new(broadcaster.clone()));
    let open_world = Arc::new(OpenWorldManager::new(broadcaster.clone()));

    let dispatcher = Dispatcher::new(
        board.clone() as Arc<dyn ModeRouter>,
        open_world.clone() as Arc<dyn ModeRouter>,
        arena.clone() as Arc<dyn ModeRouter>,
        warfront.clone() as Arc<dyn ModeRouter>,
        rhythm.clone() as Arc<dyn ModeRouter>,
    );

    let persistence: Arc<dyn PersistenceAdapter> = if config.firebase_service_account_json.is_some() {
        Arc::new(InMemoryPersistenceAdapter::new())
    } else {
        Arc::new(NoopPersistenceAdapter)
    };

    let state = Arc::new(AppState {
        config: config.clone(),
        connections: connections.clone(),
        reconnects: Mutex::new(ReconnectBroker::new()),
        dispatcher,
        board: board.clone(),
        warfront: warfront.clone(),
        arena: arena.clone(),
        rhythm: rhythm.clone(),
        open_world: open_world.clone(),
        persistence,
        started_at: Instant::now(),
    });

    let board_ticker = {
        let board = board.clone();
        TickScheduler::start(mode_board::constants::TICK_RATE_HZ, move || {
            let board = board.clone();
            async move { board.tick_all().await }
        })
    };
    let warfront_ticker = {
        let warfront = warfront.clone();
        TickScheduler::start(mode_warfront::constants::TICK_RATE_HZ, move || {
            let warfront = warfront.clone();
            async move { warfront.tick_all().await }
        })
    };
    let arena_ticker = {
        let arena = arena.clone();
        TickScheduler::start(mode_arena::constants::TICK_RATE_HZ, move || {
            let arena = arena.clone();
            async move { arena.tick_all().await }
        })
    };
    let rhythm_ticker = {
        let rhythm = rhythm.clone();
        TickScheduler::start(mode_rhythm::constants::TICK_RATE_HZ, move || {
            let rhythm = rhythm.clone();
            async move {
                rhythm.tick_all().await;
                rhythm.tick_matchmaking().await;
            }
        })
    };
    let open_world_ticker = {
        let open_world = open_world.clone();
        TickScheduler::start(mode_openworld::constants::TICK_RATE_HZ, move || {
            let open_world = open_world.clone();
            async move { open_world.tick_all().await }
        })
    };

    let heartbeat_connections = connections.clone();
    let heartbeat_state = state.clone();
    let heartbeat = TickScheduler::start(1, move || {
        let connections = heartbeat_connections.clone();
        let state = heartbeat_state.clone();
        async move {
            for session_id in connections.sweep_heartbeat().await {
                tracing::info!(session = %session_id, "client timed out");
                connections.remove(&session_id).await;
                state.notify_session_disconnected(&session_id).await;
            }
        }
    });

    let watchdog_state = state.clone();
    let watchdog = Watchdog::start(Duration::from_secs(1200), move || {
        let state = watchdog_state.clone();
        async move {
            state.board.sweep_empty_rooms().await;
            state.warfront.sweep_empty_rooms().await;
            state.arena.sweep_empty_rooms().await;
            state.rhythm.sweep_empty_rooms().await;
            state.open_world.sweep_empty_rooms().await;
        }
    });

    let cors = CorsLayer::new().allow_origin(Any).allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/ws", get(websocket_handler))
        .layer(cors)
        .with_state(state.clone());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    tracing::info!(%addr, "relay server listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(state.clone()));
    let exit_code = match server.await {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!(%err, "server exited with error");
            1
        }
    };

    board_ticker.stop();
    warfront_ticker.stop();
    arena_ticker.stop();
    rhythm_ticker.stop();
    open_world_ticker.stop();
    heartbeat.stop();
    watchdog.stop();

    std::process::exit(exit_code);
}

/// Waits for SIGINT/SIGTERM, then broadcasts `server_shutdown` and gives connections up
/// to 10s to drain before axum forces the listener closed (§5).
async fn shutdown_signal(state: Arc<AppState>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, notifying clients");
    let shutdown_frame = json!({ "type": "server_shutdown" }).to_string();
    state.connections.broadcast(shutdown_frame, None).await;
    tokio::time::sleep(Duration::from_secs(10)).await;
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = server_core::admin::HealthResponse::new(state.connections.len().await, state.room_count().await);
    (StatusCode::OK, Json(response))
}

async fn stats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = server_core::admin::StatsResponse::new(
        state.connections.len().await,
        state.room_count().await,
        state.started_at.elapsed().as_secs(),
        0,
    );
    Json(response)
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    headers: axum::http::HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let origin = headers.get(axum::http::header::ORIGIN).and_then(|v| v.to_str().ok());
    if !state.config.origin_allowed(origin) {
        return (StatusCode::FORBIDDEN, "origin not allowed").into_response();
    }
    ws.on_upgrade(move |socket| websocket(socket, state)).into_response()
}

async fn websocket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = tokio::sync::mpsc::channel::<String>(protocol::CHANNEL_BUFFER_SIZE);

    let session_id =
        SessionId::generate(server_core::connection::now_millis() as u128, &format!("{:x}", rand::random::<u32>()));
    state.connections.register(session_id.clone(), tx).await;

    let token = {
        let mut reconnects = state.reconnects.lock().await;
        reconnects.issue(session_id.clone(), state.config.reconnect_grace_period, &format!("{:x}", rand::random::<u32>()))
    };
    let connected_frame = json!({
        "type": "connected",
        "sessionId": session_id.0,
        "reconnectToken": token.0,
    })
    .to_string();
    state.connections.send_to(&session_id, connected_frame).await;

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        state.connections.touch(&session_id).await;
                        if let Err(err) = state.dispatcher.dispatch(session_id.clone(), &text).await {
                            tracing::debug!(session = %session_id, code = %err.code, "dispatch error");
                            let frame = serde_json::to_string(&err.to_frame()).unwrap_or_default();
                            state.connections.send_to(&session_id, frame).await;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        state.connections.mark_alive(&session_id).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
            _ = &mut writer => break,
        }
    }

    state.connections.remove(&session_id).await;
    state.notify_session_disconnected(&session_id).await;
    writer.abort();
}
