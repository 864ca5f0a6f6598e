//! Servidor web Axum com WebSocket para marcação de entidades por gazetteers
//!
//! Variáveis de ambiente:
//! - `GAZETTEER_DIR`: diretório com os arquivos `*.txt` (padrão: `gazetteers`)
//! - `GAZETTEER_CONFIG`: arquivo JSON opcional com a `MatcherConfig`
//! - `GAZETTEER_ADDR`: endereço de escuta (padrão: `0.0.0.0:3000`)
//! - `RUST_LOG`: filtro de log (padrão: `info`)

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use gazetteer_core::{Error, GazetteerPipeline, MatcherConfig, PipelineEvent};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Estado compartilhado da aplicação
struct AppState {
    pipeline: GazetteerPipeline,
}

/// Requisição de análise: tokens prontos ou texto separado por espaços.
#[derive(Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    tokens: Option<Vec<String>>,
    #[serde(default)]
    text: Option<String>,
}

impl AnalyzeRequest {
    fn into_tokens(self) -> Vec<String> {
        match (self.tokens, self.text) {
            (Some(tokens), _) => tokens,
            (None, Some(text)) => text.split_whitespace().map(str::to_string).collect(),
            (None, None) => Vec::new(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::var("GAZETTEER_CONFIG") {
        Ok(path) => MatcherConfig::from_json_file(path)?,
        Err(_) => MatcherConfig::default(),
    };
    let dir = std::env::var("GAZETTEER_DIR").unwrap_or_else(|_| "gazetteers".to_string());
    let addr = std::env::var("GAZETTEER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let pipeline = GazetteerPipeline::from_dir(&dir, config)?;
    info!(dir = %dir, phrases = pipeline.index().len(), "gazetteers carregados");
    let state = Arc::new(AppState { pipeline });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/analyze", post(analyze_handler))
        .route("/tags", get(tags_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Servidor de gazetteers iniciado em http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// Análise via HTTP POST (sem streaming)
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Response {
    let tokens = req.into_tokens();
    if tokens.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Nenhum token informado");
    }

    // O pipeline é síncrono: roda fora do runtime, como no WebSocket
    let outcome = tokio::task::spawn_blocking(move || state.pipeline.analyze(&tokens)).await;

    match outcome {
        Ok(Ok(result)) => Json(result).into_response(),
        Ok(Err(err @ Error::TooManyCandidates { .. })) => {
            warn!(%err, "análise rejeitada");
            error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        Ok(Err(err)) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        Err(err) => {
            warn!(%err, "tarefa de análise falhou");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Falha na tarefa de análise")
        }
    }
}

/// Tags conhecidas pelo índice carregado
async fn tags_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tags: Vec<String> = state
        .pipeline
        .index()
        .tags()
        .into_iter()
        .map(str::to_string)
        .collect();
    Json(tags)
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Lógica do WebSocket: recebe tokens, executa o pipeline e envia os eventos
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                // JSON {tokens} ou {text}; senão usa a mensagem como texto puro
                let tokens = match serde_json::from_str::<AnalyzeRequest>(&text) {
                    Ok(req) => req.into_tokens(),
                    Err(_) => text.split_whitespace().map(str::to_string).collect(),
                };
                if tokens.is_empty() {
                    continue;
                }

                info!(tokens = tokens.len(), "analisando via WebSocket");

                // O pipeline é síncrono: roda fora do runtime e coleta os eventos
                let (tx, rx) = std::sync::mpsc::channel::<PipelineEvent>();
                let state_for_thread = Arc::clone(&state);
                let handle = tokio::task::spawn_blocking(move || {
                    state_for_thread.pipeline.analyze_streaming(&tokens, tx);
                });
                if let Err(err) = handle.await {
                    warn!(%err, "tarefa de análise falhou");
                    continue;
                }

                let events: Vec<PipelineEvent> = rx.try_iter().collect();
                for event in &events {
                    if let Ok(json) = serde_json::to_string(event) {
                        if socket.send(Message::Text(json)).await.is_err() {
                            return; // cliente desconectou
                        }
                    }
                }
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}
