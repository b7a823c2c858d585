//! HTTP control API and interaction ingress

use crate::discord::interactions::{parse_interaction, response_body, Inbound};
use crate::discord::signature::{SignatureVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::panel::PanelRenderer;
use crate::platform::{ChatPlatform, ComponentInteraction, InteractionReply, InteractionResponse};
use crate::rules::RuleStore;
use crate::tickets::TicketController;
use crate::types::RuleDocument;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, info, warn};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server address
    pub addr: SocketAddr,
    /// Directory of static web assets served as the fallback route
    pub web_dir: PathBuf,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            addr: ([0, 0, 0, 0], 5000).into(),
            web_dir: PathBuf::from("web"),
        }
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub rules: Arc<RuleStore>,
    pub panel: Arc<PanelRenderer>,
    pub platform: Arc<dyn ChatPlatform>,
    pub tickets: Arc<TicketController>,
    pub verifier: Arc<SignatureVerifier>,
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Build router
    pub fn build_router(state: AppState, web_dir: PathBuf) -> Router {
        Router::new()
            // Rules management
            .route("/api/update-rules", post(update_rules_handler))
            // Connection probe
            .route("/api/bot-status", get(bot_status_handler))
            // Platform events
            .route("/api/interactions", post(interactions_handler))
            .with_state(state)
            .fallback_service(ServeDir::new(web_dir))
            .layer(TraceLayer::new_for_http())
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        let router = Self::build_router(self.state, self.config.web_dir);
        let listener = tokio::net::TcpListener::bind(self.config.addr).await?;
        info!("API server listening on http://{}", self.config.addr);
        axum::serve(listener, router).await?;
        Ok(())
    }
}

/// Replace the rules document and republish the panel
async fn update_rules_handler(
    State(state): State<AppState>,
    Json(rules): Json<RuleDocument>,
) -> impl IntoResponse {
    if !state.rules.save(&rules).await {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Erro ao salvar regras" })),
        );
    }

    state.panel.publish().await;
    (
        StatusCode::OK,
        Json(json!({ "message": "Regras atualizadas com sucesso" })),
    )
}

#[derive(Debug, Serialize)]
struct BotStatusResponse {
    online: bool,
}

async fn bot_status_handler(State(state): State<AppState>) -> Json<BotStatusResponse> {
    Json(BotStatusResponse {
        online: state.platform.is_online(),
    })
}

/// Verify, decode and dispatch an inbound interaction
async fn interactions_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let timestamp = headers.get(TIMESTAMP_HEADER).and_then(|v| v.to_str().ok());
    let (Some(signature), Some(timestamp)) = (signature, timestamp) else {
        warn!("Interaction request without signature headers");
        return StatusCode::UNAUTHORIZED.into_response();
    };
    if let Err(e) = state.verifier.verify(timestamp, &body, signature) {
        warn!("Rejected interaction request: {}", e);
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let response = match parse_interaction(&body) {
        Ok(Inbound::Ping) => InteractionResponse::Pong,
        Ok(Inbound::Component(interaction)) => dispatch(state.tickets.clone(), interaction).await,
        Ok(Inbound::Unsupported) => InteractionResponse::DeferredUpdate,
        Err(e) => {
            warn!("Malformed interaction payload: {}", e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    Json(response_body(&response)).into_response()
}

/// Run the controller detached and answer with its first reply
///
/// The controller keeps working after replying (welcome message, topic), so
/// it runs on its own task; the HTTP response only waits for the reply.
async fn dispatch(
    tickets: Arc<TicketController>,
    interaction: ComponentInteraction,
) -> InteractionResponse {
    let (mut reply, rx) = InteractionReply::channel();
    tokio::spawn(async move {
        let outcome = tickets.handle_component(&interaction, &mut reply).await;
        debug!("Interaction {:?} finished: {:?}", interaction.custom_id, outcome);
    });

    rx.await.unwrap_or(InteractionResponse::DeferredUpdate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::CATEGORY_SELECT_ID;
    use crate::platform::testing::InMemoryPlatform;
    use crate::tickets::TicketSettings;
    use crate::types::{ChannelId, RoleId, UserId};
    use axum::body::Body;
    use axum::http::Request;
    use ed25519_dalek::{Signer, SigningKey};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const PANEL: ChannelId = ChannelId(500);
    const SUPPORT: RoleId = RoleId(20);

    struct TestApp {
        dir: TempDir,
        platform: Arc<InMemoryPlatform>,
        rules: Arc<RuleStore>,
        key: SigningKey,
        router: Router,
    }

    fn app_with_rules_path(rules_path: Option<PathBuf>) -> TestApp {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("web")).unwrap();
        std::fs::write(dir.path().join("web").join("index.html"), "<h1>painel</h1>").unwrap();

        let rules_path = rules_path.unwrap_or_else(|| dir.path().join("rules.json"));
        let rules = Arc::new(RuleStore::new(rules_path));
        let platform = Arc::new(InMemoryPlatform::new());
        platform.add_channel(PANEL, "tickets");
        platform.add_role(SUPPORT, "Suporte");
        platform.add_member(UserId(30), "maria", vec![]);

        let key = SigningKey::from_bytes(&[3u8; 32]);
        let state = AppState {
            rules: rules.clone(),
            panel: Arc::new(PanelRenderer::new(platform.clone(), rules.clone(), PANEL)),
            platform: platform.clone(),
            tickets: Arc::new(TicketController::new(
                platform.clone(),
                rules.clone(),
                TicketSettings {
                    parent_category: ChannelId(10),
                    support_role: SUPPORT,
                },
            )),
            verifier: Arc::new(SignatureVerifier::new(key.verifying_key())),
        };
        let router = ApiServer::build_router(state, dir.path().join("web"));

        TestApp {
            dir,
            platform,
            rules,
            key,
            router,
        }
    }

    fn app() -> TestApp {
        app_with_rules_path(None)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn signed_interaction(key: &SigningKey, body: &str) -> Request<Body> {
        let timestamp = "1700000000";
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body.as_bytes());
        let signature = hex::encode(key.sign(&message).to_bytes());

        Request::post("/api/interactions")
            .header("content-type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .header(TIMESTAMP_HEADER, timestamp)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn update_rules_request(body: &str) -> Request<Body> {
        Request::post("/api/update-rules")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_update_rules_persists_and_republishes() {
        let app = app();
        let response = app
            .router
            .oneshot(update_rules_request(
                r#"{"panelRules":["A","B"],"ticketRules":["C"]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"message": "Regras atualizadas com sucesso"})
        );
        assert_eq!(
            app.rules.load().await,
            RuleDocument::new(vec!["A".into(), "B".into()], vec!["C".into()])
        );

        let log = app.platform.log();
        assert_eq!(log.messages.len(), 1);
        assert_eq!(log.messages[0].0, PANEL);
        let description = &log.messages[0].1.embeds[0].description;
        let a = description.find("A\nB").unwrap();
        assert!(a > 0);
    }

    #[tokio::test]
    async fn test_update_rules_failure_does_not_republish() {
        let dir = TempDir::new().unwrap();
        let app = app_with_rules_path(Some(dir.path().join("missing").join("rules.json")));

        let response = app
            .router
            .oneshot(update_rules_request(r#"{"panelRules":["A"],"ticketRules":[]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Erro ao salvar regras"})
        );
        assert!(app.platform.log().messages.is_empty());
    }

    #[tokio::test]
    async fn test_update_rules_requires_complete_document() {
        let app = app();
        let response = app
            .router
            .oneshot(update_rules_request(r#"{"panelRules":["A"]}"#))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
        assert!(!app.rules.path().exists());
        assert!(app.platform.log().messages.is_empty());
    }

    #[tokio::test]
    async fn test_bot_status_reports_connection() {
        let app = app();
        app.platform.set_online(false);

        let response = app
            .router
            .clone()
            .oneshot(Request::get("/api/bot-status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"online": false}));

        app.platform.set_online(true);
        let response = app
            .router
            .oneshot(Request::get("/api/bot-status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await, json!({"online": true}));
    }

    #[tokio::test]
    async fn test_static_assets_are_served() {
        let app = app();
        let response = app
            .router
            .oneshot(Request::get("/index.html").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"<h1>painel</h1>");
        drop(app.dir);
    }

    #[tokio::test]
    async fn test_unsigned_interaction_is_rejected() {
        let app = app();
        let response = app
            .router
            .oneshot(
                Request::post("/api/interactions")
                    .body(Body::from(r#"{"type":1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrongly_signed_interaction_is_rejected() {
        let app = app();
        let impostor = SigningKey::from_bytes(&[9u8; 32]);
        let response = app
            .router
            .oneshot(signed_interaction(&impostor, r#"{"type":1}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_ping_gets_pong() {
        let app = app();
        let response = app
            .router
            .oneshot(signed_interaction(&app.key, r#"{"type":1}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"type": 1}));
    }

    #[tokio::test]
    async fn test_category_select_replies_with_created_ticket() {
        let app = app();
        let body = json!({
            "type": 3,
            "guild_id": "1",
            "channel_id": PANEL.to_string(),
            "member": {"user": {"id": "30", "username": "maria"}, "roles": []},
            "data": {"custom_id": CATEGORY_SELECT_ID, "component_type": 3, "values": ["duvidas"]}
        })
        .to_string();

        let response = app
            .router
            .oneshot(signed_interaction(&app.key, &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["type"], 4);
        assert_eq!(json["data"]["flags"], 64);
        assert!(json["data"]["content"]
            .as_str()
            .unwrap()
            .starts_with("Ticket criado com sucesso!"));
        assert_eq!(app.platform.log().created.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_interaction_is_bad_request() {
        let app = app();
        let response = app
            .router
            .oneshot(signed_interaction(&app.key, "not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
