//! Black-box tests for the session core: a stub of the remote auth API is
//! spawned on an ephemeral port and the real gateway, store, bootstrapper
//! and context are driven over HTTP.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use classconnect_auth::{AccessDecision, AccessPolicy, DenialReason};
use classconnect_client::{ClientConfig, Session, SessionContext, SessionGateway};
use classconnect_core::{AuthError, Identity, Role};
use classconnect_store::CredentialStore;

const TOKEN: &str = "tok-valid";
const PASSWORD: &str = "s3nha-forte";
const RECOVERY_CODE: &str = "REC-7KQ2";

/// How the stub's `auth/me` behaves for the duration of a test.
#[derive(Clone, Copy)]
enum MeMode {
    /// 200 with the stub's user when the bearer token matches, else 401.
    Valid,
    /// Unconditional 401: the token is dead.
    Reject,
    /// Unconditional 500: server trouble, not a credential problem.
    Break,
}

#[derive(Clone)]
struct Stub {
    user: Identity,
    me: MeMode,
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "error": "Credenciais inválidas" })),
    )
}

async fn login_handler(
    State(stub): State<Stub>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    if username == stub.user.username && password == PASSWORD {
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "token": TOKEN,
                "user": serde_json::to_value(&stub.user).unwrap(),
            })),
        )
    } else {
        unauthorized()
    }
}

async fn me_handler(State(stub): State<Stub>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    match stub.me {
        MeMode::Break => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": "erro interno" })),
        ),
        MeMode::Reject => unauthorized(),
        MeMode::Valid => {
            if bearer_ok(&headers) {
                (
                    StatusCode::OK,
                    Json(json!({
                        "success": true,
                        "data": serde_json::to_value(&stub.user).unwrap(),
                    })),
                )
            } else {
                unauthorized()
            }
        }
    }
}

fn bearer_ok(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn change_password_handler(
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !bearer_ok(&headers) {
        return unauthorized();
    }
    if body["senha_atual"].as_str() != Some(PASSWORD) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "Senha atual incorreta" })),
        );
    }
    (StatusCode::OK, Json(json!({ "success": true, "message": "Senha alterada" })))
}

async fn generate_code_handler(
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !bearer_ok(&headers) {
        return unauthorized();
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": {
                "codigo": RECOVERY_CODE,
                "usuario": body["username"],
                "valido_ate": "2026-01-01T00:00:00",
            },
        })),
    )
}

async fn admin_reset_handler(
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !bearer_ok(&headers) {
        return unauthorized();
    }
    if body["nova_senha"].as_str().unwrap_or_default().len() < 6 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "A senha deve ter pelo menos 6 caracteres" })),
        );
    }
    (StatusCode::OK, Json(json!({ "success": true, "message": "Senha resetada" })))
}

async fn use_code_handler(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["codigo"].as_str() == Some(RECOVERY_CODE) {
        (StatusCode::OK, Json(json!({ "success": true, "message": "Senha redefinida" })))
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "Código inválido ou expirado" })),
        )
    }
}

/// Spawn the stub on an ephemeral port; returns the API base URL.
async fn spawn_stub(user: Identity, me: MeMode) -> String {
    let app = Router::new()
        .route("/api/v1/auth/login", post(login_handler))
        .route("/api/v1/auth/me", get(me_handler))
        .route(
            "/api/v1/auth/reset-password/change",
            post(change_password_handler),
        )
        .route(
            "/api/v1/auth/reset-password/generate-code",
            post(generate_code_handler),
        )
        .route("/api/v1/auth/reset-password/admin", post(admin_reset_handler))
        .route("/api/v1/auth/reset-password/use-code", post(use_code_handler))
        .with_state(Stub { user, me });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind ephemeral port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/api/v1")
}

async fn context_for(base_url: &str) -> SessionContext {
    let store = CredentialStore::in_memory().await.unwrap();
    SessionContext::new(SessionGateway::new(ClientConfig::new(base_url), store))
}

fn professor(nome: &str) -> Identity {
    Identity::new(1, "maria", nome, Role::Professor, false).with_professor(7)
}

#[tokio::test]
async fn login_warms_the_store_before_returning() {
    let base_url = spawn_stub(professor("Maria Silva"), MeMode::Valid).await;
    let context = context_for(&base_url).await;

    let identity = context.login("maria", PASSWORD).await.unwrap();
    assert_eq!(identity.nome, "Maria Silva");

    // The store is already warm when login resolves.
    let record = context.gateway().store().load().await.unwrap().unwrap();
    assert_eq!(record.token, TOKEN);
    assert_eq!(record.identity.username, "maria");

    assert!(context.is_authenticated().await);
    assert!(context.is_professor().await);
    assert!(!context.is_admin().await);
}

#[tokio::test]
async fn rejected_login_mutates_nothing() {
    let base_url = spawn_stub(professor("Maria Silva"), MeMode::Valid).await;
    let context = context_for(&base_url).await;

    let err = context.login("maria", "senha-errada").await.unwrap_err();
    assert_eq!(err, AuthError::CredentialInvalid);

    assert_eq!(context.gateway().store().load().await.unwrap(), None);
    assert_eq!(context.user().await, None);
}

#[tokio::test]
async fn unreachable_server_is_a_connection_error() {
    // Nothing is listening here.
    let context = context_for("http://127.0.0.1:9/api/v1").await;

    let err = context.login("maria", PASSWORD).await.unwrap_err();
    assert!(matches!(err, AuthError::Connection(_)), "got {err:?}");
}

#[tokio::test]
async fn blank_credentials_are_rejected_locally() {
    // No server at all: validation must fire before any request is sent.
    let context = context_for("http://127.0.0.1:9/api/v1").await;

    let err = context.login("  ", "").await.unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)), "got {err:?}");
}

#[tokio::test]
async fn bootstrap_with_empty_store_resolves_anonymous() {
    let base_url = spawn_stub(professor("Maria Silva"), MeMode::Valid).await;
    let context = context_for(&base_url).await;

    assert!(context.is_loading().await);
    let session = context.bootstrap().await;

    assert_eq!(session, Session::Anonymous);
    assert!(!context.is_loading().await);
    assert!(!context.is_authenticated().await);
}

#[tokio::test]
async fn bootstrap_adopts_the_server_identity_over_the_cached_one() {
    let base_url = spawn_stub(professor("Maria Renamed"), MeMode::Valid).await;
    let context = context_for(&base_url).await;

    context
        .gateway()
        .store()
        .save(TOKEN, &professor("Maria Old"))
        .await
        .unwrap();

    let session = context.bootstrap().await;
    let Session::Authenticated(identity) = session else {
        panic!("expected authenticated session");
    };
    assert_eq!(identity.nome, "Maria Renamed");

    // The refreshed snapshot was persisted back, token unchanged.
    let record = context.gateway().store().load().await.unwrap().unwrap();
    assert_eq!(record.token, TOKEN);
    assert_eq!(record.identity.nome, "Maria Renamed");
}

#[tokio::test]
async fn bootstrap_keeps_the_cached_identity_when_the_server_breaks() {
    let base_url = spawn_stub(professor("Maria Silva"), MeMode::Break).await;
    let context = context_for(&base_url).await;

    context
        .gateway()
        .store()
        .save(TOKEN, &professor("Maria Cached"))
        .await
        .unwrap();

    let session = context.bootstrap().await;
    let Session::Authenticated(identity) = session else {
        panic!("expected degraded authenticated session");
    };
    assert_eq!(identity.nome, "Maria Cached");

    // Server trouble must not invalidate local credentials.
    let record = context.gateway().store().load().await.unwrap().unwrap();
    assert_eq!(record.token, TOKEN);
    assert_eq!(record.identity.nome, "Maria Cached");
}

#[tokio::test]
async fn bootstrap_discards_a_proven_invalid_token() {
    let base_url = spawn_stub(professor("Maria Silva"), MeMode::Reject).await;
    let context = context_for(&base_url).await;

    context
        .gateway()
        .store()
        .save("tok-stale", &professor("Maria Cached"))
        .await
        .unwrap();

    let session = context.bootstrap().await;
    assert_eq!(session, Session::Anonymous);

    // The 401 cleared the pair before the failure surfaced.
    assert_eq!(context.gateway().store().load().await.unwrap(), None);
}

#[tokio::test]
async fn logout_empties_store_and_nulls_identity() {
    let base_url = spawn_stub(professor("Maria Silva"), MeMode::Valid).await;
    let context = context_for(&base_url).await;

    context.login("maria", PASSWORD).await.unwrap();
    context.logout().await;

    assert_eq!(context.user().await, None);
    assert_eq!(context.session().await, Session::Anonymous);
    assert_eq!(context.gateway().store().load().await.unwrap(), None);

    // A second logout is harmless.
    context.logout().await;
}

#[tokio::test]
async fn readonly_manager_is_vetoed_on_write_destinations() {
    let gerente = Identity::new(9, "recepcao", "Recepcao", Role::Gerente, true);
    let base_url = spawn_stub(gerente, MeMode::Valid).await;
    let context = context_for(&base_url).await;

    context.login("recepcao", PASSWORD).await.unwrap();
    assert!(context.is_gerente().await);
    assert!(context.is_readonly().await);

    // Read-only veto fires before role membership would.
    let write_policy = AccessPolicy::roles([Role::Admin]).with_write();
    assert_eq!(
        context.check_access(&write_policy).await,
        AccessDecision::Deny(DenialReason::ReadOnly)
    );

    // An empty allowlist admits any authenticated identity.
    assert_eq!(
        context.check_access(&AccessPolicy::authenticated()).await,
        AccessDecision::Allow
    );

    // Role membership still applies to read destinations.
    assert_eq!(
        context.check_access(&AccessPolicy::roles([Role::Admin])).await,
        AccessDecision::Deny(DenialReason::RoleNotPermitted)
    );
}

#[tokio::test]
async fn change_password_rides_the_authenticated_channel() {
    let base_url = spawn_stub(professor("Maria Silva"), MeMode::Valid).await;
    let context = context_for(&base_url).await;

    context.login("maria", PASSWORD).await.unwrap();
    context
        .gateway()
        .change_password(PASSWORD, "s3nha-nova")
        .await
        .unwrap();

    // A password change does not invalidate the current session.
    assert!(context.is_authenticated().await);
    assert!(context.gateway().store().load().await.unwrap().is_some());
}

#[tokio::test]
async fn wrong_current_password_surfaces_without_clearing_credentials() {
    let base_url = spawn_stub(professor("Maria Silva"), MeMode::Valid).await;
    let context = context_for(&base_url).await;

    context.login("maria", PASSWORD).await.unwrap();
    let err = context
        .gateway()
        .change_password("senha-errada", "s3nha-nova")
        .await
        .unwrap_err();

    // A 400 is the server rejecting input, not the token; credentials stay.
    assert!(matches!(err, AuthError::Validation(_)), "got {err:?}");
    assert!(context.gateway().store().load().await.unwrap().is_some());
}

#[tokio::test]
async fn stale_token_on_any_authenticated_call_clears_the_store() {
    let base_url = spawn_stub(professor("Maria Silva"), MeMode::Valid).await;
    let context = context_for(&base_url).await;

    context
        .gateway()
        .store()
        .save("tok-stale", &professor("Maria Cached"))
        .await
        .unwrap();

    // Not just auth/me: every call riding the authenticated channel treats a
    // 401 as proof the token is dead.
    let err = context
        .gateway()
        .change_password(PASSWORD, "s3nha-nova")
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::CredentialInvalid);
    assert_eq!(context.gateway().store().load().await.unwrap(), None);
}

#[tokio::test]
async fn admin_reset_rides_the_authenticated_channel() {
    let base_url = spawn_stub(professor("Maria Silva"), MeMode::Valid).await;
    let context = context_for(&base_url).await;

    context.login("maria", PASSWORD).await.unwrap();
    context
        .gateway()
        .reset_password_admin("joao", "s3nha-nova")
        .await
        .unwrap();

    // Resetting someone else's password leaves this session alone.
    assert!(context.is_authenticated().await);
    assert!(context.gateway().store().load().await.unwrap().is_some());

    // The server's password rules surface as a validation error.
    let err = context
        .gateway()
        .reset_password_admin("joao", "curta")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)), "got {err:?}");

    // Blank input is rejected before any request is sent.
    let err = context
        .gateway()
        .reset_password_admin("  ", "s3nha-nova")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)), "got {err:?}");
}

#[tokio::test]
async fn recovery_code_round_trip() {
    let base_url = spawn_stub(professor("Maria Silva"), MeMode::Valid).await;
    let context = context_for(&base_url).await;

    context.login("maria", PASSWORD).await.unwrap();
    let code = context
        .gateway()
        .generate_recovery_code("maria")
        .await
        .unwrap();
    assert_eq!(code.codigo, RECOVERY_CODE);
    assert_eq!(code.usuario, "maria");

    // The code is the credential; no session needed, and it is upper-cased
    // before sending.
    let anonymous = context_for(&base_url).await;
    anonymous
        .gateway()
        .reset_password_with_code(&RECOVERY_CODE.to_lowercase(), "s3nha-nova")
        .await
        .unwrap();

    let err = anonymous
        .gateway()
        .reset_password_with_code("REC-XXXX", "s3nha-nova")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)), "got {err:?}");
}
