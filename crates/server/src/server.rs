use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{Interpreter, breakdown, chat, expenses, groups, member, settlements};
use ledger::Ledger;

#[derive(Clone)]
pub struct ServerState {
    pub ledger: Arc<Ledger>,
    pub db: DatabaseConnection,
    pub interpreter: Option<Arc<Interpreter>>,
}

async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let member: Option<member::Model> = member::Entity::find()
        .filter(member::Column::Name.eq(auth_header.username()))
        .filter(member::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(member) = member else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(member);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/groups", post(groups::create))
        .route("/groups/{id}", get(groups::get))
        .route("/groups/{id}/members", post(groups::add_member))
        .route(
            "/groups/{id}/expenses",
            post(expenses::record).get(expenses::list),
        )
        .route("/expenses/{id}", get(expenses::get_detail))
        .route("/groups/{id}/breakdown", get(breakdown::group))
        .route("/breakdown", get(breakdown::member))
        .route(
            "/groups/{id}/settlements/proposal",
            get(settlements::propose),
        )
        .route("/groups/{id}/settlements", post(settlements::record))
        .route("/groups/{id}/chat", post(chat::send))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        // Registered after the auth layer: the one public endpoint.
        .route("/members", post(member::register))
        .with_state(state)
}

pub async fn run(ledger: Ledger, db: DatabaseConnection, interpreter: Option<Interpreter>) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(ledger, db, interpreter, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    ledger: Ledger,
    db: DatabaseConnection,
    interpreter: Option<Interpreter>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        ledger: Arc::new(ledger),
        db,
        interpreter: interpreter.map(Arc::new),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    ledger: Ledger,
    db: DatabaseConnection,
    interpreter: Option<Interpreter>,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(ledger, db, interpreter, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
