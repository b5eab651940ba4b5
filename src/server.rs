use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION, CONTENT_TYPE},
        request, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, RequestPartsExt as _, Router,
};
use axum_extra::TypedHeader;
use derive_more::From;
use headers::{authorization::Bearer, Authorization};
use jsonwebtoken::{
    decode, encode, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::{
    admin::{self, Desk, Mode},
    api,
    catalog::{self, Catalog},
    config,
    db::Ticket,
    interaction::{Interaction, Notice},
    repo::{self, Repository},
};

pub type SharedAppState = Arc<AppState>;

pub struct AppState {
    repo: Arc<dyn Repository>,

    admin_password: String,

    jwt_expiration_time: Duration,

    jwt_decoding_key: DecodingKey,

    jwt_encoding_key: EncodingKey,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn Repository>,
        admin: config::Admin,
        jwt: &config::Jwt,
    ) -> Self {
        Self {
            repo,
            admin_password: admin.password,
            jwt_expiration_time: jwt.expiration_time,
            jwt_decoding_key: DecodingKey::from_secret(jwt.secret.as_bytes()),
            jwt_encoding_key: EncodingKey::from_secret(jwt.secret.as_bytes()),
        }
    }
}

pub fn router(
    state: AppState,
    cors: &config::Cors,
) -> Result<Router, InvalidHeaderValue> {
    let origins = cors
        .allowed_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_origin(origins);

    Ok(Router::new()
        .route("/options", get(options))
        .route("/tickets", get(list_tickets))
        .route("/tickets/:id/buy", post(buy_ticket))
        .route("/admin", get(dashboard))
        .route("/admin/auth", post(auth))
        .route("/admin/tickets", post(save_ticket))
        .route(
            "/admin/tickets/:id",
            put(update_ticket).delete(delete_ticket),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state)))
}

async fn options() -> Json<api::Options> {
    Json(api::Options::default())
}

#[derive(Deserialize)]
struct SearchInput {
    from: Option<String>,
    to: Option<String>,
}

async fn list_tickets(
    State(state): State<SharedAppState>,
    Query(SearchInput { from, to }): Query<SearchInput>,
) -> Result<Json<api::ticket::View>, ListTicketsError> {
    use ListTicketsError as E;

    let mut catalog = Catalog::load(state.repo.as_ref()).await?;
    if from.is_some() || to.is_some() {
        catalog
            .search(
                from.as_deref().unwrap_or_default(),
                to.as_deref().unwrap_or_default(),
            )
            .map_err(E::InvalidRoute)?;
    }

    Ok(Json(api::ticket::View::from(&catalog)))
}

#[derive(Debug, From)]
pub enum ListTicketsError {
    #[from]
    DbError(repo::Error),
    InvalidRoute(Notice),
}

impl IntoResponse for ListTicketsError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidRoute(notice) => {
                (StatusCode::BAD_REQUEST, notice.to_string()).into_response()
            }
            Self::DbError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[derive(Deserialize)]
struct BuyInput {
    #[serde(default)]
    username: Option<String>,
}

/// Answers the purchase flow from the request body and keeps the notices
/// for the response.
struct RequestInteraction {
    username: Option<String>,
    notices: Vec<Notice>,
}

impl Interaction for RequestInteraction {
    fn buyer_name(&mut self, _: &Ticket) -> Option<String> {
        self.username.take()
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

async fn buy_ticket(
    State(state): State<SharedAppState>,
    Path(id): Path<api::ticket::Id>,
    Json(BuyInput { username }): Json<BuyInput>,
) -> Result<Json<api::ticket::Purchased>, BuyTicketError> {
    let repo = state.repo.as_ref();

    let mut catalog = Catalog::load(repo).await?;
    let mut interaction = RequestInteraction {
        username,
        notices: Vec::new(),
    };
    let purchased = catalog.buy(repo, id, &mut interaction).await?;

    Ok(Json(api::ticket::Purchased {
        ticket: catalog
            .tickets()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .map(api::Ticket::from),
        remaining: purchased.remaining,
        notice: interaction.notices.last().map(|n| n.to_string()),
    }))
}

#[derive(Debug, From)]
pub enum BuyTicketError {
    #[from]
    DbError(repo::Error),
    #[from]
    Buy(catalog::BuyError),
}

impl IntoResponse for BuyTicketError {
    fn into_response(self) -> Response {
        use catalog::BuyError as E;

        match self {
            Self::Buy(E::NotListed(_)) => {
                StatusCode::NOT_FOUND.into_response()
            }
            Self::Buy(E::SoldOut(_)) => StatusCode::CONFLICT.into_response(),
            Self::Buy(E::NoBuyerName) => {
                StatusCode::BAD_REQUEST.into_response()
            }
            Self::Buy(E::Backend(_)) | Self::DbError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Notice::PurchaseFailed.to_string(),
            )
                .into_response(),
        }
    }
}

#[derive(Deserialize)]
struct AuthInput {
    password: String,
}

async fn auth(
    State(state): State<SharedAppState>,
    Json(AuthInput { password }): Json<AuthInput>,
) -> Result<String, AuthError> {
    use AuthError as E;

    if password != state.admin_password {
        warn!("admin password rejected");
        return Err(E::WrongPassword);
    }

    let expires_at = OffsetDateTime::now_utc() + state.jwt_expiration_time;
    encode(
        &Header::default(),
        &AdminClaims {
            exp: expires_at.unix_timestamp(),
        },
        &state.jwt_encoding_key,
    )
    .map_err(|_| E::InvalidToken)
}

#[derive(Debug)]
pub enum AuthError {
    InvalidToken,
    WrongPassword,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidToken => StatusCode::UNAUTHORIZED.into_response(),
            Self::WrongPassword => {
                (StatusCode::FORBIDDEN, Notice::WrongPassword.to_string())
                    .into_response()
            }
        }
    }
}

async fn dashboard(
    State(state): State<SharedAppState>,
    _: AdminClaims,
) -> Result<Json<api::Dashboard>, AdminError> {
    let desk = Desk::load(state.repo.as_ref()).await?;
    Ok(Json(api::Dashboard::from(&desk)))
}

async fn save_ticket(
    State(state): State<SharedAppState>,
    _: AdminClaims,
    Json(form): Json<api::ticket::Form>,
) -> Result<(StatusCode, Json<api::ticket::List>), AdminError> {
    save(&state, form).await
}

async fn update_ticket(
    State(state): State<SharedAppState>,
    _: AdminClaims,
    Path(id): Path<api::ticket::Id>,
    Json(form): Json<api::ticket::Form>,
) -> Result<(StatusCode, Json<api::ticket::List>), AdminError> {
    save(
        &state,
        api::ticket::Form {
            id: Some(id),
            ..form
        },
    )
    .await
}

async fn save(
    state: &AppState,
    form: api::ticket::Form,
) -> Result<(StatusCode, Json<api::ticket::List>), AdminError> {
    let mut desk = Desk::default();
    desk.set_form(form);

    let status = match desk.save(state.repo.as_ref()).await? {
        Mode::Create => StatusCode::CREATED,
        Mode::Edit(_) => StatusCode::OK,
    };

    Ok((status, Json(api::ticket::List::from(desk.tickets()))))
}

async fn delete_ticket(
    State(state): State<SharedAppState>,
    _: AdminClaims,
    Path(id): Path<api::ticket::Id>,
) -> Result<Json<api::ticket::List>, AdminError> {
    let mut desk = Desk::default();
    desk.delete(state.repo.as_ref(), Some(id)).await?;
    Ok(Json(api::ticket::List::from(desk.tickets())))
}

#[derive(Debug, From)]
pub enum AdminError {
    #[from]
    DbError(repo::Error),
    #[from]
    Save(admin::SaveError),
    #[from]
    Delete(admin::DeleteError),
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        use admin::{DeleteError, SaveError};

        match self {
            Self::Save(SaveError::Incomplete(fields)) => (
                StatusCode::BAD_REQUEST,
                format!("{} ({})", Notice::IncompleteForm, fields.join(", ")),
            )
                .into_response(),
            Self::Delete(DeleteError::MissingId) => {
                StatusCode::BAD_REQUEST.into_response()
            }
            Self::DbError(_)
            | Self::Save(SaveError::Backend(_))
            | Self::Delete(DeleteError::Backend(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct AdminClaims {
    exp: i64,
}

#[async_trait]
impl FromRequestParts<SharedAppState> for AdminClaims {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut request::Parts,
        state: &SharedAppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::InvalidToken)?;
        let token_data = decode::<Self>(
            bearer.token(),
            &state.jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(|_| AuthError::InvalidToken)?;

        Ok(token_data.claims)
    }
}
