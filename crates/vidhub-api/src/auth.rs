use axum::{
    Extension, Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};

use vidhub_core::aggregate::Project;
use vidhub_core::credentials::{self, AccountChanges, LoginName, Registration};
use vidhub_core::session::{ACCESS_COOKIE, REFRESH_COOKIE};
use vidhub_core::token::TokenPair;
use vidhub_core::{AuthFailure, CoreError, Identity};
use vidhub_types::api::{
    ChangePasswordRequest, LoginRequest, RefreshRequest, RegisterRequest, SessionResponse,
    TokenPairResponse, UpdateAccountRequest,
};

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, run_blocking};

fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

fn with_session_cookies(jar: CookieJar, pair: &TokenPair, secure: bool) -> CookieJar {
    jar.add(session_cookie(ACCESS_COOKIE, pair.access_token.clone(), secure))
        .add(session_cookie(REFRESH_COOKIE, pair.refresh_token.clone(), secure))
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let registration = Registration {
        username: req.username,
        email: req.email,
        full_name: req.full_name,
        password: req.password,
        avatar: req.avatar,
        cover_image: req.cover_image,
    };

    let user = run_blocking(&state, move |s| {
        credentials::register(&s.db, s.passwords.as_ref(), &registration)
            .map(|user| Project::<Identity>::project(&user))
    })
    .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = req.email.filter(|e| !e.trim().is_empty());
    let username = req.username.filter(|u| !u.trim().is_empty());
    // Email takes precedence when both are sent.
    let (by_email, name) = match (email, username) {
        (Some(email), _) => (true, email),
        (None, Some(username)) => (false, username),
        (None, None) => {
            return Err(CoreError::Validation("username or email is required".into()).into());
        }
    };
    let password = req.password;

    let (user, pair) = run_blocking(&state, move |s| {
        let name = if by_email {
            LoginName::Email(&name)
        } else {
            LoginName::Username(&name)
        };
        credentials::login(&s.db, s.passwords.as_ref(), &s.tokens, name, &password)
    })
    .await?;

    let jar = with_session_cookies(jar, &pair, state.secure_cookies);
    Ok((
        jar,
        Json(SessionResponse {
            user,
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }),
    ))
}

/// Exchange a refresh token, taken from the cookie or else the JSON body,
/// for a new pair.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let from_body = if body.is_empty() {
        RefreshRequest::default()
    } else {
        serde_json::from_slice::<RefreshRequest>(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid body: {}", e)))?
    };

    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .or(from_body.refresh_token.filter(|v| !v.is_empty()))
        .ok_or(AuthFailure::MissingCredential)?;

    let pair = run_blocking(&state, move |s| s.tokens.rotate_refresh_token(&s.db, &presented)).await?;

    let jar = with_session_cookies(jar, &pair, state.secure_cookies);
    Ok((
        jar,
        Json(TokenPairResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    let user_id = identity.id;
    run_blocking(&state, move |s| s.tokens.revoke(&s.db, user_id)).await?;

    let jar = jar
        .remove(Cookie::build(ACCESS_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"));
    Ok((jar, StatusCode::NO_CONTENT))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    let user_id = identity.id;
    run_blocking(&state, move |s| {
        credentials::change_password(
            &s.db,
            s.passwords.as_ref(),
            user_id,
            &req.old_password,
            &req.new_password,
        )
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(Extension(identity): Extension<Identity>) -> Json<Identity> {
    Json(identity)
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<UpdateAccountRequest>,
) -> ApiResult<Json<Identity>> {
    let changes = AccountChanges {
        full_name: req.full_name,
        email: req.email,
        avatar: req.avatar,
        cover_image: req.cover_image,
    };

    let user_id = identity.id;
    let updated =
        run_blocking(&state, move |s| credentials::update_account(&s.db, user_id, &changes)).await?;
    Ok(Json(updated))
}
