//! Login page and login submission.

use axum::Json;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::ldap::backend::LOGIN_PATH;
use crate::middleware::Params;

/// One-shot notice shown on the next render of the login page.
pub const FLASH_COOKIE: &str = "flash";
const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: String,
}

/// Render the login page of the configured middleware.
///
/// A pending flash notice is displayed once then cleared.
pub async fn entry_point(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>)> {
    let middleware = state.middleware()?;

    let flash = jar.get(FLASH_COOKIE).map(|c| c.value().to_owned());
    let jar = if flash.is_some() {
        jar.remove(Cookie::build(FLASH_COOKIE).path("/"))
    } else {
        jar
    };

    let page = middleware.entry_point(&state.config.params, flash.as_deref());
    Ok((jar, Html(page)))
}

/// Handler checking a submitted login.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    form: std::result::Result<Form<Params>, FormRejection>,
) -> Result<Response> {
    let Form(form) = form.map_err(|err| ServerError::ParsingForm(Box::new(err)))?;
    let middleware = state.middleware()?;

    match middleware.callback(&form, &state.config.params).await {
        Ok(identity) => Ok(Json(Session {
            user: identity.get("user").cloned().unwrap_or_default(),
        })
        .into_response()),
        Err(ServerError::AuthenticationFailed) => {
            let flash = Cookie::build((FLASH_COOKIE, INVALID_CREDENTIALS))
                .path("/")
                .http_only(true)
                .max_age(time::Duration::seconds(1));

            Ok((jar.add(flash), Redirect::to(LOGIN_PATH)).into_response())
        },
        Err(err) => Err(err),
    }
}
