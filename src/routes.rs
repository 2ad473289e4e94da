use std::convert::Infallible;
use std::sync::Arc;

use warp::filters::BoxedFilter;
use warp::http::{StatusCode, Uri};
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use foxnavy_protocol::{
    AuthError, ErrorReply, LobbyInfo, LoginRequest, PlayerIdentity, SessionInfo,
};

use crate::gateway::{SessionGateway, SESSION_COOKIE};
use crate::lobby::Roster;

/// Where the browser goes after signing in
const LOBBY_PATH: &str = "/lobby";

/// Login forms are a name and a mode
const MAX_FORM_BYTES: u64 = 4 * 1024;

/// Carries the reason a request was not authenticated to the recovery
/// handler, which does not pass it on to the client.
#[derive(Debug)]
struct Unauthenticated(AuthError);
impl warp::reject::Reject for Unauthenticated {}

pub fn routes(gateway: Arc<SessionGateway>, roster: Arc<Roster>) -> BoxedFilter<(Response,)> {
    let login = warp::path!("login")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_FORM_BYTES))
        .and(warp::body::form())
        .and(warp::cookie::optional(SESSION_COOKIE))
        .and(with_gateway(gateway.clone()))
        .and(with_roster(roster.clone()))
        .map(login_reply);

    let session = warp::path!("session")
        .and(warp::get())
        .and(authenticated(gateway.clone()))
        .map(|identity: PlayerIdentity| {
            warp::reply::json(&SessionInfo::from(identity)).into_response()
        });

    let lobby = warp::path!("lobby")
        .and(warp::get())
        .and(authenticated(gateway.clone()))
        .and(with_roster(roster.clone()))
        .map(lobby_reply);

    let logout = warp::path!("logout")
        .and(warp::post())
        .and(warp::cookie::optional(SESSION_COOKIE))
        .and(with_gateway(gateway.clone()))
        .and(with_roster(roster))
        .map(logout_reply);

    let routes = login
        .or(session)
        .unify()
        .or(lobby)
        .unify()
        .or(logout)
        .unify()
        .boxed();

    #[cfg(any(test, feature = "test-control"))]
    let routes = if gateway.test_control_enabled() {
        let reset = warp::path!("test" / "reset")
            .and(warp::post())
            .and(with_gateway(gateway))
            .map(reset_reply);
        routes.or(reset).unify().boxed()
    } else {
        routes
    };

    routes.recover(recover).unify().boxed()
}

fn with_gateway(
    gateway: Arc<SessionGateway>,
) -> impl Filter<Extract = (Arc<SessionGateway>,), Error = Infallible> + Clone {
    warp::any().map(move || gateway.clone())
}

fn with_roster(
    roster: Arc<Roster>,
) -> impl Filter<Extract = (Arc<Roster>,), Error = Infallible> + Clone {
    warp::any().map(move || roster.clone())
}

/// Extracts the identity from the session cookie, or rejects the request
fn authenticated(
    gateway: Arc<SessionGateway>,
) -> impl Filter<Extract = (PlayerIdentity,), Error = Rejection> + Clone {
    warp::cookie::optional(SESSION_COOKIE).and_then(move |cookie: Option<String>| {
        let gateway = gateway.clone();
        async move {
            gateway
                .authenticate(cookie.as_deref())
                .map_err(|error| warp::reject::custom(Unauthenticated(error)))
        }
    })
}

/// Signing in again replaces the identity held by a still valid cookie
fn login_reply(
    request: LoginRequest,
    cookie: Option<String>,
    gateway: Arc<SessionGateway>,
    roster: Arc<Roster>,
) -> Response {
    match gateway.login(&request) {
        Ok((identity, token)) => {
            if let Ok(previous) = gateway.authenticate(cookie.as_deref()) {
                roster.leave(previous.player_id);
            }
            roster.join(&identity);
            let redirect = warp::redirect::see_other(Uri::from_static(LOBBY_PATH));
            warp::reply::with_header(redirect, "set-cookie", gateway.session_cookie(&token))
                .into_response()
        }
        Err(error) => {
            log::debug!("Rejected login: {}", error);
            let reply = ErrorReply::InvalidLogin {
                message: error.to_string(),
            };
            warp::reply::with_status(warp::reply::json(&reply), StatusCode::BAD_REQUEST)
                .into_response()
        }
    }
}

fn lobby_reply(identity: PlayerIdentity, roster: Arc<Roster>) -> Response {
    let players = roster.names_in(identity.game_mode);
    warp::reply::json(&LobbyInfo {
        you: identity.into(),
        players,
    })
    .into_response()
}

/// Works with any cookie, valid or not; the browser is told to drop it.
fn logout_reply(
    cookie: Option<String>,
    gateway: Arc<SessionGateway>,
    roster: Arc<Roster>,
) -> Response {
    if let Ok(identity) = gateway.authenticate(cookie.as_deref()) {
        roster.leave(identity.player_id);
    }
    let redirect = warp::redirect::see_other(Uri::from_static("/"));
    warp::reply::with_header(redirect, "set-cookie", gateway.clear_cookie()).into_response()
}

#[cfg(any(test, feature = "test-control"))]
fn reset_reply(gateway: Arc<SessionGateway>) -> Response {
    gateway.reset_test_state();
    StatusCode::NO_CONTENT.into_response()
}

/// Every authentication failure looks the same from the outside
async fn recover(rejection: Rejection) -> Result<Response, Rejection> {
    if let Some(Unauthenticated(reason)) = rejection.find::<Unauthenticated>() {
        log::debug!("Unauthenticated request: {}", reason);
        let reply = warp::reply::json(&ErrorReply::NotSignedIn);
        Ok(warp::reply::with_status(reply, StatusCode::UNAUTHORIZED).into_response())
    } else {
        Err(rejection)
    }
}
