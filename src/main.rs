use std::borrow::Cow;
use std::convert::Infallible;
use std::env;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{debug, error, info, trace};
use serde::{Deserialize, Serialize};
use warp::http::{header, HeaderMap, StatusCode, Uri};
use warp::{Filter, Rejection, Reply};

mod activity;
mod args;
mod auth;
mod school;
mod session;
mod teacher;

use activity::Catalog;
use args::Args;
use auth::{LoginAttempt, SessionToken};
use school::{Error, School, SchoolAuthed};
use teacher::Teachers;

#[derive(Debug, Deserialize)]
struct RosterQuery {
    email: String,
}

/// Login bodies are two short strings.
const LOGIN_BODY_LIMIT: u64 = 4 * 1024;

#[derive(Serialize)]
struct Detail {
    detail: &'static str,
}

#[tokio::main]
async fn main() -> ExitCode {
    let filters = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();

    let args = Args::parse();

    let addr = match args.addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!("invalid address: {e}");
            return ExitCode::FAILURE;
        }
    };

    let teachers = Teachers::load(args.teachers());
    let catalog = Catalog::seeded(args.enforce_capacity());
    let school = Arc::new(School::new(teachers, catalog));

    let routes = routes(school, args.static_dir());

    let (addr, server) = match warp::serve(routes).try_bind_with_graceful_shutdown(addr, shutdown()) {
        Ok(bound) => bound,
        Err(e) => {
            error!("couldn't listen on {addr}: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!("listening on {addr}");
    server.await;
    info!("shutdown complete");

    ExitCode::SUCCESS
}

async fn shutdown() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("interrupted, shutting down"),
        Err(e) => {
            error!("couldn't listen for ctrl-c: {e}");
            std::future::pending::<()>().await
        }
    }
}

fn routes(
    school: Arc<School>,
    static_dir: &Path,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let auth = {
        let login = warp::path!("auth" / "login")
            .and(warp::post())
            .and(with_school(&school))
            .and(warp::body::content_length_limit(LOGIN_BODY_LIMIT))
            .and(warp::body::json())
            .and_then(login);

        let logout = warp::path!("auth" / "logout")
            .and(warp::post())
            .and(authed(&school))
            .then(logout);

        let me = warp::path!("auth" / "me")
            .and(warp::get())
            .and(with_school(&school))
            .and(bearer())
            .then(|school: Arc<School>, token: Option<SessionToken>| async move {
                warp::reply::json(&school.current_user(token.as_ref()).await)
            });

        login.or(logout).or(me)
    };

    let index = warp::path::end()
        .and(warp::get())
        .map(|| warp::redirect::temporary(Uri::from_static("/static/index.html")));

    let activities = {
        let list = warp::path!("activities")
            .and(warp::get())
            .and(with_school(&school))
            .then(|school: Arc<School>| async move {
                warp::reply::json(&school.activities().await)
            });

        // auth comes before the query so anonymous callers always see a 401
        let signup = warp::path!("activities" / String / "signup")
            .and(warp::post())
            .and(authed(&school))
            .and(warp::query::<RosterQuery>())
            .and_then(signup);

        let unregister = warp::path!("activities" / String / "unregister")
            .and(warp::delete())
            .and(authed(&school))
            .and(warp::query::<RosterQuery>())
            .and_then(unregister);

        list.or(signup).or(unregister)
    };

    let statics = warp::path("static").and(warp::fs::dir(static_dir.to_path_buf()));

    auth.or(index)
        .or(activities)
        .or(statics)
        .recover(recover)
        .with(warp::log("signups"))
}

fn with_school(
    school: &Arc<School>,
) -> impl Filter<Extract = (Arc<School>,), Error = Infallible> + Clone {
    let school = Arc::clone(school);
    warp::any().map(move || Arc::clone(&school))
}

// an unreadable header is anonymous, same as a missing one
fn bearer() -> impl Filter<Extract = (Option<SessionToken>,), Error = Infallible> + Clone {
    warp::header::headers_cloned().map(|headers: HeaderMap| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(auth::bearer_token)
    })
}

fn authed(school: &Arc<School>) -> impl Filter<Extract = (SchoolAuthed,), Error = Rejection> + Clone {
    with_school(school).and(bearer()).and_then(authenticate)
}

async fn authenticate(
    school: Arc<School>,
    token: Option<SessionToken>,
) -> Result<SchoolAuthed, Rejection> {
    school.authenticate(token).await.map_err(warp::reject::custom)
}

async fn login(school: Arc<School>, attempt: LoginAttempt) -> Result<impl Reply, Rejection> {
    let reply = school.login(attempt).await.map_err(warp::reject::custom)?;

    Ok(warp::reply::json(&reply))
}

async fn logout(authed: SchoolAuthed) -> impl Reply {
    warp::reply::json(&authed.logout().await)
}

async fn signup(
    activity: String,
    authed: SchoolAuthed,
    query: RosterQuery,
) -> Result<impl Reply, Rejection> {
    let activity = decode_segment(&activity)?;
    trace!("{} signing up {} for {activity}", authed.user().username, query.email);

    let message = authed
        .signup(&activity, &query.email)
        .await
        .map_err(warp::reject::custom)?;

    Ok(warp::reply::json(&message))
}

async fn unregister(
    activity: String,
    authed: SchoolAuthed,
    query: RosterQuery,
) -> Result<impl Reply, Rejection> {
    let activity = decode_segment(&activity)?;
    trace!("{} unregistering {} from {activity}", authed.user().username, query.email);

    let message = authed
        .unregister(&activity, &query.email)
        .await
        .map_err(warp::reject::custom)?;

    Ok(warp::reply::json(&message))
}

/// Activity names arrive percent-encoded ("Chess%20Club").
fn decode_segment(segment: &str) -> Result<String, Rejection> {
    urlencoding::decode(segment)
        .map(Cow::into_owned)
        .map_err(|e| {
            debug!("couldn't decode path segment {segment:?}: {e}");
            warp::reject::custom(Error::BadRequest)
        })
}

async fn recover(err: Rejection) -> Result<warp::reply::Response, Infallible> {
    let school_err = err.find::<Error>().copied();

    let (status, detail) = if let Some(e) = school_err {
        (StatusCode::from(e), e.detail())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some()
        || err.find::<warp::reject::InvalidQuery>().is_some()
        || err.find::<warp::reject::InvalidHeader>().is_some()
    {
        debug!("bad request: {err:?}");
        (StatusCode::BAD_REQUEST, Error::BadRequest.detail())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large")
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Length Required")
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported Media Type")
    } else {
        error!("unhandled rejection: {err:?}");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    };

    let reply = warp::reply::with_status(warp::reply::json(&Detail { detail }), status);

    Ok(match school_err {
        Some(Error::Unauthenticated) => {
            warp::reply::with_header(reply, "www-authenticate", "Bearer").into_response()
        }
        _ => reply.into_response(),
    })
}
