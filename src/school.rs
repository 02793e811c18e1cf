use std::{result, sync::Arc};

use log::{debug, info, warn};
use serde::Serialize;
use warp::http;

use crate::activity::{Activities, Catalog, RosterError};
use crate::auth::{LoginAttempt, SessionToken};
use crate::session::{SessionUser, Sessions};
use crate::teacher::Teachers;

pub struct School {
    teachers: Teachers,
    sessions: Sessions,
    catalog: Catalog,
}

/// A request that has been resolved to a logged-in teacher.
pub struct SchoolAuthed {
    school: Arc<School>,
    user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct LoginReply {
    token: SessionToken,
    user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct Message {
    message: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Unauthenticated,
    InvalidCredentials,
    NotFound,
    AlreadyRegistered,
    NotInRoster,
    ActivityFull,
    BadRequest,
}

pub type Result<T> = result::Result<T, Error>;

impl From<Error> for http::StatusCode {
    fn from(e: Error) -> Self {
        match e {
            Error::Unauthenticated | Error::InvalidCredentials => http::StatusCode::UNAUTHORIZED,
            Error::NotFound => http::StatusCode::NOT_FOUND,
            Error::AlreadyRegistered
            | Error::NotInRoster
            | Error::ActivityFull
            | Error::BadRequest => http::StatusCode::BAD_REQUEST,
        }
    }
}

impl From<RosterError> for Error {
    fn from(e: RosterError) -> Self {
        match e {
            RosterError::NoSuchActivity => Error::NotFound,
            RosterError::AlreadyRegistered => Error::AlreadyRegistered,
            RosterError::NotInRoster => Error::NotInRoster,
            RosterError::Full => Error::ActivityFull,
        }
    }
}

impl Error {
    pub fn detail(self) -> &'static str {
        match self {
            Error::Unauthenticated => "Authentication required",
            Error::InvalidCredentials => "Invalid credentials",
            Error::NotFound => "Activity not found",
            Error::AlreadyRegistered => "Student is already signed up",
            Error::NotInRoster => "Student is not signed up for this activity",
            Error::ActivityFull => "Activity is full",
            Error::BadRequest => "Invalid request",
        }
    }
}

impl warp::reject::Reject for Error {}

impl Message {
    fn new(message: String) -> Self {
        Self { message }
    }
}

impl School {
    pub fn new(teachers: Teachers, catalog: Catalog) -> Self {
        Self {
            teachers,
            sessions: Sessions::new(),
            catalog,
        }
    }

    pub async fn login(&self, attempt: LoginAttempt) -> Result<LoginReply> {
        let username = attempt.user();

        let teacher = self.teachers.find(username).ok_or_else(|| {
            warn!("rejecting non-existent teacher {username}");
            Error::InvalidCredentials
        })?;

        if attempt.pass() != teacher.password {
            warn!("wrong password for teacher {username}");
            return Err(Error::InvalidCredentials);
        }

        let token = self.sessions.create(username, &teacher.name).await;
        info!("{username} login: new session {token}");

        Ok(LoginReply {
            token,
            user: SessionUser {
                username: username.into(),
                name: teacher.name.clone(),
            },
        })
    }

    /// The teacher behind `token`, if any. Anonymous is not an error.
    pub async fn current_user(&self, token: Option<&SessionToken>) -> Option<SessionUser> {
        match token {
            Some(token) => {
                let user = self.sessions.resolve(token).await;
                if user.is_none() {
                    debug!("unknown session {token}");
                }
                user
            }
            None => None,
        }
    }

    pub async fn authenticate(self: &Arc<Self>, token: Option<SessionToken>) -> Result<SchoolAuthed> {
        match self.current_user(token.as_ref()).await {
            Some(user) => {
                debug!("{} authenticated by session", user.username);
                Ok(SchoolAuthed {
                    school: Arc::clone(self),
                    user,
                })
            }
            None => Err(Error::Unauthenticated),
        }
    }

    pub async fn activities(&self) -> Activities {
        self.catalog.list().await
    }
}

impl SchoolAuthed {
    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    /// Revokes the teacher's oldest session, which may not be the one
    /// this request came in on. Succeeds whether or not one was left.
    pub async fn logout(&self) -> Message {
        let username = &self.user.username;
        info!("{username} logout");

        if !self.school.sessions.revoke(username).await {
            debug!("{username} had no session left to revoke");
        }

        Message::new("Logged out successfully".into())
    }

    pub async fn signup(&self, activity: &str, email: &str) -> Result<Message> {
        let username = &self.user.username;

        self.school
            .catalog
            .signup(activity, email)
            .await
            .map_err(|e| {
                info!("{username} couldn't sign up {email} for {activity}: {e:?}");
                Error::from(e)
            })?;

        info!("{username} signed up {email} for {activity}");
        Ok(Message::new(format!("Signed up {email} for {activity}")))
    }

    pub async fn unregister(&self, activity: &str, email: &str) -> Result<Message> {
        let username = &self.user.username;

        self.school
            .catalog
            .unregister(activity, email)
            .await
            .map_err(|e| {
                info!("{username} couldn't unregister {email} from {activity}: {e:?}");
                Error::from(e)
            })?;

        info!("{username} unregistered {email} from {activity}");
        Ok(Message::new(format!("Unregistered {email} from {activity}")))
    }
}
