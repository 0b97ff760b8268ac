//! Import policy and acting-user validation.

use std::fmt;

use crate::error::{ParserError, Result};
use crate::index::User;

/// Reference to a user as given on the command line: numeric id or login
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActorRef {
    Id(i64),
    Login(String),
}

impl ActorRef {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(id) => ActorRef::Id(id),
            Err(_) => ActorRef::Login(raw.to_string()),
        }
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorRef::Id(id) => write!(f, "#{}", id),
            ActorRef::Login(login) => write!(f, "{}", login),
        }
    }
}

/// Identity service consulted before an import writes anything.
pub trait IdentityLookup {
    fn find_user(&self, actor: &ActorRef) -> Result<Option<User>>;
}

/// A user that has been checked to exist and to be allowed to publish.
///
/// Only [`validate_actor`] constructs one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user: User,
}

impl Identity {
    pub fn id(&self) -> i64 {
        self.user.id
    }

    pub fn login(&self) -> &str {
        &self.user.login
    }
}

/// Resolves and authorizes the acting user.
pub fn validate_actor(lookup: &dyn IdentityLookup, actor: Option<&ActorRef>) -> Result<Identity> {
    let actor = actor.ok_or_else(|| ParserError::Unauthorized("no user given".to_string()))?;

    let user = lookup
        .find_user(actor)?
        .ok_or_else(|| ParserError::Unauthorized(format!("user {} does not exist", actor)))?;

    if !user.role.can_publish() {
        return Err(ParserError::Unauthorized(format!(
            "user {} ({}) may not publish content",
            user.login,
            user.role.as_str()
        )));
    }

    Ok(Identity { user })
}

/// Settings of one import run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPolicy {
    pub throttle: bool,
    pub include_internal: bool,
    pub actor: Identity,
}

impl ImportPolicy {
    pub fn new(throttle: bool, include_internal: bool, actor: Identity) -> Self {
        Self {
            throttle,
            include_internal,
            actor,
        }
    }
}
