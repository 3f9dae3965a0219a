use std::str::FromStr;

use base64::Engine;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("auth method '{0}' not implemented (expected 'basic' or 'token')")]
    UnknownMethod(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JiraAuthMethod {
    /// E-mail or username plus API token.
    Basic,
    /// Personal access token sent as a bearer token.
    Token,
}

impl FromStr for JiraAuthMethod {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(JiraAuthMethod::Basic),
            "token" => Ok(JiraAuthMethod::Token),
            _ => Err(AuthError::UnknownMethod(s.to_string())),
        }
    }
}

fn basic(user: &str, secret: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{secret}"));
    format!("Basic {encoded}")
}

/// ADO takes a PAT as the password of an empty user.
pub fn ado_auth_header(token: &str) -> String {
    basic("", token)
}

pub fn jira_auth_header(method: JiraAuthMethod, user: &str, token: &str) -> String {
    match method {
        JiraAuthMethod::Basic => basic(user, token),
        JiraAuthMethod::Token => format!("Bearer {token}"),
    }
}
