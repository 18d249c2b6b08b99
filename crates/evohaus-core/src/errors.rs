// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Evohaus Bridge.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use thiserror::Error;

/// Evohaus portal error types
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unexpected portal markup: {0}")]
    Parse(String),

    #[error("Portal returned an empty response for {endpoint}")]
    EmptyResponse { endpoint: String },

    #[error("Portal request timed out: {0}")]
    Timeout(String),

    #[error("Portal returned unusable data: {0}")]
    UpstreamData(String),

    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("Portal returned error status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            let target = err
                .url()
                .map_or_else(|| "unknown url".to_owned(), |u| u.path().to_owned());
            Self::Timeout(target)
        } else {
            Self::Http(err)
        }
    }
}

impl PortalError {
    /// Whether a fresh login could plausibly fix the failure
    pub fn is_session_related(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::EmptyResponse { .. })
    }
}

pub type PortalResult<T> = Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PortalError::EmptyResponse {
            endpoint: "/php/newMeterTable.php".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "Portal returned an empty response for /php/newMeterTable.php"
        );

        let err = PortalError::Api {
            status: 500,
            message: "boom".to_owned(),
        };
        assert_eq!(err.to_string(), "Portal returned error status 500: boom");
    }

    #[test]
    fn test_session_related() {
        assert!(PortalError::Auth("no cookie".to_owned()).is_session_related());
        assert!(
            PortalError::EmptyResponse {
                endpoint: "x".to_owned()
            }
            .is_session_related()
        );
        assert!(!PortalError::Parse("label".to_owned()).is_session_related());
        assert!(!PortalError::Timeout("/x".to_owned()).is_session_related());
    }
}
