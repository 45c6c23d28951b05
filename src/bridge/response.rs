//! The result shape returned for every request.
//!
//! On the wire a response is `{"success": true, "data": ...}` or
//! `{"success": false, "error": "<message>"}`.

use crate::config::{RecentFileEntry, Settings};
use crate::error::Result;
use crate::files::{DialogSelection, DirectoryEntry};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Success payloads, one per kind of answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Ack,
    Settings(Settings),
    Content(String),
    Entries(Vec<DirectoryEntry>),
    Exists(bool),
    RecentFiles(Vec<RecentFileEntry>),
    Selection(DialogSelection),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Success(Payload),
    Failure(String),
}

impl Response {
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Response::Success(_) => None,
            Response::Failure(message) => Some(message),
        }
    }
}

impl From<Result<Payload>> for Response {
    fn from(result: Result<Payload>) -> Self {
        match result {
            Ok(payload) => Response::Success(payload),
            Err(err) => Response::Failure(err.to_string()),
        }
    }
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Response", 2)?;
        match self {
            Response::Success(payload) => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", payload)?;
            }
            Response::Failure(message) => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", message)?;
            }
        }
        state.end()
    }
}
