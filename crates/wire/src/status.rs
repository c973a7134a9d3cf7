// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport status codes and their mapping from error kinds.

use serde::{Deserialize, Serialize};
use sqk_core::ErrorClass;

/// HTTP-compatible status for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    PartialContent,
    BadRequest,
    NotFound,
    Conflict,
    Internal,
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::PartialContent => 207,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::Conflict => 409,
            Status::Internal => 500,
        }
    }

    /// Map an error kind to the status a handler returns.
    ///
    /// Validation → 400, conflict → 409, everything else unclassified → 500.
    /// Missing entities are 404 at the handler level (an absent row is not
    /// an error kind).
    pub fn from_class(class: ErrorClass) -> Self {
        match class {
            ErrorClass::Validation => Status::BadRequest,
            ErrorClass::Conflict => Status::Conflict,
            ErrorClass::TransientIo
            | ErrorClass::Timeout
            | ErrorClass::Integrity
            | ErrorClass::Fatal => Status::Internal,
        }
    }
}

sqk_core::simple_display! {
    Status {
        Ok => "200",
        PartialContent => "207",
        BadRequest => "400",
        NotFound => "404",
        Conflict => "409",
        Internal => "500",
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
