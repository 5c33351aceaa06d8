// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared by the data model, resolver and transaction manager.
//!
//! `UspError` carries one variant per USP fault kind. Handlers
//! return a kind and a message; the dispatcher embeds both per-path in the
//! outgoing response so partial success can be represented.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single USP fault, attributable to one path in a request.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message")]
pub enum UspError {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("parameter is read-only: {0}")]
    ParamReadOnly(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("object is not creatable: {0}")]
    ObjectNotCreatable(String),

    #[error("object is not deletable: {0}")]
    ObjectNotDeletable(String),

    #[error("resources exceeded: {0}")]
    ResourcesExceeded(String),

    #[error("resolve target not found: {0}")]
    ResolveTargetNotFound(String),

    #[error("request denied: {0}")]
    RequestDenied(String),

    #[error("internal error: {0}")]
    InternalError(String),

    #[error("command failure: {0}")]
    CommandFailure(String),

    #[error("CRUD failure: {0}")]
    CrudFailure(String),
}

impl UspError {
    /// The wire-level kind string, matching the USP error codes named in
    /// `GetSupportedDM`/`Error` messages (e.g. `INVALID_PATH`).
    pub fn kind(&self) -> &'static str {
        match self {
            UspError::InvalidPath(_) => "INVALID_PATH",
            UspError::InvalidValue(_) => "INVALID_VALUE",
            UspError::ParamReadOnly(_) => "PARAM_READ_ONLY",
            UspError::PermissionDenied(_) => "PERMISSION_DENIED",
            UspError::ObjectNotCreatable(_) => "OBJECT_NOT_CREATABLE",
            UspError::ObjectNotDeletable(_) => "OBJECT_NOT_DELETABLE",
            UspError::ResourcesExceeded(_) => "RESOURCES_EXCEEDED",
            UspError::ResolveTargetNotFound(_) => "RESOLVE_TARGET_NOT_FOUND",
            UspError::RequestDenied(_) => "REQUEST_DENIED",
            UspError::InternalError(_) => "INTERNAL_ERROR",
            UspError::CommandFailure(_) => "COMMAND_FAILURE",
            UspError::CrudFailure(_) => "CRUD_FAILURE",
        }
    }

    /// The human-readable message, independent of kind.
    pub fn message(&self) -> &str {
        match self {
            UspError::InvalidPath(m)
            | UspError::InvalidValue(m)
            | UspError::ParamReadOnly(m)
            | UspError::PermissionDenied(m)
            | UspError::ObjectNotCreatable(m)
            | UspError::ObjectNotDeletable(m)
            | UspError::ResourcesExceeded(m)
            | UspError::ResolveTargetNotFound(m)
            | UspError::RequestDenied(m)
            | UspError::InternalError(m)
            | UspError::CommandFailure(m)
            | UspError::CrudFailure(m) => m,
        }
    }

    /// Whether this error kind is ever appropriate as a fatal startup error
    /// (registration conflict, DB open failure) rather than a per-path fault.
    pub fn is_fatal_at_startup(&self) -> bool {
        matches!(self, UspError::InternalError(_) | UspError::CrudFailure(_))
    }

    /// The numeric USP error code, shared by every wire response
    /// and by the CLI IPC protocol's `CliResponse::Error`.
    pub fn usp_err_code(&self) -> u32 {
        match self {
            UspError::InvalidPath(_) => 7016,
            UspError::InvalidValue(_) => 7012,
            UspError::ParamReadOnly(_) => 7008,
            UspError::PermissionDenied(_) => 7026,
            UspError::ObjectNotCreatable(_) => 7004,
            UspError::ObjectNotDeletable(_) => 7005,
            UspError::ResourcesExceeded(_) => 7009,
            UspError::ResolveTargetNotFound(_) => 7016,
            UspError::RequestDenied(_) => 7000,
            UspError::InternalError(_) => 7500,
            UspError::CommandFailure(_) => 7020,
            UspError::CrudFailure(_) => 7002,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
