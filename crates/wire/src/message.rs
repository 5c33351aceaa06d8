// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! USP Message shapes (TR-369 `usp-msg.proto`): one struct pair per request
//! type (Get, Set, Add, Delete, Operate, Notify, and their supporting
//! discovery calls) plus the `Error` message. The Message Dispatcher
//! (`uspa-engine::dispatch`) builds `Request`/`Response` values from these
//! and the MTPs encode/decode the wrapping [`crate::record::Record`].

use std::collections::HashMap;

use prost::{Message, Oneof};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgType {
    Error,
    Get,
    GetResp,
    GetSupportedDM,
    GetSupportedDMResp,
    GetSupportedProtocol,
    GetSupportedProtocolResp,
    Set,
    SetResp,
    Add,
    AddResp,
    Delete,
    DeleteResp,
    Operate,
    OperateResp,
    Notify,
    NotifyResp,
    GetInstances,
    GetInstancesResp,
}

impl MsgType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MsgType::Error => "ERROR",
            MsgType::Get => "GET",
            MsgType::GetResp => "GET_RESP",
            MsgType::GetSupportedDM => "GET_SUPPORTED_DM",
            MsgType::GetSupportedDMResp => "GET_SUPPORTED_DM_RESP",
            MsgType::GetSupportedProtocol => "GET_SUPPORTED_PROTOCOL",
            MsgType::GetSupportedProtocolResp => "GET_SUPPORTED_PROTOCOL_RESP",
            MsgType::Set => "SET",
            MsgType::SetResp => "SET_RESP",
            MsgType::Add => "ADD",
            MsgType::AddResp => "ADD_RESP",
            MsgType::Delete => "DELETE",
            MsgType::DeleteResp => "DELETE_RESP",
            MsgType::Operate => "OPERATE",
            MsgType::OperateResp => "OPERATE_RESP",
            MsgType::Notify => "NOTIFY",
            MsgType::NotifyResp => "NOTIFY_RESP",
            MsgType::GetInstances => "GET_INSTANCES",
            MsgType::GetInstancesResp => "GET_INSTANCES_RESP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct Header {
    #[prost(string, tag = "1")]
    pub msg_id: String,
    /// Wire-level tag matching [`MsgType::as_str`]; kept as a string rather
    /// than a protobuf enum so the dispatcher's `match` on inbound records
    /// stays a simple string compare (see `uspa-engine::dispatch`).
    #[prost(string, tag = "2")]
    pub msg_type: String,
}

// ── Get ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Message)]
pub struct Get {
    #[prost(string, repeated, tag = "1")]
    pub param_paths: Vec<String>,
    #[prost(uint32, tag = "2")]
    pub max_depth: u32,
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct ResultEntry {
    #[prost(string, tag = "1")]
    pub requested_path: String,
    #[prost(string, tag = "2")]
    pub resolved_path: String,
    #[prost(map = "string, string", tag = "3")]
    pub params: HashMap<String, String>,
    #[prost(uint32, tag = "4")]
    pub err_code: u32,
    #[prost(string, tag = "5")]
    pub err_msg: String,
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct GetResp {
    #[prost(message, repeated, tag = "1")]
    pub results: Vec<ResultEntry>,
}

// ── Set ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Message)]
pub struct ParamSetting {
    #[prost(string, tag = "1")]
    pub param: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct Set {
    #[prost(bool, tag = "1")]
    pub allow_partial: bool,
    #[prost(message, repeated, tag = "2")]
    pub updates: Vec<ParamSetting>,
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct ParamSettingResult {
    #[prost(string, tag = "1")]
    pub param: String,
    #[prost(uint32, tag = "2")]
    pub err_code: u32,
    #[prost(string, tag = "3")]
    pub err_msg: String,
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct SetResp {
    #[prost(message, repeated, tag = "1")]
    pub results: Vec<ParamSettingResult>,
}

// ── Add / Delete ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Message)]
pub struct Add {
    #[prost(string, tag = "1")]
    pub obj_path: String,
    #[prost(map = "string, string", tag = "2")]
    pub param_settings: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct ParamError {
    #[prost(string, tag = "1")]
    pub param: String,
    #[prost(uint32, tag = "2")]
    pub err_code: u32,
    #[prost(string, tag = "3")]
    pub err_msg: String,
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct AddResp {
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(uint32, tag = "2")]
    pub instance: u32,
    #[prost(message, repeated, tag = "3")]
    pub param_errs: Vec<ParamError>,
    #[prost(uint32, tag = "4")]
    pub err_code: u32,
    #[prost(string, tag = "5")]
    pub err_msg: String,
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct Delete {
    #[prost(string, repeated, tag = "1")]
    pub obj_paths: Vec<String>,
    #[prost(bool, tag = "2")]
    pub allow_partial: bool,
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct ObjPathResult {
    #[prost(string, tag = "1")]
    pub requested_path: String,
    #[prost(string, repeated, tag = "2")]
    pub affected_paths: Vec<String>,
    #[prost(uint32, tag = "3")]
    pub err_code: u32,
    #[prost(string, tag = "4")]
    pub err_msg: String,
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct DeleteResp {
    #[prost(message, repeated, tag = "1")]
    pub results: Vec<ObjPathResult>,
}

// ── Operate ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Message)]
pub struct Operate {
    #[prost(string, tag = "1")]
    pub command: String,
    #[prost(string, tag = "2")]
    pub command_key: String,
    #[prost(bool, tag = "3")]
    pub send_resp: bool,
    #[prost(map = "string, string", tag = "4")]
    pub input_args: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct OperateResp {
    #[prost(string, tag = "1")]
    pub command: String,
    #[prost(string, tag = "2")]
    pub command_key: String,
    #[prost(map = "string, string", tag = "3")]
    pub output_args: HashMap<String, String>,
    #[prost(uint32, tag = "4")]
    pub err_code: u32,
    #[prost(string, tag = "5")]
    pub err_msg: String,
}

// ── Notify ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Message)]
pub struct Notify {
    #[prost(string, tag = "1")]
    pub subscription_id: String,
    #[prost(bool, tag = "2")]
    pub send_resp: bool,
    /// One of `ValueChange` / `ObjectCreation` / `ObjectDeletion` /
    /// `OperationComplete` / `Event` / `Periodic`.
    #[prost(string, tag = "3")]
    pub kind: String,
    #[prost(string, tag = "4")]
    pub path: String,
    #[prost(map = "string, string", tag = "5")]
    pub params: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct NotifyResp {
    #[prost(string, tag = "1")]
    pub subscription_id: String,
}

// ── GetSupportedDM / GetSupportedProtocol / GetInstances ────────────────

#[derive(Debug, Clone, PartialEq, Message)]
pub struct GetSupportedDM {
    #[prost(string, repeated, tag = "1")]
    pub obj_paths: Vec<String>,
    #[prost(bool, tag = "2")]
    pub first_level_only: bool,
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct SupportedObjectResult {
    #[prost(string, tag = "1")]
    pub obj_path: String,
    #[prost(bool, tag = "2")]
    pub multi_instance: bool,
    #[prost(string, repeated, tag = "3")]
    pub params: Vec<String>,
    #[prost(string, repeated, tag = "4")]
    pub commands: Vec<String>,
    #[prost(string, repeated, tag = "5")]
    pub events: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct GetSupportedDMResp {
    #[prost(message, repeated, tag = "1")]
    pub objects: Vec<SupportedObjectResult>,
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct GetSupportedProtocol {
    #[prost(string, tag = "1")]
    pub controller_supported_versions: String,
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct GetSupportedProtocolResp {
    #[prost(string, tag = "1")]
    pub agent_supported_versions: String,
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct GetInstances {
    #[prost(string, repeated, tag = "1")]
    pub obj_paths: Vec<String>,
    #[prost(bool, tag = "2")]
    pub first_level_only: bool,
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct GetInstancesResp {
    #[prost(message, repeated, tag = "1")]
    pub results: Vec<ObjPathResult>,
}

// ── Error ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Message)]
pub struct Error {
    #[prost(uint32, tag = "1")]
    pub err_code: u32,
    #[prost(string, tag = "2")]
    pub err_msg: String,
    #[prost(message, repeated, tag = "3")]
    pub param_errs: Vec<ParamError>,
}

// ── Request / Response / Body envelopes ─────────────────────────────────

#[derive(Debug, Clone, PartialEq, Oneof)]
pub enum ReqType {
    #[prost(message, tag = "1")]
    Get(Get),
    #[prost(message, tag = "2")]
    Set(Set),
    #[prost(message, tag = "3")]
    Add(Add),
    #[prost(message, tag = "4")]
    Delete(Delete),
    #[prost(message, tag = "5")]
    Operate(Operate),
    #[prost(message, tag = "6")]
    Notify(Notify),
    #[prost(message, tag = "7")]
    GetSupportedDM(GetSupportedDM),
    #[prost(message, tag = "8")]
    GetSupportedProtocol(GetSupportedProtocol),
    #[prost(message, tag = "9")]
    GetInstances(GetInstances),
    #[prost(message, tag = "10")]
    NotifyResp(NotifyResp),
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct Request {
    #[prost(oneof = "ReqType", tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10")]
    pub req_type: Option<ReqType>,
}

#[derive(Debug, Clone, PartialEq, Oneof)]
pub enum RespType {
    #[prost(message, tag = "1")]
    GetResp(GetResp),
    #[prost(message, tag = "2")]
    SetResp(SetResp),
    #[prost(message, tag = "3")]
    AddResp(AddResp),
    #[prost(message, tag = "4")]
    DeleteResp(DeleteResp),
    #[prost(message, tag = "5")]
    OperateResp(OperateResp),
    #[prost(message, tag = "6")]
    GetSupportedDMResp(GetSupportedDMResp),
    #[prost(message, tag = "7")]
    GetSupportedProtocolResp(GetSupportedProtocolResp),
    #[prost(message, tag = "8")]
    GetInstancesResp(GetInstancesResp),
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct Response {
    #[prost(oneof = "RespType", tags = "1, 2, 3, 4, 5, 6, 7, 8")]
    pub resp_type: Option<RespType>,
}

#[derive(Debug, Clone, PartialEq, Oneof)]
pub enum Body {
    #[prost(message, tag = "2")]
    Request(Request),
    #[prost(message, tag = "3")]
    Response(Response),
    #[prost(message, tag = "4")]
    Error(Error),
}

#[derive(Debug, Clone, PartialEq, Message)]
pub struct Msg {
    #[prost(message, required, tag = "1")]
    pub header: Header,
    #[prost(oneof = "Body", tags = "2, 3, 4")]
    pub body: Option<Body>,
}

impl Msg {
    pub fn request(msg_id: impl Into<String>, msg_type: MsgType, req_type: ReqType) -> Self {
        Self {
            header: Header { msg_id: msg_id.into(), msg_type: msg_type.as_str().to_string() },
            body: Some(Body::Request(Request { req_type: Some(req_type) })),
        }
    }

    pub fn response(msg_id: impl Into<String>, msg_type: MsgType, resp_type: RespType) -> Self {
        Self {
            header: Header { msg_id: msg_id.into(), msg_type: msg_type.as_str().to_string() },
            body: Some(Body::Response(Response { resp_type: Some(resp_type) })),
        }
    }

    pub fn error(msg_id: impl Into<String>, error: Error) -> Self {
        Self {
            header: Header { msg_id: msg_id.into(), msg_type: MsgType::Error.as_str().to_string() },
            body: Some(Body::Error(error)),
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
