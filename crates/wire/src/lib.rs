// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! USP (TR-369) Record/Message wire types and the local CLI IPC framing.
//!
//! `uspa-wire` draws a line between two wire protocols the agent speaks:
//!
//! - The **USP Record/Message** shapes: these mirror the Protocol Buffers
//!   schema TR-369 defines (`usp-record.proto`, `usp-msg.proto`). Turning
//!   bytes on the wire into these structs is delegated to a library
//!   (`prost`, here) rather than a hand-rolled parser — this crate owns the
//!   *shape*, not the encoding.
//! - The **CLI IPC protocol**: a length-prefixed JSON request/response
//!   framing over the local Unix-domain stream socket, unrelated to USP's
//!   own wire format.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod cli_protocol;
pub mod codec;
pub mod ipc;
pub mod message;
pub mod record;

pub use codec::{decode_record, encode_record, WireError, MAX_USP_MSG_LEN};
pub use ipc::{read_frame, write_frame, IpcError};
pub use message::{
    Add, AddResp, Body, Delete, DeleteResp, Error as UspWireError, Get, GetInstances,
    GetInstancesResp, GetResp, GetSupportedDM, GetSupportedDMResp, GetSupportedProtocol,
    GetSupportedProtocolResp, Header, Msg, MsgType, Notify, NotifyResp, ObjPathResult, Operate,
    OperateResp, ParamError, ParamSetting, ParamSettingResult, ReqType, Request, RespType,
    Response, ResultEntry, Set, SetResp, SupportedObjectResult,
};
pub use record::{PayloadSecurity, Record};
pub use cli_protocol::{CliRequest, CliResponse};
