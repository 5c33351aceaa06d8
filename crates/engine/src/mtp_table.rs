// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent MTP Table: the set of transport bindings this agent exposes. A
//! single `mtp_id` row may carry a STOMP connection record, a CoAP listener
//! record, or both at once — `uspa-storage::state::mtp` keys
//! `stomp_connections` and `coap_listeners` independently by `mtp_id`
//! precisely so that coexistence is representable without a union type.
//! This module is the read-side view over that split state plus the
//! `Start`/`Stop` event-producing operations; it does not talk to the
//! transports themselves (that is `uspa-adapters`, on the other side of
//! the channel).

use uspa_core::{Event, MtpStartConfig};
use uspa_storage::state::{CoapListenerRecord, MtpRecord, StompConnectionRecord};
use uspa_storage::MaterializedState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MtpKind {
    Stomp,
    Coap,
    /// Both a STOMP connection and a CoAP listener are bound to this row.
    Both,
}

/// A read-side snapshot of one Agent MTP Table row, joining the records the
/// `mtp_id` key spans.
#[derive(Debug, Clone)]
pub struct MtpRow<'a> {
    pub mtp: &'a MtpRecord,
    pub stomp: Option<&'a StompConnectionRecord>,
    pub coap: Option<&'a CoapListenerRecord>,
}

impl MtpRow<'_> {
    pub fn kind(&self) -> Option<MtpKind> {
        match (self.stomp.is_some(), self.coap.is_some()) {
            (true, true) => Some(MtpKind::Both),
            (true, false) => Some(MtpKind::Stomp),
            (false, true) => Some(MtpKind::Coap),
            (false, false) => None,
        }
    }

    /// Up iff every transport bound to this row is up — a row is only as
    /// healthy as its worst-off transport.
    pub fn is_up(&self) -> bool {
        let stomp_up = self.stomp.map(|s| s.state == "RUNNING").unwrap_or(true);
        let coap_up = self.coap.map(|c| c.bound).unwrap_or(true);
        stomp_up && coap_up
    }
}

pub struct AgentMtpTable;

impl AgentMtpTable {
    pub fn row<'a>(state: &'a MaterializedState, mtp_id: u32) -> Option<MtpRow<'a>> {
        let mtp = state.mtps.get(&mtp_id)?;
        Some(MtpRow { mtp, stomp: state.stomp_connections.get(&mtp_id), coap: state.coap_listeners.get(&mtp_id) })
    }

    pub fn rows(state: &MaterializedState) -> impl Iterator<Item = MtpRow<'_>> {
        state.mtps.keys().copied().filter_map(move |mtp_id| Self::row(state, mtp_id))
    }

    /// The row's id currently serving as this agent's preferred sender for
    /// `controller`, if any row is up. Ties broken by lowest `mtp_id` for
    /// determinism.
    pub fn preferred_for(state: &MaterializedState, _controller_hint: Option<&str>) -> Option<u32> {
        let mut up: Vec<u32> = Self::rows(state).filter(MtpRow::is_up).map(|row| row.mtp.mtp_id).collect();
        up.sort_unstable();
        up.into_iter().next()
    }

    pub fn start(mtp_id: u32, protocol: impl Into<String>) -> Event {
        Event::MtpStarted { mtp_id, protocol: protocol.into() }
    }

    pub fn stop(mtp_id: u32) -> Event {
        Event::MtpStopped { mtp_id }
    }

    /// Resolve the `[MtpStartConfig]` the MTP task needs to bring up
    /// `Device.LocalAgent.MTP.{mtp_id}.` from its current parameter values.
    /// `None` if the row doesn't exist, its `Protocol` is unset/unsupported,
    /// or (for STOMP) its `STOMP.Reference` points at a connection row that
    /// isn't present — all conditions the Agent MTP Table's add validator
    /// (`uspa-daemon::datamodel`) is meant to prevent from arising in the
    /// first place, so this is a defensive read, not a primary validation.
    pub fn start_config(state: &MaterializedState, mtp_id: u32) -> Option<MtpStartConfig> {
        let prefix = format!("Device.LocalAgent.MTP.{mtp_id}.");
        let protocol = state.param(&format!("{prefix}Protocol"))?;
        match protocol {
            "STOMP" => {
                let reference = state.param(&format!("{prefix}STOMP.Reference"))?.trim_end_matches('.');
                let conn_prefix = format!("{reference}.");
                let host = state.param(&format!("{conn_prefix}Host"))?.to_string();
                let port = state.param(&format!("{conn_prefix}Port"))?.parse().ok()?;
                let destination = state.param(&format!("{prefix}STOMP.Destination")).unwrap_or_default().to_string();
                let login = state.param(&format!("{conn_prefix}Username")).filter(|s| !s.is_empty()).map(String::from);
                let passcode =
                    uspa_storage::db::deobfuscate(state.param(&format!("{conn_prefix}Password")).unwrap_or_default())
                        .filter(|s| !s.is_empty());
                Some(MtpStartConfig::Stomp { host, port, login, passcode, destination, tls: false })
            }
            "CoAP" => {
                let port = state.param(&format!("{prefix}CoAP.Port"))?;
                let resource_path = state.param(&format!("{prefix}CoAP.Path")).unwrap_or("/usp").to_string();
                Some(MtpStartConfig::Coap { bind_addr: format!("0.0.0.0:{port}"), resource_path })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "mtp_table_tests.rs"]
mod tests;
