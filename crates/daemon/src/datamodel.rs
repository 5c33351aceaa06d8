// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TR-181 schema registration for this agent.
//!
//! Registration happens once at startup, single-threaded, before either the
//! MTP or DM task begins running — the same boot ordering
//! `uspa_engine::registry::Registry` documents for its own `seal`.
//!
//! Parameters whose live value is derived from something other than a plain
//! DB row (`Device.LocalAgent.MTP.{i}.Status`, `...NumberOfEntries`,
//! `Device.DeviceInfo.UpTime`) are registered as ordinary
//! [`StorageClass::InDb`]/[`StorageClass::VendorComputed`] parameters but are
//! never written by a `Set` — [`crate::projections`] is what keeps their
//! `state.params` row current, so the existing uniform `Get` path (which
//! only ever reads `state.params`, see `uspa-engine::dispatch::group_by_object`)
//! surfaces them without any special-casing.

use std::sync::Arc;
use std::time::Instant;

use uspa_core::schema::{ObjectDef, ParamDef};
use uspa_core::{Access, LocalAgentIdentity, ParamType, ParamValue, StorageClass, UspError};
use uspa_engine::{Registry, RegistryError};

/// Register every parameter and object this agent exposes. Returns a sealed
/// registry ready to hand to the DM task.
pub fn build(identity: &LocalAgentIdentity, boot_time: Instant) -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();

    register_local_agent(&mut registry, identity)?;
    register_device_info(&mut registry, boot_time)?;
    register_agent_mtp_table(&mut registry)?;
    register_stomp_connection_table(&mut registry)?;
    register_subscription_table(&mut registry)?;
    crate::operations::build(&mut registry)?;

    registry.seal();
    Ok(registry)
}

/// Notification kinds a `Device.LocalAgent.Subscription` row may request
///. Shared with `crate::notify`, which matches live rows against
/// this same set when deciding what to poll or fire on.
pub const NOTIF_TYPES: &[&str] =
    &["ValueChange", "ObjectCreation", "ObjectDeletion", "OperationComplete", "Event", "Periodic"];

fn register_local_agent(registry: &mut Registry, identity: &LocalAgentIdentity) -> Result<(), RegistryError> {
    registry.register_parameter(
        ParamDef::simple("Device.LocalAgent.EndpointID", ParamType::String, Access::ReadOnly)
            .with_default(ParamValue::String(identity.endpoint_id.to_string())),
    )?;
    Ok(())
}

fn register_device_info(registry: &mut Registry, boot_time: Instant) -> Result<(), RegistryError> {
    registry.register_parameter(ParamDef::simple(
        "Device.DeviceInfo.Manufacturer",
        ParamType::String,
        Access::ReadOnly,
    ))?;
    registry.register_parameter(ParamDef::simple("Device.DeviceInfo.ModelName", ParamType::String, Access::ReadOnly))?;
    registry.register_parameter(ParamDef::simple(
        "Device.DeviceInfo.SerialNumber",
        ParamType::String,
        Access::ReadOnly,
    ))?;

    let mut up_time = ParamDef::simple("Device.DeviceInfo.UpTime", ParamType::UnsignedInt, Access::ReadOnly);
    up_time.storage = StorageClass::VendorComputed;
    up_time.getter = Some(Arc::new(move || Ok(ParamValue::UnsignedInt(boot_time.elapsed().as_secs()))));
    registry.register_parameter(up_time)?;
    Ok(())
}

fn register_agent_mtp_table(registry: &mut Registry) -> Result<(), RegistryError> {
    let mut table = ObjectDef::multi_instance("Device.LocalAgent.MTP.{i}.");
    table.add_validator = Some(Arc::new(|settings| {
        if let Some(protocol) = settings.get("Protocol") {
            if protocol != "STOMP" && protocol != "CoAP" {
                return Err(UspError::InvalidValue(format!("unsupported MTP Protocol: {protocol}")));
            }
        }
        Ok(())
    }));
    registry.register_parameter(ParamDef::simple(
        table.number_of_entries_path(),
        ParamType::UnsignedInt,
        Access::ReadOnly,
    ))?;
    registry.register_object(table)?;

    registry.register_parameter(ParamDef::simple(
        "Device.LocalAgent.MTP.{i}.Enable",
        ParamType::Boolean,
        Access::ReadWrite,
    ).with_default(ParamValue::Boolean(false)))?;

    registry.register_parameter(
        ParamDef::simple("Device.LocalAgent.MTP.{i}.Protocol", ParamType::String, Access::ReadWrite)
            .with_validator(Arc::new(|value| match value {
                ParamValue::String(s) if s == "STOMP" || s == "CoAP" => Ok(()),
                _ => Err(UspError::InvalidValue(format!("unsupported MTP Protocol: {value}"))),
            })),
    )?;

    registry.register_parameter(ParamDef::simple(
        "Device.LocalAgent.MTP.{i}.STOMP.Reference",
        ParamType::String,
        Access::ReadWrite,
    ))?;
    registry.register_parameter(ParamDef::simple(
        "Device.LocalAgent.MTP.{i}.STOMP.Destination",
        ParamType::String,
        Access::ReadWrite,
    ))?;
    registry.register_parameter(ParamDef::simple(
        "Device.LocalAgent.MTP.{i}.CoAP.Port",
        ParamType::UnsignedInt,
        Access::ReadWrite,
    ))?;
    registry.register_parameter(ParamDef::simple(
        "Device.LocalAgent.MTP.{i}.CoAP.Path",
        ParamType::String,
        Access::ReadWrite,
    ))?;

    // Mirrored by `crate::projections` whenever the transport's live status
    // changes; never targeted by a `Set` — it reflects the underlying
    // transport state machine, not a configured value.
    registry.register_parameter(ParamDef::simple(
        "Device.LocalAgent.MTP.{i}.Status",
        ParamType::String,
        Access::ReadOnly,
    ).with_default(ParamValue::String("Down".to_string())))?;

    Ok(())
}

fn register_stomp_connection_table(registry: &mut Registry) -> Result<(), RegistryError> {
    let table = ObjectDef::multi_instance("Device.STOMP.Connection.{i}.");
    registry.register_parameter(ParamDef::simple(
        table.number_of_entries_path(),
        ParamType::UnsignedInt,
        Access::ReadOnly,
    ))?;
    registry.register_object(table)?;

    registry.register_parameter(ParamDef::simple(
        "Device.STOMP.Connection.{i}.Host",
        ParamType::String,
        Access::ReadWrite,
    ))?;
    registry.register_parameter(ParamDef::simple(
        "Device.STOMP.Connection.{i}.Port",
        ParamType::UnsignedInt,
        Access::ReadWrite,
    ).with_default(ParamValue::UnsignedInt(61613)))?;
    registry.register_parameter(ParamDef::simple(
        "Device.STOMP.Connection.{i}.Username",
        ParamType::String,
        Access::ReadWrite,
    ))?;
    registry.register_parameter(
        ParamDef::simple("Device.STOMP.Connection.{i}.Password", ParamType::String, Access::ReadWrite).secure(),
    )?;
    registry.register_parameter(ParamDef::simple(
        "Device.STOMP.Connection.{i}.VirtualHost",
        ParamType::String,
        Access::ReadWrite,
    ))?;

    // Mirrored by `crate::projections` from `Event::StompStateChanged`.
    registry.register_parameter(ParamDef::simple(
        "Device.STOMP.Connection.{i}.State",
        ParamType::String,
        Access::ReadOnly,
    ).with_default(ParamValue::String("IDLE".to_string())))?;

    Ok(())
}

/// `Device.LocalAgent.Subscription.{i}.`: one row per live
/// subscription. `Recipient` and `NotifType` are supplied at Add time and
/// never change afterward in this build — re-pointing a subscription is
/// handled as delete and re-Add (see `DESIGN.md`), so neither carries a
/// validator beyond `NotifType`'s fixed vocabulary.
fn register_subscription_table(registry: &mut Registry) -> Result<(), RegistryError> {
    let mut table = ObjectDef::multi_instance("Device.LocalAgent.Subscription.{i}.");
    table.add_validator = Some(Arc::new(|settings| {
        if let Some(notif_type) = settings.get("NotifType") {
            if !NOTIF_TYPES.contains(&notif_type.as_str()) {
                return Err(UspError::InvalidValue(format!("unsupported NotifType: {notif_type}")));
            }
        }
        if settings.get("Recipient").map(|s| s.is_empty()).unwrap_or(true) {
            return Err(UspError::InvalidValue("Recipient is required".to_string()));
        }
        Ok(())
    }));
    registry.register_parameter(ParamDef::simple(
        table.number_of_entries_path(),
        ParamType::UnsignedInt,
        Access::ReadOnly,
    ))?;
    registry.register_object(table)?;

    registry.register_parameter(
        ParamDef::simple("Device.LocalAgent.Subscription.{i}.Enable", ParamType::Boolean, Access::ReadWrite)
            .with_default(ParamValue::Boolean(true)),
    )?;
    registry.register_parameter(ParamDef::simple(
        "Device.LocalAgent.Subscription.{i}.Recipient",
        ParamType::String,
        Access::ReadWrite,
    ))?;
    registry.register_parameter(
        ParamDef::simple("Device.LocalAgent.Subscription.{i}.NotifType", ParamType::String, Access::ReadWrite)
            .with_validator(Arc::new(|value| match value {
                ParamValue::String(s) if NOTIF_TYPES.contains(&s.as_str()) => Ok(()),
                _ => Err(UspError::InvalidValue(format!("unsupported NotifType: {value}"))),
            })),
    )?;
    // Space-separated path expressions this subscription watches; consulted
    // by `crate::notify` every poll tick for `ValueChange` rows, resolved
    // once per `ObjectCreation`/`ObjectDeletion` row whenever the owning
    // table it names changes.
    registry.register_parameter(ParamDef::simple(
        "Device.LocalAgent.Subscription.{i}.ReferenceList",
        ParamType::String,
        Access::ReadWrite,
    ))?;
    registry.register_parameter(
        ParamDef::simple("Device.LocalAgent.Subscription.{i}.Persistent", ParamType::Boolean, Access::ReadWrite)
            .with_default(ParamValue::Boolean(false)),
    )?;

    Ok(())
}

#[cfg(test)]
#[path = "datamodel_tests.rs"]
mod tests;
