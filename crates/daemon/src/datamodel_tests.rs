// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use uspa_core::{SerialSource, StorageClass};

fn identity() -> LocalAgentIdentity {
    LocalAgentIdentity::derive("00D09E", "USPAgent", SerialSource::Explicit("0000001".to_string()), None)
        .expect("derive identity")
}

#[test]
fn registers_endpoint_id_as_a_constant_default() {
    let registry = build(&identity(), Instant::now()).expect("build registry");
    let def = registry.find_parameter("Device.LocalAgent.EndpointID").expect("endpoint id registered");
    assert_eq!(def.default, Some(ParamValue::String(identity().endpoint_id.to_string())));
}

#[test]
fn registers_up_time_as_vendor_computed() {
    let registry = build(&identity(), Instant::now()).expect("build registry");
    let def = registry.find_parameter("Device.DeviceInfo.UpTime").expect("uptime registered");
    assert_eq!(def.storage, StorageClass::VendorComputed);
    let getter = def.getter.as_ref().expect("uptime has a getter");
    assert!(matches!(getter(), Ok(ParamValue::UnsignedInt(_))));
}

#[test]
fn mtp_table_rejects_an_unsupported_protocol_on_add() {
    let registry = build(&identity(), Instant::now()).expect("build registry");
    let object = registry.find_object("Device.LocalAgent.MTP.").expect("mtp table registered");
    let validator = object.add_validator.as_ref().expect("mtp table has an add validator");

    let mut settings = std::collections::HashMap::new();
    settings.insert("Protocol".to_string(), "FTP".to_string());
    assert!(validator(&settings).is_err());

    settings.insert("Protocol".to_string(), "STOMP".to_string());
    assert!(validator(&settings).is_ok());
}

#[test]
fn stomp_connection_password_is_marked_secure() {
    let registry = build(&identity(), Instant::now()).expect("build registry");
    let def = registry.find_parameter("Device.STOMP.Connection.1.Password").expect("password registered");
    assert!(def.secure);
}

#[test]
fn mtp_and_stomp_connection_number_of_entries_are_registered() {
    let registry = build(&identity(), Instant::now()).expect("build registry");
    assert!(registry.find_parameter("Device.LocalAgent.MTPNumberOfEntries").is_some());
    assert!(registry.find_parameter("Device.STOMP.ConnectionNumberOfEntries").is_some());
}

#[test]
fn subscription_table_rejects_an_unsupported_notif_type_or_a_missing_recipient() {
    let registry = build(&identity(), Instant::now()).expect("build registry");
    let object = registry.find_object("Device.LocalAgent.Subscription.").expect("subscription table registered");
    let validator = object.add_validator.as_ref().expect("subscription table has an add validator");

    let mut settings = std::collections::HashMap::new();
    settings.insert("Recipient".to_string(), "self::controller".to_string());
    settings.insert("NotifType".to_string(), "Telekinesis".to_string());
    assert!(validator(&settings).is_err());

    settings.insert("NotifType".to_string(), "ValueChange".to_string());
    assert!(validator(&settings).is_ok());

    settings.remove("Recipient");
    assert!(validator(&settings).is_err());
}
