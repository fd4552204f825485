//! Cross-descriptor tests for the composite descriptor set.
//!
//! These run on the host and check the invariants the host OS relies on
//! when it parses the set during enumeration.

use super::*;
use crate::hid::{HidKind, COMPOSITE_FUNCTIONS, KEYBOARD_INTERFACE, MOUSE_INTERFACE};

// ═══════════════════════════════════════════════════════════════════════════
// Configuration descriptor invariants
// ═══════════════════════════════════════════════════════════════════════════

fn check_configuration(functions: &[HidFunction]) {
    let desc = build_configuration_descriptor(functions, &ConfigurationOptions::default()).unwrap();
    let n = functions.len();

    // wTotalLength == header + N × block == actual blob length
    let expected = configuration::CONFIG_HEADER_LEN + n * configuration::HID_BLOCK_LEN;
    assert_eq!(desc.total_length() as usize, expected);
    assert_eq!(desc.as_bytes().len(), expected);
    assert_eq!(desc.as_bytes()[4] as usize, n);

    let mut interfaces = std::vec::Vec::new();
    let mut endpoints = std::vec::Vec::new();
    let mut walked = 0;
    for (kind, record) in iter_descriptors(desc.as_bytes()) {
        walked += record.len();
        match kind {
            DESC_TYPE_INTERFACE => interfaces.push(record[2]),
            DESC_TYPE_ENDPOINT => endpoints.push(record[2]),
            _ => {}
        }
    }
    assert_eq!(walked, expected);

    let sequential: std::vec::Vec<u8> = (0..n as u8).collect();
    assert_eq!(interfaces, sequential);

    assert_eq!(endpoints.len(), n);
    for (i, ep) in endpoints.iter().enumerate() {
        assert_ne!(ep & ENDPOINT_DIR_IN, 0, "endpoint {ep:#04x} is not IN");
        assert!(!endpoints[..i].contains(ep), "duplicate endpoint {ep:#04x}");
    }
}

#[test]
fn single_function_configuration_is_consistent() {
    check_configuration(&[HidFunction::new(HidKind::Keyboard)]);
    check_configuration(&[HidFunction::new(HidKind::Mouse)]);
}

#[test]
fn two_function_configuration_is_consistent() {
    check_configuration(&COMPOSITE_FUNCTIONS);
    check_configuration(&[
        HidFunction::new(HidKind::Mouse),
        HidFunction::new(HidKind::Mouse),
    ]);
}

#[test]
fn keyboard_mouse_interfaces_and_endpoints() {
    let desc =
        build_configuration_descriptor(&COMPOSITE_FUNCTIONS, &ConfigurationOptions::default())
            .unwrap();
    let allocs = desc.allocations();
    assert_eq!(allocs[0].interface, 0);
    assert_eq!(allocs[1].interface, 1);
    assert_eq!(allocs[0].endpoint_address, 0x81);
    assert_eq!(allocs[1].endpoint_address, 0x82);
}

#[test]
fn hid_descriptor_reports_report_length() {
    let desc =
        build_configuration_descriptor(&COMPOSITE_FUNCTIONS, &ConfigurationOptions::default())
            .unwrap();
    let lengths: std::vec::Vec<u16> = iter_descriptors(desc.as_bytes())
        .filter(|(kind, _)| *kind == DESC_TYPE_HID)
        .map(|(_, r)| u16::from_le_bytes([r[7], r[8]]))
        .collect();
    assert_eq!(
        lengths,
        [
            HidKind::Keyboard.report_descriptor().len() as u16,
            HidKind::Mouse.report_descriptor().len() as u16,
        ]
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// Descriptor set
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn composite_set_selects_report_by_interface() {
    let set = DescriptorSet::composite().unwrap();
    assert_eq!(
        set.report_descriptor(KEYBOARD_INTERFACE),
        Some(crate::hid::keyboard::KEYBOARD_REPORT_DESCRIPTOR)
    );
    assert_eq!(
        set.report_descriptor(MOUSE_INTERFACE),
        Some(crate::hid::mouse::MOUSE_REPORT_DESCRIPTOR)
    );
    assert_eq!(set.report_descriptor(2), None);
}

#[test]
fn composite_set_strings() {
    let set = DescriptorSet::composite().unwrap();
    let lens: std::vec::Vec<usize> = set.strings.entries().iter().map(|s| s.len()).collect();
    // language, "Pico PIO USB", "Pico PIO USB Device", "123456"
    assert_eq!(lens, [4, 26, 40, 14]);
    assert_eq!(set.device[DEVICE_DESCRIPTOR_LEN - 1], 1);
}

#[test]
fn descriptor_set_rejects_empty_function_list() {
    let strings = build_string_table(&[], 0x0409);
    assert_eq!(
        DescriptorSet::new(&[], &ConfigurationOptions::default(), strings).unwrap_err(),
        Error::NoFunctions
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// Descriptor walker
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn iter_stops_on_truncated_record() {
    let bytes = [0x09, 0x02, 0, 0, 0, 0, 0, 0, 0, 0x07, 0x05, 0x81];
    let kinds: std::vec::Vec<u8> = iter_descriptors(&bytes).map(|(k, _)| k).collect();
    assert_eq!(kinds, [DESC_TYPE_CONFIGURATION]);
}

#[test]
fn iter_stops_on_zero_length() {
    let bytes = [0x00, 0x02, 0x09];
    assert_eq!(iter_descriptors(&bytes).count(), 0);
    assert_eq!(iter_descriptors(&[]).count(), 0);
}
