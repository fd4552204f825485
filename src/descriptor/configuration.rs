//! Configuration descriptor assembly.
//!
//! ```text
//! Configuration header                 9 bytes
//! per HID function:
//!   Interface descriptor               9 bytes
//!   HID class descriptor               9 bytes
//!   Endpoint descriptor (interrupt IN) 7 bytes
//! ```

use heapless::Vec;

use super::{
    DESC_TYPE_CONFIGURATION, DESC_TYPE_ENDPOINT, DESC_TYPE_HID, DESC_TYPE_HID_REPORT,
    DESC_TYPE_INTERFACE, ENDPOINT_DIR_IN, MAX_HID_FUNCTIONS,
};
use crate::config;
use crate::error::Error;
use crate::hid::{HidFunction, HID_CLASS, HID_SUBCLASS_BOOT};

/// Configuration header length.
pub const CONFIG_HEADER_LEN: usize = 9;
/// Interface + HID + endpoint block length.
pub const HID_BLOCK_LEN: usize = INTERFACE_LEN + HID_DESC_LEN + ENDPOINT_LEN;

const INTERFACE_LEN: usize = 9;
const HID_DESC_LEN: usize = 9;
const ENDPOINT_LEN: usize = 7;

/// Largest configuration descriptor this firmware can emit.
pub const CONFIG_DESCRIPTOR_CAPACITY: usize = CONFIG_HEADER_LEN + MAX_HID_FUNCTIONS * HID_BLOCK_LEN;

/// HID class release implemented (1.11, BCD).
const HID_RELEASE: u16 = 0x0111;

/// `bmAttributes` bit 7 is reserved and must be set.
const ATTR_RESERVED: u8 = 0x80;
const ATTR_SELF_POWERED: u8 = 0x40;
const ATTR_REMOTE_WAKEUP: u8 = 0x20;

/// Interrupt transfer type.
const XFER_INTERRUPT: u8 = 0x03;

const _: () = assert!(HID_BLOCK_LEN == 25);

/// Configuration-level settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigurationOptions {
    /// `bConfigurationValue`.
    pub value: u8,
    /// `iConfiguration` string index.
    pub string_index: u8,
    pub self_powered: bool,
    /// Advertise remote-wakeup capability (never exercised).
    pub remote_wakeup: bool,
    pub max_power_ma: u16,
}

impl Default for ConfigurationOptions {
    fn default() -> Self {
        Self {
            value: 1,
            string_index: 0,
            self_powered: false,
            remote_wakeup: true,
            max_power_ma: config::USB_MAX_POWER_MA,
        }
    }
}

impl ConfigurationOptions {
    fn attributes(&self) -> u8 {
        let mut attr = ATTR_RESERVED;
        if self.self_powered {
            attr |= ATTR_SELF_POWERED;
        }
        if self.remote_wakeup {
            attr |= ATTR_REMOTE_WAKEUP;
        }
        attr
    }

    /// `bMaxPower` is in 2 mA units; anything above 500 mA is clamped.
    fn max_power(&self) -> u8 {
        (self.max_power_ma.min(500) / 2) as u8
    }
}

/// Interface and endpoint chosen for one HID function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterfaceAllocation {
    pub interface: u8,
    pub endpoint_address: u8,
}

impl InterfaceAllocation {
    /// Logical endpoint index used to look the endpoint up in the engine.
    pub const fn endpoint_index(&self) -> u8 {
        self.endpoint_address & 0x0F
    }
}

/// Assembled configuration descriptor blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigurationDescriptor {
    bytes: Vec<u8, CONFIG_DESCRIPTOR_CAPACITY>,
    allocations: Vec<InterfaceAllocation, MAX_HID_FUNCTIONS>,
}

impl ConfigurationDescriptor {
    /// Wire image.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `wTotalLength` as embedded in the header.
    pub fn total_length(&self) -> u16 {
        u16::from_le_bytes([self.bytes[2], self.bytes[3]])
    }

    /// Interface/endpoint allocation, in function order.
    pub fn allocations(&self) -> &[InterfaceAllocation] {
        &self.allocations
    }

    pub fn num_interfaces(&self) -> u8 {
        self.allocations.len() as u8
    }
}

/// Logical endpoint index of the interrupt IN endpoint serving `interface`.
///
/// Index 0 is the control endpoint, so interface `i` uses endpoint `i + 1`.
pub const fn endpoint_index_for(interface: u8) -> u8 {
    interface + 1
}

/// Build a configuration descriptor with one HID interface per function.
///
/// Function `i` gets interface number `i` and IN endpoint `0x81 + i`.
/// Empty input or more than [`MAX_HID_FUNCTIONS`] functions is rejected.
pub fn build_configuration_descriptor(
    functions: &[HidFunction],
    options: &ConfigurationOptions,
) -> Result<ConfigurationDescriptor, Error> {
    if functions.is_empty() {
        return Err(Error::NoFunctions);
    }
    if functions.len() > MAX_HID_FUNCTIONS {
        return Err(Error::TooManyFunctions);
    }

    let total_len = CONFIG_HEADER_LEN + functions.len() * HID_BLOCK_LEN;
    let mut bytes: Vec<u8, CONFIG_DESCRIPTOR_CAPACITY> = Vec::new();
    let mut allocations = Vec::new();

    bytes
        .extend_from_slice(&config_header(total_len as u16, functions.len() as u8, options))
        .map_err(|_| Error::BufferOverflow)?;

    for (i, function) in functions.iter().enumerate() {
        let alloc = InterfaceAllocation {
            interface: i as u8,
            endpoint_address: ENDPOINT_DIR_IN | endpoint_index_for(i as u8),
        };
        bytes
            .extend_from_slice(&hid_block(function, &alloc))
            .map_err(|_| Error::BufferOverflow)?;
        allocations
            .push(alloc)
            .map_err(|_| Error::TooManyFunctions)?;
    }

    debug_assert_eq!(bytes.len(), total_len);

    Ok(ConfigurationDescriptor { bytes, allocations })
}

fn config_header(
    total_len: u16,
    num_interfaces: u8,
    options: &ConfigurationOptions,
) -> [u8; CONFIG_HEADER_LEN] {
    let total = total_len.to_le_bytes();
    [
        CONFIG_HEADER_LEN as u8,
        DESC_TYPE_CONFIGURATION,
        total[0],
        total[1],
        num_interfaces,
        options.value,
        options.string_index,
        options.attributes(),
        options.max_power(),
    ]
}

fn hid_block(function: &HidFunction, alloc: &InterfaceAllocation) -> [u8; HID_BLOCK_LEN] {
    let hid_release = HID_RELEASE.to_le_bytes();
    let report_len = (function.kind.report_descriptor().len() as u16).to_le_bytes();
    let packet = function.max_packet_size.to_le_bytes();
    let protocol = function.kind.boot_protocol();
    [
        // Interface
        INTERFACE_LEN as u8,
        DESC_TYPE_INTERFACE,
        alloc.interface,
        0, // bAlternateSetting
        1, // bNumEndpoints
        HID_CLASS,
        if protocol != 0 { HID_SUBCLASS_BOOT } else { 0 },
        protocol,
        function.string_index,
        // HID
        HID_DESC_LEN as u8,
        DESC_TYPE_HID,
        hid_release[0],
        hid_release[1],
        0, // bCountryCode
        1, // bNumDescriptors
        DESC_TYPE_HID_REPORT,
        report_len[0],
        report_len[1],
        // Endpoint
        ENDPOINT_LEN as u8,
        DESC_TYPE_ENDPOINT,
        alloc.endpoint_address,
        XFER_INTERRUPT,
        packet[0],
        packet[1],
        function.poll_interval,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::{HidKind, COMPOSITE_FUNCTIONS};

    #[test]
    fn composite_header_layout() {
        let desc =
            build_configuration_descriptor(&COMPOSITE_FUNCTIONS, &ConfigurationOptions::default())
                .unwrap();
        // 9 + 2 × 25 = 59, 2 interfaces, config 1, bus powered + remote wakeup, 100 mA
        assert_eq!(
            &desc.as_bytes()[..CONFIG_HEADER_LEN],
            &[0x09, 0x02, 59, 0x00, 0x02, 0x01, 0x00, 0xA0, 50]
        );
        assert_eq!(desc.total_length(), 59);
        assert_eq!(desc.num_interfaces(), 2);
    }

    #[test]
    fn keyboard_block_layout() {
        let desc = build_configuration_descriptor(
            &[HidFunction::new(HidKind::Keyboard)],
            &ConfigurationOptions::default(),
        )
        .unwrap();
        let report_len = HidKind::Keyboard.report_descriptor().len() as u8;
        assert_eq!(
            &desc.as_bytes()[CONFIG_HEADER_LEN..],
            &[
                0x09, 0x04, 0x00, 0x00, 0x01, 0x03, 0x01, 0x01, 0x00, // interface
                0x09, 0x21, 0x11, 0x01, 0x00, 0x01, 0x22, report_len, 0x00, // HID
                0x07, 0x05, 0x81, 0x03, 0x40, 0x00, 0x0A, // endpoint
            ]
        );
    }

    #[test]
    fn empty_function_list_is_rejected() {
        assert_eq!(
            build_configuration_descriptor(&[], &ConfigurationOptions::default()),
            Err(Error::NoFunctions)
        );
    }

    #[test]
    fn more_than_two_functions_is_rejected() {
        let functions = [HidFunction::new(HidKind::Mouse); 3];
        assert_eq!(
            build_configuration_descriptor(&functions, &ConfigurationOptions::default()),
            Err(Error::TooManyFunctions)
        );
    }

    #[test]
    fn power_and_attributes_follow_options() {
        let options = ConfigurationOptions {
            self_powered: true,
            remote_wakeup: false,
            max_power_ma: 900,
            ..ConfigurationOptions::default()
        };
        let desc = build_configuration_descriptor(&COMPOSITE_FUNCTIONS[..1], &options).unwrap();
        assert_eq!(desc.as_bytes()[7], 0xC0);
        assert_eq!(desc.as_bytes()[8], 250);
    }

    #[test]
    fn allocation_endpoint_index_strips_direction() {
        let desc =
            build_configuration_descriptor(&COMPOSITE_FUNCTIONS, &ConfigurationOptions::default())
                .unwrap();
        let indices: [u8; 2] = [
            desc.allocations()[0].endpoint_index(),
            desc.allocations()[1].endpoint_index(),
        ];
        assert_eq!(indices, [1, 2]);
    }
}
