//! USB descriptor builder.
//!
//! Produces the byte-exact descriptor set the host parses during
//! enumeration:
//!
//! - **Device** - fixed 18-byte record, checked at compile time
//! - **Configuration** - header + one interface/HID/endpoint block per
//!   HID function, with a consistent `wTotalLength`
//! - **HID report** - one per interface, selected by interface number
//! - **String** - language ID at index 0, UTF-16LE strings after it
//!
//! All of it is built before the device engine starts and never changes
//! afterwards.

pub mod configuration;
pub mod device;
pub mod string;

#[cfg(test)]
mod tests;

pub use configuration::{
    build_configuration_descriptor, endpoint_index_for, ConfigurationDescriptor,
    ConfigurationOptions, InterfaceAllocation,
};
pub use device::{build_device_descriptor, DEVICE_DESCRIPTOR, DEVICE_DESCRIPTOR_LEN};
pub use string::{build_string_table, StringDescriptor, StringTable};

use heapless::Vec;

use crate::config;
use crate::error::Error;
use crate::hid::HidFunction;

// Descriptor type codes

pub const DESC_TYPE_DEVICE: u8 = 0x01;
pub const DESC_TYPE_CONFIGURATION: u8 = 0x02;
pub const DESC_TYPE_STRING: u8 = 0x03;
pub const DESC_TYPE_INTERFACE: u8 = 0x04;
pub const DESC_TYPE_ENDPOINT: u8 = 0x05;
pub const DESC_TYPE_HID: u8 = 0x21;
pub const DESC_TYPE_HID_REPORT: u8 = 0x22;

/// Direction bit of an endpoint address: device-to-host.
pub const ENDPOINT_DIR_IN: u8 = 0x80;

/// Most HID functions one composite device may carry.
pub const MAX_HID_FUNCTIONS: usize = 2;

/// Everything the device engine needs to enumerate.
#[derive(Clone, Debug)]
pub struct DescriptorSet {
    pub device: &'static [u8; DEVICE_DESCRIPTOR_LEN],
    pub configuration: ConfigurationDescriptor,
    /// Report descriptors indexed by interface number.
    pub hid_reports: Vec<&'static [u8], MAX_HID_FUNCTIONS>,
    pub strings: StringTable,
}

impl DescriptorSet {
    /// Assemble the set for `functions`, in interface order.
    pub fn new(
        functions: &[HidFunction],
        options: &ConfigurationOptions,
        strings: StringTable,
    ) -> Result<Self, Error> {
        let configuration = build_configuration_descriptor(functions, options)?;
        let mut hid_reports = Vec::new();
        for function in functions {
            hid_reports
                .push(function.kind.report_descriptor())
                .map_err(|_| Error::TooManyFunctions)?;
        }

        Ok(Self {
            device: &DEVICE_DESCRIPTOR,
            configuration,
            hid_reports,
            strings,
        })
    }

    /// The composite keyboard + mouse set with the firmware's strings.
    pub fn composite() -> Result<Self, Error> {
        let strings = build_string_table(
            &[
                config::USB_MANUFACTURER,
                config::USB_PRODUCT,
                config::USB_SERIAL_NUMBER,
            ],
            config::USB_LANGUAGE_ID,
        );
        Self::new(
            &crate::hid::COMPOSITE_FUNCTIONS,
            &ConfigurationOptions::default(),
            strings,
        )
    }

    /// Report descriptor for `interface`.
    pub fn report_descriptor(&self, interface: u8) -> Option<&'static [u8]> {
        self.hid_reports.get(interface as usize).copied()
    }
}

/// Walk a concatenated descriptor blob, yielding `(bDescriptorType, record)`.
///
/// Stops at the first zero-length or truncated record.
pub fn iter_descriptors(bytes: &[u8]) -> DescriptorIter<'_> {
    DescriptorIter { rest: bytes }
}

pub struct DescriptorIter<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for DescriptorIter<'a> {
    type Item = (u8, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let len = *self.rest.first()? as usize;
        if len < 2 || len > self.rest.len() {
            self.rest = &[];
            return None;
        }
        let (record, rest) = self.rest.split_at(len);
        self.rest = rest;
        Some((record[1], record))
    }
}
