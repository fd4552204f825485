//! HID function definitions: report layouts and per-interface settings.

pub mod keyboard;
pub mod mouse;

use crate::config;

/// Interface class code for HID.
pub const HID_CLASS: u8 = 0x03;

/// Interface subclass code for boot-capable HID devices.
pub const HID_SUBCLASS_BOOT: u8 = 0x01;

/// Kind of HID function exposed on one interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidKind {
    Keyboard,
    Mouse,
}

impl HidKind {
    /// Boot interface protocol code (`bInterfaceProtocol`).
    pub const fn boot_protocol(self) -> u8 {
        match self {
            HidKind::Keyboard => 1,
            HidKind::Mouse => 2,
        }
    }

    /// Report descriptor the host fetches for this interface.
    pub const fn report_descriptor(self) -> &'static [u8] {
        match self {
            HidKind::Keyboard => keyboard::KEYBOARD_REPORT_DESCRIPTOR,
            HidKind::Mouse => mouse::MOUSE_REPORT_DESCRIPTOR,
        }
    }

    /// Size of one input report.
    pub const fn report_size(self) -> usize {
        match self {
            HidKind::Keyboard => keyboard::KEYBOARD_REPORT_SIZE,
            HidKind::Mouse => mouse::MOUSE_REPORT_SIZE,
        }
    }
}

/// One HID interface of the composite device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidFunction {
    pub kind: HidKind,
    /// `iInterface` string index (0 = none).
    pub string_index: u8,
    /// Interrupt IN max packet size.
    pub max_packet_size: u16,
    /// Interrupt IN polling interval (frames).
    pub poll_interval: u8,
}

impl HidFunction {
    /// Function with the firmware's default endpoint settings.
    pub const fn new(kind: HidKind) -> Self {
        Self {
            kind,
            string_index: 0,
            max_packet_size: config::USB_HID_EP_SIZE,
            poll_interval: config::USB_HID_POLL_MS,
        }
    }
}

/// Functions of the composite device, in interface order.
pub const COMPOSITE_FUNCTIONS: [HidFunction; 2] = [
    HidFunction::new(HidKind::Keyboard),
    HidFunction::new(HidKind::Mouse),
];

/// Interface number of the keyboard function.
pub const KEYBOARD_INTERFACE: u8 = 0;

/// Interface number of the mouse function.
pub const MOUSE_INTERFACE: u8 = 1;
