//! Standard device descriptor (USB 2.0 §9.6.1).

use super::DESC_TYPE_DEVICE;
use crate::config;

/// Wire length of a device descriptor.
pub const DEVICE_DESCRIPTOR_LEN: usize = 18;

/// Fields of the device descriptor, in wire order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceDescriptor {
    pub usb_release: u16,
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
    pub max_packet_size0: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub device_release: u16,
    pub manufacturer_index: u8,
    pub product_index: u8,
    pub serial_index: u8,
    pub num_configurations: u8,
}

impl DeviceDescriptor {
    /// Serialise into the 18-byte wire record.
    pub const fn to_bytes(&self) -> [u8; DEVICE_DESCRIPTOR_LEN] {
        let usb = self.usb_release.to_le_bytes();
        let vid = self.vendor_id.to_le_bytes();
        let pid = self.product_id.to_le_bytes();
        let rel = self.device_release.to_le_bytes();
        [
            DEVICE_DESCRIPTOR_LEN as u8,
            DESC_TYPE_DEVICE,
            usb[0],
            usb[1],
            self.class,
            self.subclass,
            self.protocol,
            self.max_packet_size0,
            vid[0],
            vid[1],
            pid[0],
            pid[1],
            rel[0],
            rel[1],
            self.manufacturer_index,
            self.product_index,
            self.serial_index,
            self.num_configurations,
        ]
    }
}

/// The composite keyboard + mouse device.
///
/// Class codes are zero: each interface declares its own class.
pub const DEVICE: DeviceDescriptor = DeviceDescriptor {
    usb_release: config::USB_SPEC_RELEASE,
    class: 0x00,
    subclass: 0x00,
    protocol: 0x00,
    max_packet_size0: config::USB_CONTROL_MAX_PACKET,
    vendor_id: config::USB_VID,
    product_id: config::USB_PID,
    device_release: config::USB_DEVICE_RELEASE,
    manufacturer_index: 1,
    product_index: 2,
    serial_index: 3,
    num_configurations: 1,
};

/// Build the device descriptor for the composite device.
pub const fn build_device_descriptor() -> [u8; DEVICE_DESCRIPTOR_LEN] {
    DEVICE.to_bytes()
}

/// Device descriptor image handed to the engine.
pub static DEVICE_DESCRIPTOR: [u8; DEVICE_DESCRIPTOR_LEN] = build_device_descriptor();

const _: () = {
    let bytes = build_device_descriptor();
    assert!(bytes.len() == 18, "device descriptor must be 18 bytes");
    assert!(bytes[0] as usize == bytes.len(), "bLength disagrees with record size");
    assert!(bytes[17] == 1, "exactly one configuration");
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_descriptor_wire_image() {
        assert_eq!(
            build_device_descriptor(),
            [
                0x12, 0x01, // bLength, bDescriptorType
                0x10, 0x01, // bcdUSB 1.1
                0x00, 0x00, 0x00, // class / subclass / protocol
                0x40, // bMaxPacketSize0
                0xFE, 0xCA, // idVendor
                0x1A, 0xEF, // idProduct
                0x00, 0x01, // bcdDevice
                0x01, 0x02, 0x03, // string indices
                0x01, // bNumConfigurations
            ]
        );
    }

    #[test]
    fn device_descriptor_has_single_configuration() {
        let bytes = build_device_descriptor();
        assert_eq!(bytes.len(), DEVICE_DESCRIPTOR_LEN);
        assert_eq!(bytes[17], 1);
    }

    #[test]
    fn custom_ids_are_little_endian() {
        let desc = DeviceDescriptor {
            vendor_id: 0x1209,
            product_id: 0x0001,
            ..DEVICE
        };
        let bytes = desc.to_bytes();
        assert_eq!(&bytes[8..12], &[0x09, 0x12, 0x01, 0x00]);
    }
}
