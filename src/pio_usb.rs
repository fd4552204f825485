//! Pico-PIO-USB device engine binding.
//!
//! The engine is C code built against the pico-sdk and linked as a
//! static library (see `build.rs`). It owns PIO0, PIO1 and DMA channel 0
//! for as long as the firmware runs; [`PioUsbEngine`] holds their Embassy
//! singletons so nothing else can claim them.

use core::ffi::c_void;
use core::ptr::{self, NonNull};

use defmt::debug;
use embassy_rp::peripherals::{DMA_CH0, PIO0, PIO1};
use pico_pio_hid::descriptor::{DescriptorSet, MAX_HID_FUNCTIONS};
use pico_pio_hid::engine::{InEndpoint, Pinout, PioUsbConfig, UsbDevice, UsbDeviceEngine};
use pico_pio_hid::{EngineInitError, Error};
use static_cell::StaticCell;

#[allow(non_camel_case_types)]
mod ffi {
    use core::ffi::{c_int, c_void};
    use core::marker::{PhantomData, PhantomPinned};

    use pico_pio_hid::descriptor::StringDescriptor;

    pub const PIO_USB_PINOUT_DPDM: c_int = 0;
    pub const PIO_USB_PINOUT_DMDP: c_int = 1;
    pub const PIO_USB_DEBUG_PIN_NONE: i8 = -1;

    #[repr(C)]
    pub struct pio_usb_configuration_t {
        pub pin_dp: u8,
        pub pio_tx_num: u8,
        pub sm_tx: u8,
        pub tx_ch: u8,
        pub pio_rx_num: u8,
        pub sm_rx: u8,
        pub sm_eop: u8,
        pub alarm_pool: *mut c_void,
        pub debug_pin_rx: i8,
        pub debug_pin_eop: i8,
        pub skip_alarm_pool: bool,
        pub pinout: c_int,
    }

    #[repr(C)]
    pub struct usb_descriptor_buffers_t {
        pub device: *const u8,
        pub config: *const u8,
        pub hid_report: *const *const u8,
        pub string: *const StringDescriptor,
    }

    #[repr(C)]
    pub struct usb_device_t {
        _data: [u8; 0],
        _marker: PhantomData<(*mut u8, PhantomPinned)>,
    }

    #[repr(C)]
    pub struct endpoint_t {
        _data: [u8; 0],
        _marker: PhantomData<(*mut u8, PhantomPinned)>,
    }

    extern "C" {
        pub fn pio_usb_device_init(
            c: *const pio_usb_configuration_t,
            buffers: *const usb_descriptor_buffers_t,
        ) -> *mut usb_device_t;
        pub fn pio_usb_device_task();
        pub fn pio_usb_get_endpoint(device: *mut usb_device_t, idx: u8) -> *mut endpoint_t;
        pub fn pio_usb_set_out_data(ep: *mut endpoint_t, buffer: *const u8, len: u8) -> c_int;
    }
}

/// Running PIO USB device (`usb_device_t`).
#[repr(transparent)]
pub struct PioUsbDevice(ffi::usb_device_t);

// SAFETY: the engine arbitrates endpoint buffers itself; core 1 only
// fills IN buffers while core 0 runs the protocol state machine.
unsafe impl Sync for PioUsbDevice {}

/// Endpoint of a running device (`endpoint_t`).
#[repr(transparent)]
pub struct PioEndpoint(ffi::endpoint_t);

impl UsbDevice for PioUsbDevice {
    type Endpoint = PioEndpoint;

    fn endpoint(&self, index: u8) -> Option<&PioEndpoint> {
        let device = self as *const Self as *mut ffi::usb_device_t;
        // SAFETY: `device` came from `pio_usb_device_init` and lives forever.
        let ep = unsafe { ffi::pio_usb_get_endpoint(device, index) };
        // SAFETY: endpoints are part of the device's static state.
        NonNull::new(ep).map(|ep| unsafe { &*(ep.as_ptr() as *const PioEndpoint) })
    }
}

impl InEndpoint for PioEndpoint {
    fn submit_report(&self, report: &[u8]) {
        let len = report.len().min(u8::MAX as usize) as u8;
        let ep = self as *const Self as *mut ffi::endpoint_t;
        // SAFETY: the engine copies `len` bytes out of `report` before returning.
        let rc = unsafe { ffi::pio_usb_set_out_data(ep, report.as_ptr(), len) };
        if rc != 0 {
            debug!("pio_usb_set_out_data returned {}", rc);
        }
    }
}

/// Configuration and pointer tables the engine keeps referring to.
struct EngineTables {
    config: ffi::pio_usb_configuration_t,
    hid_reports: [*const u8; MAX_HID_FUNCTIONS],
    buffers: ffi::usb_descriptor_buffers_t,
}

// SAFETY: every pointer targets `'static` immutable descriptor data.
unsafe impl Send for EngineTables {}

static TABLES: StaticCell<EngineTables> = StaticCell::new();

/// Owner of the PIO USB engine and the hardware it drives.
pub struct PioUsbEngine {
    _pio0: PIO0,
    _pio1: PIO1,
    _tx_dma: DMA_CH0,
}

impl PioUsbEngine {
    pub fn new(pio0: PIO0, pio1: PIO1, tx_dma: DMA_CH0) -> Self {
        Self {
            _pio0: pio0,
            _pio1: pio1,
            _tx_dma: tx_dma,
        }
    }
}

fn ffi_config(config: &PioUsbConfig) -> ffi::pio_usb_configuration_t {
    let debug_pin = |pin: Option<u8>| pin.map_or(ffi::PIO_USB_DEBUG_PIN_NONE, |p| p as i8);
    ffi::pio_usb_configuration_t {
        pin_dp: config.pin_dp,
        pio_tx_num: config.pio_tx,
        sm_tx: config.sm_tx,
        tx_ch: config.tx_dma_channel,
        pio_rx_num: config.pio_rx,
        sm_rx: config.sm_rx,
        sm_eop: config.sm_eop,
        alarm_pool: ptr::null_mut::<c_void>(),
        debug_pin_rx: debug_pin(config.debug_pin_rx),
        debug_pin_eop: debug_pin(config.debug_pin_eop),
        skip_alarm_pool: config.skip_alarm_pool,
        pinout: match config.pinout {
            Pinout::DpDm => ffi::PIO_USB_PINOUT_DPDM,
            Pinout::DmDp => ffi::PIO_USB_PINOUT_DMDP,
        },
    }
}

impl UsbDeviceEngine for PioUsbEngine {
    type Config = PioUsbConfig;
    type Device = PioUsbDevice;

    fn init(
        &mut self,
        config: &PioUsbConfig,
        descriptors: &'static DescriptorSet,
    ) -> Result<&'static PioUsbDevice, Error> {
        config.validate()?;
        // Only DMA channel 0 is reserved for the engine.
        if config.tx_dma_channel != 0 {
            return Err(EngineInitError::PeripheralBusy.into());
        }

        let mut hid_reports = [ptr::null(); MAX_HID_FUNCTIONS];
        for (slot, report) in hid_reports.iter_mut().zip(descriptors.hid_reports.iter()) {
            *slot = report.as_ptr();
        }

        let tables = TABLES
            .try_init(EngineTables {
                config: ffi_config(config),
                hid_reports,
                buffers: ffi::usb_descriptor_buffers_t {
                    device: descriptors.device.as_ptr(),
                    config: descriptors.configuration.as_bytes().as_ptr(),
                    hid_report: ptr::null(),
                    string: descriptors.strings.entries().as_ptr(),
                },
            })
            .ok_or(EngineInitError::PeripheralBusy)?;
        tables.buffers.hid_report = tables.hid_reports.as_ptr();

        // SAFETY: both tables are `'static` and never written again.
        let device = unsafe { ffi::pio_usb_device_init(&tables.config, &tables.buffers) };
        let device = NonNull::new(device).ok_or(EngineInitError::InvalidDescriptor)?;

        // SAFETY: the engine's device instance is statically allocated.
        Ok(unsafe { &*(device.as_ptr() as *const PioUsbDevice) })
    }

    fn service(&mut self, _device: &PioUsbDevice) {
        // SAFETY: only called from the core that ran `init`.
        unsafe { ffi::pio_usb_device_task() }
    }
}
