//! Software USB device engine interface.
//!
//! The engine (PIO signal generation, USB protocol state machine,
//! endpoint arbitration) is an external collaborator. The firmware only
//! needs four entry points from it:
//!
//! | Entry point     | Called by               | Notes                        |
//! |-----------------|-------------------------|------------------------------|
//! | `init`          | device service task     | once, before anything else   |
//! | `service`       | device service task     | continuously, no delay       |
//! | `endpoint`      | report injection task   | every tick, may be `None`    |
//! | `submit_report` | report injection task   | best effort, no ack          |
//!
//! The engine is assumed to implement USB 1.1 full-speed device
//! semantics correctly.

use crate::config;
use crate::descriptor::DescriptorSet;
use crate::error::Error;

/// Owner side of the engine, held exclusively by the device service task.
pub trait UsbDeviceEngine {
    /// Peripheral configuration (pins, PIO blocks, DMA).
    type Config;
    /// Running device instance shared with the other core.
    type Device: UsbDevice + Sync + 'static;

    /// Start the engine with `descriptors`. On error no device exists.
    fn init(
        &mut self,
        config: &Self::Config,
        descriptors: &'static DescriptorSet,
    ) -> Result<&'static Self::Device, Error>;

    /// Let the engine react to bus activity. Must be called continuously.
    fn service(&mut self, device: &Self::Device);
}

/// Reader side of a running device.
pub trait UsbDevice {
    type Endpoint: InEndpoint + ?Sized;

    /// Endpoint with logical index `index`, if the engine has it ready.
    fn endpoint(&self, index: u8) -> Option<&Self::Endpoint>;
}

/// Device-to-host endpoint buffer.
pub trait InEndpoint {
    /// Queue `report` for the next IN transaction. Unread data may be
    /// overwritten or dropped.
    fn submit_report(&self, report: &[u8]);
}

/// Pin assignment of the D+/D- pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pinout {
    /// D- is D+ + 1.
    DpDm,
    /// D- is D+ - 1.
    DmDp,
}

/// PIO USB peripheral configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PioUsbConfig {
    /// GPIO carrying D+.
    pub pin_dp: u8,
    /// PIO block and state machine driving the transmitter.
    pub pio_tx: u8,
    pub sm_tx: u8,
    /// DMA channel feeding the transmitter.
    pub tx_dma_channel: u8,
    /// PIO block and state machines for receive and end-of-packet.
    pub pio_rx: u8,
    pub sm_rx: u8,
    pub sm_eop: u8,
    /// Debug GPIOs toggled by the engine, `None` for unused.
    pub debug_pin_rx: Option<u8>,
    pub debug_pin_eop: Option<u8>,
    /// Don't let the engine claim a hardware alarm for its frame timer.
    pub skip_alarm_pool: bool,
    pub pinout: Pinout,
}

impl Default for PioUsbConfig {
    /// The engine's stock assignment: TX on PIO0/SM0 with DMA 0, RX on
    /// PIO1/SM0 and EOP on PIO1/SM1, D+ on GP0.
    fn default() -> Self {
        Self {
            pin_dp: config::USB_DP_PIN,
            pio_tx: 0,
            sm_tx: 0,
            tx_dma_channel: 0,
            pio_rx: 1,
            sm_rx: 0,
            sm_eop: 1,
            debug_pin_rx: None,
            debug_pin_eop: None,
            skip_alarm_pool: false,
            pinout: Pinout::DpDm,
        }
    }
}

impl PioUsbConfig {
    /// GPIO carrying D-.
    pub fn pin_dm(&self) -> u8 {
        match self.pinout {
            Pinout::DpDm => self.pin_dp.wrapping_add(1),
            Pinout::DmDp => self.pin_dp.wrapping_sub(1),
        }
    }

    /// Reject assignments the engine cannot run with: both lines must be
    /// real GPIOs, PIO indices 0 or 1, state machines 0..4, and RX/EOP
    /// must not share a state machine.
    pub fn validate(&self) -> Result<(), Error> {
        use crate::error::EngineInitError::InvalidConfig;

        const GPIO_COUNT: u8 = 30;
        let dm = self.pin_dm();
        let ok = self.pin_dp < GPIO_COUNT
            && dm < GPIO_COUNT
            && self.pio_tx < 2
            && self.pio_rx < 2
            && self.sm_tx < 4
            && self.sm_rx < 4
            && self.sm_eop < 4
            && self.tx_dma_channel < 12
            && self.sm_rx != self.sm_eop
            && !(self.pio_tx == self.pio_rx && (self.sm_tx == self.sm_rx || self.sm_tx == self.sm_eop));
        if ok {
            Ok(())
        } else {
            Err(InvalidConfig.into())
        }
    }
}
