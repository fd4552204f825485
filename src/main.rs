//! RP2040 firmware entry point.
//!
//! Core 0 runs the device service task on its own executor. Core 1 runs
//! report injection and the heartbeat LED. Each task's pinning and
//! pacing comes from [`pico_pio_hid::schedule`].

#![no_std]
#![no_main]

mod pio_usb;

use defmt::{info, panic};
use embassy_executor::{Executor, Spawner};
use embassy_futures::yield_now;
use embassy_rp::clocks::{ClockConfig, PllConfig};
use embassy_rp::gpio::{Level, Output};
use embassy_rp::multicore::{spawn_core1, Stack};
use embassy_time::{Duration, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use pico_pio_hid::config;
use pico_pio_hid::descriptor::{endpoint_index_for, DescriptorSet};
use pico_pio_hid::engine::PioUsbConfig;
use pico_pio_hid::heartbeat::Heartbeat;
use pico_pio_hid::hid::KEYBOARD_INTERFACE;
use pico_pio_hid::injector::ReportInjector;
use pico_pio_hid::schedule::{self, Core, CORE1_STACK_BYTES};
use pico_pio_hid::service::{DeviceService, HandleSlot};

use crate::pio_usb::{PioUsbDevice, PioUsbEngine};

static CORE1_STACK: StaticCell<Stack<CORE1_STACK_BYTES>> = StaticCell::new();
static EXECUTOR0: StaticCell<Executor> = StaticCell::new();
static EXECUTOR1: StaticCell<Executor> = StaticCell::new();
static DESCRIPTORS: StaticCell<DescriptorSet> = StaticCell::new();

/// Running device, published once by the device service task.
static DEVICE: HandleSlot<PioUsbDevice> = HandleSlot::new();

/// 12 MHz crystal into the system PLL at the USB-friendly 120 MHz.
fn clock_config() -> embassy_rp::config::Config {
    let mut clocks = ClockConfig::crystal(config::XOSC_HZ);
    if let Some(xosc) = clocks.xosc.as_mut() {
        xosc.sys_pll = Some(PllConfig {
            refdiv: config::SYS_PLL_REFDIV,
            fbdiv: config::SYS_PLL_FBDIV,
            post_div1: config::SYS_PLL_POST_DIV1,
            post_div2: config::SYS_PLL_POST_DIV2,
        });
    }
    embassy_rp::config::Config::new(clocks)
}

#[cortex_m_rt::entry]
fn main() -> ! {
    let p = embassy_rp::init(clock_config());
    info!("hello pico-pio-hid ({} Hz)", config::SYS_CLOCK_HZ);

    if let Err(e) = schedule::validate_plan(&schedule::TASK_PLAN) {
        panic!("task plan rejected: {}", e);
    }
    for task in schedule::TASK_PLAN.iter() {
        info!(
            "task {} on {} every {} ms, {} byte stack",
            task.name,
            task.core,
            task.sleep_ms(),
            task.stack_bytes
        );
    }

    let led = Output::new(p.PIN_25, Level::Low);
    let engine = PioUsbEngine::new(p.PIO0, p.PIO1, p.DMA_CH0);

    spawn_core1(p.CORE1, CORE1_STACK.init(Stack::new()), move || {
        let executor1 = EXECUTOR1.init(Executor::new());
        executor1.run(|spawner| spawn_core1_tasks(spawner, led))
    });

    let executor0 = EXECUTOR0.init(Executor::new());
    executor0.run(|spawner| {
        debug_assert_eq!(schedule::DEVICE_SERVICE.core, Core::Core0);
        spawner.must_spawn(device_service_task(engine));
    })
}

fn spawn_core1_tasks(spawner: Spawner, led: Output<'static>) {
    spawner.must_spawn(report_injection_task());
    spawner.must_spawn(heartbeat_task(led));
}

#[embassy_executor::task]
async fn device_service_task(engine: PioUsbEngine) {
    let descriptors = match DescriptorSet::composite() {
        Ok(set) => DESCRIPTORS.init(set),
        Err(e) => panic!("descriptor build failed: {}", e),
    };
    info!(
        "configuration descriptor: {} bytes, {} interfaces",
        descriptors.configuration.total_length(),
        descriptors.configuration.num_interfaces()
    );

    let mut service = DeviceService::new(engine, &DEVICE);
    if let Err(e) = service.start(&PioUsbConfig::default(), descriptors) {
        panic!("USB device engine failed to start: {}", e);
    }
    info!("USB device task started");

    loop {
        service.service_once();
        yield_now().await;
    }
}

#[embassy_executor::task]
async fn report_injection_task() {
    let mut injector = ReportInjector::new(
        endpoint_index_for(KEYBOARD_INTERFACE),
        config::DEMO_KEYCODE,
    );
    let period = Duration::from_millis(schedule::REPORT_INJECTION.sleep_ms());

    loop {
        injector.tick(&DEVICE);
        Timer::after(period).await;
    }
}

#[embassy_executor::task]
async fn heartbeat_task(led: Output<'static>) {
    let mut heartbeat = Heartbeat::new(led);
    let period = Duration::from_millis(schedule::HEARTBEAT.sleep_ms());

    loop {
        heartbeat.toggle();
        Timer::after(period).await;
    }
}
