//! Build script - copies the linker script into the output directory
//! and, for firmware builds, links the prebuilt Pico-PIO-USB library.

use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to OUT_DIR
    fs::copy("memory.x", out_dir.join("memory.x")).unwrap();

    // Tell cargo to look for linker scripts in OUT_DIR
    println!("cargo:rustc-link-search={}", out_dir.display());

    // The software USB engine is C code built against the pico-sdk; only
    // the firmware binary links it.
    if env::var_os("CARGO_FEATURE_EMBEDDED").is_some() {
        if let Some(dir) = env::var_os("PIO_USB_LIB_DIR") {
            println!("cargo:rustc-link-search=native={}", PathBuf::from(dir).display());
        }
        println!("cargo:rustc-link-lib=static=pio_usb");
    }

    // Rebuild if the linker script changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=PIO_USB_LIB_DIR");
}
