//! Build script for blockprof.
//!
//! Emits short hints about the feature configuration being compiled in.

use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_PARKING_LOT");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_LOG");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_DIAGNOSTICS");

    let parking_lot = env::var("CARGO_FEATURE_PARKING_LOT").is_ok();
    let diagnostics = env::var("CARGO_FEATURE_DIAGNOSTICS").is_ok();
    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    if parking_lot {
        emit("using parking_lot mutexes for cold-path state");
    }

    if profile == "release" && !diagnostics {
        emit("release build without 'diagnostics': pool warnings will not reach stderr");
        emit("  enable with: blockprof = { version = \"0.1\", features = [\"diagnostics\"] }");
    }
}

fn emit(msg: &str) {
    println!("cargo:warning=[blockprof] {}", msg);
}
