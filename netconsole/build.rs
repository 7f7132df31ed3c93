// Build script to stamp the build date into the console greeting

use std::env;

use chrono::{DateTime, Utc};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    // Reproducible builds pin the clock through SOURCE_DATE_EPOCH
    let stamp = env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now);

    // Same shape as a C compiler's __DATE__: "Mmm dd yyyy"
    println!(
        "cargo:rustc-env=NETCONSOLE_BUILD_DATE={}",
        stamp.format("%b %e %Y")
    );
}
