//! Export device configuration from `.env` to the compiler.
//!
//! Values already present in the environment win over `.env`. Missing
//! values fall back to defaults so a fresh checkout still builds.

const SETTINGS: [(&str, &str); 5] = [
    ("API_HOST", "http://192.168.1.10:3000"),
    ("COIN_SYMBOLS", "BTCUSDT,ETHUSDT,SOLUSDT"),
    ("WIFI_SSID", ""),
    ("WIFI_PASSWORD", ""),
    ("UTC_OFFSET_SECS", "0"),
];

fn main() {
    // Walks up from the crate directory, so a workspace-level .env works too
    match dotenvy::dotenv() {
        Ok(path) => println!("cargo:rerun-if-changed={}", path.display()),
        Err(e) => println!("cargo:warning=No .env loaded ({e}), using defaults"),
    }

    for (key, default) in SETTINGS {
        let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
        println!("cargo:rustc-env={key}={value}");
        println!("cargo:rerun-if-env-changed={key}");
    }

    println!("cargo:rustc-link-arg-bins=-Tlinkall.x");
}
