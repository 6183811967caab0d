fn main() {
    // Host builds (tests) have no ESP-IDF toolchain; only emit the
    // esp-idf link/env glue when building for the device. Features are
    // not cfg flags inside build scripts, so check the env var cargo
    // sets when `espidf` is active.
    if std::env::var_os("CARGO_FEATURE_ESPIDF").is_some() {
        embuild::espidf::sysenv::output();
    }
}
