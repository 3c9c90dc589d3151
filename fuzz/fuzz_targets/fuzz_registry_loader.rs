#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Registry documents arrive from disk and may be arbitrarily mangled;
    // parsing plus validation must reject them without panicking.
    match serde_json::from_str::<padcal_config::RegistryFile>(data) {
        Ok(file) => {
            let _ = file.validate();
        }
        Err(_e) => {
            // parse error is acceptable
        }
    }
});
