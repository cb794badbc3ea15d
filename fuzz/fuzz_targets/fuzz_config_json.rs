#![no_main]

use libfuzzer_sys::fuzz_target;
use rfm69_transport::TransportConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(json) = std::str::from_utf8(data) {
        if let Ok(config) = TransportConfig::from_json_str(json) {
            // Anything accepted must also pass validation on its own
            assert!(config.validate().is_ok());
        }
    }
});
