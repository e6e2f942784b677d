//! Fuzz harness for configuration files (caseport.yaml)
//!
//! Target: `caseport_config::CaseportConfig`

#![no_main]

use caseport_config::CaseportConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(config) = serde_yaml::from_str::<CaseportConfig>(input) {
        let options = config.export_options();
        assert!(options.attachment_workers >= 1);
        let _ = config.logging.env_filter();
    }
});
