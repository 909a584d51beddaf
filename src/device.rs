//! Opening the configured device

use std::sync::Arc;

use hidapi::HidApi;
use speededitor_transport::{BoxedTransport, HidTransport, TransportError};
use tracing::debug;

use crate::config::DeviceConfig;

/// Open the device named by `config`
///
/// An explicit path wins; otherwise the first device with the configured
/// VID/PID is used.
pub fn open_transport(config: &DeviceConfig) -> Result<BoxedTransport, TransportError> {
    let api = HidApi::new()?;
    let transport = match &config.path {
        Some(path) => {
            debug!("Opening {}", path);
            HidTransport::open_path(&api, path)?
        }
        None => {
            debug!("Looking for {:04x}:{:04x}", config.vid, config.pid);
            HidTransport::open_matching(&api, config.vid, config.pid)?
        }
    };
    Ok(Arc::new(transport))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires a connected Speed Editor
    fn test_open_default_device() {
        let transport = open_transport(&DeviceConfig::default()).unwrap();
        assert_eq!(transport.device_info().vid, 0x1edb);
    }
}
