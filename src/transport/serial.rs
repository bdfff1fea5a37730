//! Serial port transport.

use super::BoxedReader;
use crate::error::Result;

/// Open a serial port in async mode.
#[cfg(feature = "serial")]
pub fn open_serial(path: &str, baud_rate: u32) -> Result<BoxedReader> {
    use tokio_serial::SerialPortBuilderExt;

    tracing::info!(path, baud_rate, "Opening serial port");

    let port = tokio_serial::new(path, baud_rate)
        .open_native_async()
        .map_err(std::io::Error::other)?;
    Ok(Box::new(port))
}

/// Serial support is compiled out; always fails.
#[cfg(not(feature = "serial"))]
pub fn open_serial(path: &str, baud_rate: u32) -> Result<BoxedReader> {
    Err(crate::error::SensorwireError::Config(format!(
        "cannot open {} at {} baud: built without the `serial` feature",
        path, baud_rate
    )))
}

#[cfg(all(test, not(feature = "serial")))]
mod tests {
    use super::*;

    #[test]
    fn test_serial_disabled() {
        let err = open_serial("/dev/ttyUSB0", 115200).err().unwrap();
        assert!(err.to_string().contains("serial"));
    }
}
