use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SaveScanRequest {
    /// Raw decoded text from the device-side code scanner.
    pub content: String,
}
