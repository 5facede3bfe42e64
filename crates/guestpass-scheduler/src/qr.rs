//! QR token encoder — payload string to PNG bytes.

use std::io::Cursor;

use guestpass_core::error::{GuestPassError, Result};
use guestpass_core::traits::TokenEncoder;
use image::{ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};

/// Renders payloads as black-on-white QR codes with a quiet zone.
pub struct QrEncoder {
    /// Pixel size of one QR module.
    module_px: u32,
    ec_level: EcLevel,
}

impl QrEncoder {
    pub fn new(module_px: u32) -> Self {
        Self {
            module_px: module_px.max(1),
            ec_level: EcLevel::M,
        }
    }
}

impl Default for QrEncoder {
    fn default() -> Self {
        Self::new(8)
    }
}

impl TokenEncoder for QrEncoder {
    fn encode(&self, payload: &str) -> Result<Vec<u8>> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), self.ec_level)
            .map_err(|e| GuestPassError::Encode(format!("QR encode: {e}")))?;
        let img = code
            .render::<Luma<u8>>()
            .module_dimensions(self.module_px, self.module_px)
            .quiet_zone(true)
            .build();

        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| GuestPassError::Encode(format!("PNG write: {e}")))?;
        Ok(buf.into_inner())
    }
}
