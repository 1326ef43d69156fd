use base64::Engine as _;

/// Base64 characters needed to cover the longest magic number we check (12 bytes).
const SNIFF_PREFIX_LEN: usize = 16;

pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), falling back to image/png",
                &bytes[..bytes.len().min(4)]
            );
            "image/png"
        }
    }
}

/// Sniff the MIME type of base64-encoded image data from its leading bytes.
pub fn detect_base64_image_mime(data: &str) -> &'static str {
    let prefix = data.get(..SNIFF_PREFIX_LEN).unwrap_or(data);
    match base64::engine::general_purpose::STANDARD.decode(prefix) {
        Ok(bytes) => detect_image_mime(&bytes),
        Err(_) => detect_image_mime(&[]),
    }
}

/// Wrap base64 image data into a `data:` URI a browser can display directly.
pub fn image_data_url(data: &str) -> String {
    format!("data:{};base64,{}", detect_base64_image_mime(data), data)
}
