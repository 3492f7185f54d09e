// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! QR login token rendering.
//!
//! Telegram hands over a `tg://login?token=...` payload instead of a
//! finished image, so the relay renders it server-side into an SVG data
//! URL the dashboard can drop into an `<img>` tag.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use qrcode::render::svg;
use qrcode::QrCode;

use courier_core::CourierError;

/// Render a login payload into a `data:image/svg+xml;base64,...` URL.
pub fn render_data_url(payload: &str) -> Result<String, CourierError> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| CourierError::Provider {
        message: format!("failed to encode QR payload: {e}"),
        source: None,
    })?;
    let image = code
        .render::<svg::Color<'_>>()
        .min_dimensions(256, 256)
        .build();
    Ok(format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(image)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_svg_data_url() {
        let url = render_data_url("tg://login?token=abc123").unwrap();
        assert!(url.starts_with("data:image/svg+xml;base64,"));

        let encoded = url.strip_prefix("data:image/svg+xml;base64,").unwrap();
        let svg_bytes = STANDARD.decode(encoded).unwrap();
        let svg = String::from_utf8(svg_bytes).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn distinct_payloads_render_distinct_images() {
        let a = render_data_url("tg://login?token=aaa").unwrap();
        let b = render_data_url("tg://login?token=bbb").unwrap();
        assert_ne!(a, b);
    }
}
