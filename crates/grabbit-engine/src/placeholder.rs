use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use sha2::{Digest, Sha256};

use crate::{
    GenerationError, ImageBuffer, ImageProvider, ProviderRequest, ProviderResponse, ResponsePart,
};

const PROVIDER: &str = "placeholder";

/// Offline provider: renders a flat colour PNG derived from the prompt, so
/// the same request always yields the same bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderProvider;

impl ImageProvider for PlaceholderProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, GenerationError> {
        let (width, height) = dims_for(&request.aspect_ratio, request.image_size.as_deref());
        let digest = prompt_digest(&request.model, &request.prompt);
        let mut canvas = RgbImage::new(width, height);
        for pixel in canvas.pixels_mut() {
            *pixel = Rgb([digest[0], digest[1], digest[2]]);
        }

        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(canvas)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|err| GenerationError::Encode {
                provider: PROVIDER.to_string(),
                message: err.to_string(),
            })?;

        Ok(ProviderResponse {
            parts: vec![
                ResponsePart::Text(format!(
                    "placeholder {} {width}x{height}",
                    hex::encode(&digest[..4])
                )),
                ResponsePart::Image(ImageBuffer {
                    bytes,
                    mime_type: Some("image/png".to_string()),
                }),
            ],
            warnings: Vec::new(),
        })
    }
}

fn prompt_digest(model: &str, prompt: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    hasher.update([0u8]);
    hasher.update(prompt.as_bytes());
    hasher.finalize().into()
}

/// Long edge scales with the requested size tier; the short edge follows
/// the `W:H` ratio. Unparseable ratios render square.
fn dims_for(aspect_ratio: &str, image_size: Option<&str>) -> (u32, u32) {
    let long_edge: u32 = match image_size.map(str::to_ascii_uppercase).as_deref() {
        Some("2K") => 128,
        Some("4K") => 256,
        _ => 64,
    };
    let Some((w, h)) = parse_ratio(aspect_ratio) else {
        return (long_edge, long_edge);
    };
    if w >= h {
        (long_edge, scale(long_edge, h, w))
    } else {
        (scale(long_edge, w, h), long_edge)
    }
}

/// `edge * num / den` for `num <= den`, at least one pixel.
fn scale(edge: u32, num: u32, den: u32) -> u32 {
    let scaled = u64::from(edge) * u64::from(num) / u64::from(den);
    u32::try_from(scaled).unwrap_or(edge).max(1)
}

fn parse_ratio(value: &str) -> Option<(u32, u32)> {
    let (left, right) = value.trim().split_once(':')?;
    let w: u32 = left.trim().parse().ok()?;
    let h: u32 = right.trim().parse().ok()?;
    if w == 0 || h == 0 {
        return None;
    }
    Some((w, h))
}

#[cfg(test)]
mod tests {
    use super::{dims_for, PlaceholderProvider};
    use crate::{ImageProvider, Modality, ProviderRequest, ResponsePart};

    fn request(prompt: &str) -> ProviderRequest {
        ProviderRequest {
            model: "placeholder-image-1".to_string(),
            prompt: prompt.to_string(),
            references: Vec::new(),
            response_modalities: vec![Modality::Image],
            aspect_ratio: "3:4".to_string(),
            image_size: None,
            tools: Vec::new(),
        }
    }

    fn image_bytes(prompt: &str) -> anyhow::Result<Vec<u8>> {
        let response = PlaceholderProvider.generate(&request(prompt))?;
        response
            .parts
            .into_iter()
            .find_map(|part| match part {
                ResponsePart::Image(image) => Some(image.bytes),
                ResponsePart::Text(_) => None,
            })
            .ok_or_else(|| anyhow::anyhow!("no image part"))
    }

    #[test]
    fn dims_follow_ratio_and_size_tier() {
        assert_eq!(dims_for("3:4", None), (48, 64));
        assert_eq!(dims_for("16:9", Some("2k")), (128, 72));
        assert_eq!(dims_for("garbage", None), (64, 64));
    }

    #[test]
    fn huge_ratio_terms_do_not_overflow() {
        assert_eq!(dims_for("4000000000:3999999999", Some("4K")), (256, 255));
        assert_eq!(dims_for("1:4294967295", None), (1, 64));
    }

    #[test]
    fn renders_decodable_png_deterministically() -> anyhow::Result<()> {
        let first = image_bytes("labubu mini")?;
        let second = image_bytes("labubu mini")?;
        assert_eq!(first, second);
        assert_ne!(first, image_bytes("labubu mega")?);

        let decoded = image::load_from_memory(&first)?;
        assert_eq!((decoded.width(), decoded.height()), (48, 64));
        Ok(())
    }
}
