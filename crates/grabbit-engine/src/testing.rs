use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::{
    GenerationError, ImageBuffer, ImageProvider, ProviderRequest, ProviderResponse, ResponsePart,
};

pub(crate) fn image_part(bytes: &[u8]) -> ResponsePart {
    ResponsePart::Image(ImageBuffer {
        bytes: bytes.to_vec(),
        mime_type: Some("image/png".to_string()),
    })
}

/// Replays scripted responses in call order. Once the script runs out,
/// every call succeeds with a tiny valid PNG.
pub(crate) struct ScriptedProvider {
    name: String,
    script: Mutex<VecDeque<Result<ProviderResponse, GenerationError>>>,
    seen: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl ScriptedProvider {
    pub(crate) fn gemini(script: Vec<Result<ProviderResponse, GenerationError>>) -> Self {
        Self {
            name: "gemini".to_string(),
            script: Mutex::new(script.into()),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn seen(&self) -> Arc<Mutex<Vec<ProviderRequest>>> {
        Arc::clone(&self.seen)
    }
}

impl ImageProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, GenerationError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.clone());
        }
        let next = self.script.lock().ok().and_then(|mut script| script.pop_front());
        match next {
            Some(scripted) => scripted,
            None => Ok(ProviderResponse {
                parts: vec![image_part(&tiny_png())],
                warnings: Vec::new(),
            }),
        }
    }
}

pub(crate) fn tiny_png() -> Vec<u8> {
    let mut bytes = Vec::new();
    let canvas = image::RgbImage::from_pixel(2, 2, image::Rgb([200, 120, 40]));
    let _ = image::DynamicImage::ImageRgb8(canvas).write_to(
        &mut std::io::Cursor::new(&mut bytes),
        image::ImageFormat::Png,
    );
    bytes
}

/// The `type` column of an events file, in write order.
pub(crate) fn event_types(path: &Path) -> anyhow::Result<Vec<String>> {
    Ok(fs::read_to_string(path)?
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter_map(|row| row.get("type").and_then(Value::as_str).map(str::to_string))
        .collect())
}
