//! Inline image transform.

use promptlens_core::error::Result;
use promptlens_core::image::{CompressOptions, ImagePayload, ImageTransform};

/// Transform that keeps images byte-for-byte and renders thumbnails as data
/// URIs of the original payload.
///
/// Real resampling lives behind the `ImageTransform` seam; this adapter keeps
/// the decode(encode(x)) == x property intact for stores and tests that round
/// trip a thumbnail back into request bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineImageTransform;

impl InlineImageTransform {
    pub fn new() -> Self {
        Self
    }
}

impl ImageTransform for InlineImageTransform {
    fn compress(&self, image: &ImagePayload, _options: &CompressOptions) -> Result<ImagePayload> {
        Ok(image.clone())
    }

    fn thumbnail(&self, image: &ImagePayload, _max_dimension: u32) -> Result<String> {
        Ok(image.to_data_uri())
    }
}
