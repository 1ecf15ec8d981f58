//! Preview rendering: decode, rescale, encode.
//!
//! Images are decoded from bytes with the `image` crate; videos are opened
//! with ffmpeg, seeking to a fixed offset and capturing one frame. Both paths
//! end in the same rescale-and-JPEG-encode step producing an embeddable
//! `data:` URI.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ffmpeg_next as ffmpeg;
use image::{DynamicImage, ImageBuffer, ImageEncoder as _, Rgb};
use std::path::Path;

use crate::config::ThumbnailConfig;
use crate::error::{Result, ThumbnailError};

/// Packet-processing cap so broken containers cannot spin the decoder forever.
const MAX_VIDEO_PACKETS: usize = 500;

/// Decode an image from memory and render its preview.
pub fn render_image_preview(data: &[u8], config: &ThumbnailConfig) -> Result<String> {
    let img = image::load_from_memory(data)
        .map_err(|e| ThumbnailError::Decode(format!("Failed to load image: {}", e)))?;
    encode_preview(&img, config)
}

/// Capture a frame from a video file and render its preview.
///
/// Seeks to the configured offset first; when the seek fails (streams without
/// an index, very short clips) decoding falls back to the first decodable
/// frame.
pub fn render_video_preview(path: &Path, config: &ThumbnailConfig) -> Result<String> {
    let frame = capture_video_frame(path, config)?;
    encode_preview(&frame, config)
}

/// Rescale to the fixed target width (aspect preserved, never upscaled) and
/// encode as JPEG wrapped in a `data:` URI.
pub fn encode_preview(img: &DynamicImage, config: &ThumbnailConfig) -> Result<String> {
    let scaled = if img.width() > config.target_width {
        let height = ((config.target_width as u64 * img.height() as u64)
            / img.width().max(1) as u64)
            .max(1) as u32;
        img.resize(
            config.target_width,
            height,
            image::imageops::FilterType::Triangle,
        )
    } else {
        img.clone()
    };

    let rgb = scaled.to_rgb8();
    let mut buf = Vec::new();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, config.jpeg_quality);
    encoder
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| ThumbnailError::Encode(format!("JPEG encode failed: {}", e)))?;

    Ok(format!("data:image/jpeg;base64,{}", BASE64.encode(&buf)))
}

fn capture_video_frame(path: &Path, config: &ThumbnailConfig) -> Result<DynamicImage> {
    ffmpeg::init().map_err(|e| ThumbnailError::Decode(format!("ffmpeg init failed: {}", e)))?;

    let path = path.to_path_buf();
    let mut input_ctx = ffmpeg::format::input(&path)
        .map_err(|e| ThumbnailError::Decode(format!("Failed to open video: {}", e)))?;

    let video_stream_index = input_ctx
        .streams()
        .best(ffmpeg::media::Type::Video)
        .ok_or_else(|| ThumbnailError::Decode("No video stream found".to_string()))?
        .index();

    let codec_params = input_ctx
        .stream(video_stream_index)
        .map(|s| s.parameters())
        .ok_or_else(|| ThumbnailError::Decode("Video stream vanished".to_string()))?;

    // Seek to the fixed capture offset (AV_TIME_BASE units). Failure is not
    // fatal; we fall back to the leading frames.
    let seek_position =
        (config.video_capture_offset_secs * f64::from(ffmpeg::ffi::AV_TIME_BASE)) as i64;
    let seek_succeeded = input_ctx.seek(seek_position, ..).is_ok();

    let codec = ffmpeg::codec::context::Context::from_parameters(codec_params)
        .map_err(|e| ThumbnailError::Decode(format!("Failed to create codec context: {}", e)))?;
    let mut decoder = codec
        .decoder()
        .video()
        .map_err(|e| ThumbnailError::Decode(format!("Failed to create video decoder: {}", e)))?;

    let mut scaler = ffmpeg::software::scaling::context::Context::get(
        decoder.format(),
        decoder.width(),
        decoder.height(),
        ffmpeg::format::Pixel::RGB24,
        decoder.width(),
        decoder.height(),
        ffmpeg::software::scaling::flag::Flags::BILINEAR,
    )
    .map_err(|e| ThumbnailError::Decode(format!("Failed to create scaler: {}", e)))?;

    let mut decoded = ffmpeg::util::frame::video::Video::empty();
    let mut rgb_frame = ffmpeg::util::frame::video::Video::empty();
    let mut frame_count = 0usize;
    let mut packet_count = 0usize;

    for (stream, packet) in input_ctx.packets() {
        if stream.index() != video_stream_index {
            continue;
        }
        packet_count += 1;
        if packet_count > MAX_VIDEO_PACKETS {
            break;
        }

        if decoder.send_packet(&packet).is_err() {
            continue;
        }

        while decoder.receive_frame(&mut decoded).is_ok() {
            frame_count += 1;

            // When the seek failed, skip the leading frames; they are often
            // black on keyframe-sparse encodes.
            if !seek_succeeded && frame_count < 10 {
                continue;
            }

            scaler
                .run(&decoded, &mut rgb_frame)
                .map_err(|e| ThumbnailError::Decode(format!("Failed to scale frame: {}", e)))?;

            return frame_to_image(&rgb_frame);
        }
    }

    Err(ThumbnailError::Decode(format!(
        "No decodable frame in {} packets",
        packet_count
    )))
}

fn frame_to_image(frame: &ffmpeg::util::frame::video::Video) -> Result<DynamicImage> {
    let width = frame.width();
    let height = frame.height();
    let stride = frame.stride(0);
    let data = frame.data(0);

    // Rows may carry alignment padding; strip it when present.
    let row_bytes = width as usize * 3;
    let pixels = if stride == row_bytes {
        data.to_vec()
    } else {
        let mut clean = Vec::with_capacity(row_bytes * height as usize);
        for y in 0..height as usize {
            let start = y * stride;
            clean.extend_from_slice(&data[start..start + row_bytes]);
        }
        clean
    };

    let buffer = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, pixels).ok_or_else(|| {
        ThumbnailError::Decode(format!("Invalid frame buffer {}x{}", width, height))
    })?;

    Ok(DynamicImage::ImageRgb8(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_png() -> Vec<u8> {
        // 2x1 white PNG encoded in-process so the fixture can't rot.
        let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(2, 1, Rgb([255u8, 255, 255])));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_image_preview_is_data_uri() {
        let preview = render_image_preview(&tiny_png(), &ThumbnailConfig::default()).unwrap();
        assert!(preview.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_garbage_bytes_fail_decode() {
        let err = render_image_preview(b"not an image", &ThumbnailConfig::default()).unwrap_err();
        assert!(matches!(err, ThumbnailError::Decode(_)));
    }

    #[test]
    fn test_large_image_downscaled_to_target_width() {
        let wide = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(1280, 640, Rgb([10u8, 20, 30])));
        let config = ThumbnailConfig::default();
        let preview = encode_preview(&wide, &config).unwrap();

        let b64 = preview.strip_prefix("data:image/jpeg;base64,").unwrap();
        let jpeg = BASE64.decode(b64).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), config.target_width);
        assert_eq!(decoded.height(), config.target_width / 2);
    }

    #[test]
    fn test_small_image_not_upscaled() {
        let small = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(64, 48, Rgb([0u8, 0, 0])));
        let preview = encode_preview(&small, &ThumbnailConfig::default()).unwrap();

        let b64 = preview.strip_prefix("data:image/jpeg;base64,").unwrap();
        let jpeg = BASE64.decode(b64).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 64);
        assert_eq!(decoded.height(), 48);
    }
}
