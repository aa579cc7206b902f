//! # Renderer
//!
//! Optional visual output for the drive loop.
//!
//! Responsibilities:
//! - Convert decoded camera frames to RGB images
//! - Draw steering/throttle bars and debug text
//! - Save still frames
//! - Record an animated GIF stream at the configured frame rate

mod error;
mod overlay;

pub use error::{RenderError, Result};
pub use overlay::{bar_origin, draw_control, draw_debug, throttle_width};

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use config_loader::VisualizationSettings;
use contracts::{Frame, FrameData};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Rgb, RgbImage};
use tracing::{debug, info, warn};

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub output_dir: PathBuf,
    pub save_video: bool,
    pub fps: u32,
    pub font_path: Option<PathBuf>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("results"),
            save_video: false,
            fps: 30,
            font_path: None,
        }
    }
}

impl From<&VisualizationSettings> for RendererConfig {
    fn from(settings: &VisualizationSettings) -> Self {
        Self {
            output_dir: settings.output_dir.clone(),
            save_video: settings.save_video,
            fps: settings.fps,
            font_path: settings.font_path.clone(),
        }
    }
}

/// NeuQuant speed, 1 (best) to 30 (fastest)
const GIF_SPEED: i32 = 10;

struct VideoStream {
    encoder: GifEncoder<BufWriter<File>>,
    path: PathBuf,
}

pub struct Renderer {
    config: RendererConfig,
    font: Option<FontVec>,
    video: Option<VideoStream>,
    frame_count: u64,
}

impl Renderer {
    /// Create the renderer and its output directory.
    ///
    /// An unreadable font is logged and text overlays are skipped.
    pub fn new(config: RendererConfig) -> Result<Self> {
        fs::create_dir_all(&config.output_dir)?;
        let font = config.font_path.as_deref().and_then(load_font);
        Ok(Self {
            config,
            font,
            video: None,
            frame_count: 0,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Frames appended to the video stream so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn is_recording(&self) -> bool {
        self.video.is_some()
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Open the video stream. No-op unless `save_video` is set.
    pub fn setup_video_writer(&mut self, width: u32, height: u32, filename: &str) -> Result<()> {
        if !self.config.save_video {
            return Ok(());
        }
        self.cleanup();

        let path = self.config.output_dir.join(filename);
        let file = File::create(&path)?;
        let mut encoder = GifEncoder::new_with_speed(BufWriter::new(file), GIF_SPEED);
        encoder.set_repeat(Repeat::Infinite)?;

        info!(path = %path.display(), width, height, fps = self.config.fps, "video stream opened");
        self.video = Some(VideoStream { encoder, path });
        Ok(())
    }

    /// Convert a camera frame to RGB and draw the overlays.
    ///
    /// # Arguments
    /// * `frame` - Decoded camera frame, simulator (BGR) channel order
    /// * `control` - `(steer, throttle)` for the bars
    /// * `debug` - `key: value` lines, drawn only when a font is loaded
    pub fn render_frame(
        &mut self,
        frame: &Frame,
        control: Option<(f64, f64)>,
        debug: Option<&[(String, String)]>,
    ) -> Result<RgbImage> {
        let mut image = to_rgb_image(&frame.data)?;

        if let Some((steer, throttle)) = control {
            draw_control(&mut image, steer, throttle);
        }
        if let (Some(lines), Some(font)) = (debug, &self.font) {
            draw_debug(&mut image, font, lines);
        }

        if let Some(video) = self.video.as_mut() {
            let delay = Delay::from_numer_denom_ms(1000, self.config.fps.max(1));
            let rgba = image::DynamicImage::ImageRgb8(image.clone()).into_rgba8();
            video
                .encoder
                .encode_frame(image::Frame::from_parts(rgba, 0, 0, delay))?;
            self.frame_count += 1;
        }

        Ok(image)
    }

    /// Write a still image; the format follows the extension.
    ///
    /// Without a filename the name is `frame_{frame_count:06}.jpg`.
    pub fn save_frame(&self, image: &RgbImage, filename: Option<&str>) -> Result<PathBuf> {
        let path = match filename {
            Some(name) => self.config.output_dir.join(name),
            None => self
                .config
                .output_dir
                .join(format!("frame_{:06}.jpg", self.frame_count)),
        };
        image.save(&path)?;
        debug!(path = %path.display(), "frame saved");
        Ok(path)
    }

    /// Finalize and release the video stream. Idempotent.
    pub fn cleanup(&mut self) {
        if let Some(video) = self.video.take() {
            // the GIF trailer is written when the encoder drops
            drop(video.encoder);
            info!(path = %video.path.display(), frames = self.frame_count, "video stream closed");
        }
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn load_font(path: &Path) -> Option<FontVec> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "font not readable, debug text disabled");
            return None;
        }
    };
    match FontVec::try_from_vec(bytes) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "invalid font, debug text disabled");
            None
        }
    }
}

/// Camera frames become RGB images; single-channel frames are shown as gray.
pub fn to_rgb_image(data: &FrameData) -> Result<RgbImage> {
    match data {
        FrameData::Rgb(bgr) => {
            let (height, width, _) = bgr.dim();
            Ok(RgbImage::from_fn(width as u32, height as u32, |x, y| {
                let (x, y) = (x as usize, y as usize);
                Rgb([bgr[[y, x, 2]], bgr[[y, x, 1]], bgr[[y, x, 0]]])
            }))
        }
        FrameData::Semantic(gray) | FrameData::Depth(gray) => {
            let (height, width) = gray.dim();
            Ok(RgbImage::from_fn(width as u32, height as u32, |x, y| {
                let v = gray[[y as usize, x as usize]];
                Rgb([v, v, v])
            }))
        }
        FrameData::Points(_) => Err(RenderError::UnsupportedFrame("lidar")),
    }
}
