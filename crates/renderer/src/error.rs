//! Renderer 错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("frame kind '{0}' cannot be rendered as an image")]
    UnsupportedFrame(&'static str),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
