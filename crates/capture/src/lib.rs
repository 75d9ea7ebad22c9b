pub mod decoder;
#[cfg(feature = "v4l")]
pub mod device;
pub mod error;
pub mod frame;
pub mod images;
pub mod source;
#[cfg(feature = "opencv")]
pub mod video;

pub use decoder::{FrameDecoder, MjpegDecoder, YuyvDecoder};
pub use error::CaptureError;
pub use frame::Frame;
pub use images::ImageSequence;
pub use source::{FrameSource, InputSource, open_source};
