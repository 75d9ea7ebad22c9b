use crate::overlay::{OverlayLine, OverlayStyle};
use capture::Frame;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Where annotated frames are presented and quit requests come from.
pub trait DisplaySurface {
    fn show(&mut self, frame: &Frame, lines: &[OverlayLine], style: &OverlayStyle)
    -> anyhow::Result<()>;

    /// Wait up to `timeout` for a key press. `true` means stop.
    fn poll_quit(&mut self, timeout: Duration) -> anyhow::Result<bool>;

    /// Block until the user dismisses the last frame.
    fn wait_for_key(&mut self) -> anyhow::Result<()>;
}

impl<D: DisplaySurface + ?Sized> DisplaySurface for Box<D> {
    fn show(
        &mut self,
        frame: &Frame,
        lines: &[OverlayLine],
        style: &OverlayStyle,
    ) -> anyhow::Result<()> {
        (**self).show(frame, lines, style)
    }

    fn poll_quit(&mut self, timeout: Duration) -> anyhow::Result<bool> {
        (**self).poll_quit(timeout)
    }

    fn wait_for_key(&mut self) -> anyhow::Result<()> {
        (**self).wait_for_key()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayKind {
    Window,
    Headless,
}

impl DisplayKind {
    /// A window needs the `opencv` feature; without it everything is headless.
    pub fn resolve(headless: bool) -> Self {
        if headless || cfg!(not(feature = "opencv")) {
            DisplayKind::Headless
        } else {
            DisplayKind::Window
        }
    }
}

pub fn open_display(
    kind: DisplayKind,
    shutdown: Arc<AtomicBool>,
) -> anyhow::Result<Box<dyn DisplaySurface>> {
    match kind {
        DisplayKind::Headless => Ok(Box::new(LogDisplay::new(shutdown))),
        #[cfg(feature = "opencv")]
        DisplayKind::Window => Ok(Box::new(HighGuiDisplay::new(shutdown)?)),
        #[cfg(not(feature = "opencv"))]
        DisplayKind::Window => anyhow::bail!("Window display requires the 'opencv' feature"),
    }
}

/// Headless surface: logs each overlay, quits on SIGINT/SIGTERM.
pub struct LogDisplay {
    shutdown: Arc<AtomicBool>,
}

impl LogDisplay {
    pub fn new(shutdown: Arc<AtomicBool>) -> Self {
        Self { shutdown }
    }
}

impl DisplaySurface for LogDisplay {
    fn show(
        &mut self,
        frame: &Frame,
        lines: &[OverlayLine],
        _style: &OverlayStyle,
    ) -> anyhow::Result<()> {
        let text = lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join(" | ");
        tracing::info!(frame = frame.index, "{}", text);
        Ok(())
    }

    fn poll_quit(&mut self, _timeout: Duration) -> anyhow::Result<bool> {
        Ok(self.shutdown.load(Ordering::Relaxed))
    }

    fn wait_for_key(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Key wait in whole milliseconds: at least 1, since 0 blocks forever,
/// and saturated for timeouts beyond `i32::MAX` ms.
#[cfg_attr(not(feature = "opencv"), allow(dead_code))]
fn wait_key_delay(timeout: Duration) -> i32 {
    i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX).max(1)
}

#[cfg(feature = "opencv")]
pub use window::{HighGuiDisplay, WINDOW_NAME};

#[cfg(feature = "opencv")]
mod window {
    use super::{DisplaySurface, wait_key_delay};
    use crate::overlay::{OverlayLine, OverlayStyle};
    use capture::Frame;
    use opencv::{
        core::{CV_8UC3, Mat, Point, Scalar},
        highgui, imgproc,
        prelude::*,
    };
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    pub const WINDOW_NAME: &str = "Deep learning image classification";

    const KEY_POLL_MS: i32 = 100;

    pub struct HighGuiDisplay {
        shutdown: Arc<AtomicBool>,
    }

    impl HighGuiDisplay {
        pub fn new(shutdown: Arc<AtomicBool>) -> anyhow::Result<Self> {
            highgui::named_window(WINDOW_NAME, highgui::WINDOW_NORMAL)?;
            Ok(Self { shutdown })
        }
    }

    fn to_bgr_mat(frame: &Frame) -> anyhow::Result<Mat> {
        let mut mat = Mat::new_rows_cols_with_default(
            frame.height as i32,
            frame.width as i32,
            CV_8UC3,
            Scalar::all(0.0),
        )?;
        for (dst, rgb) in mat
            .data_bytes_mut()?
            .chunks_exact_mut(3)
            .zip(frame.pixels.chunks_exact(3))
        {
            dst.copy_from_slice(&[rgb[2], rgb[1], rgb[0]]);
        }
        Ok(mat)
    }

    impl DisplaySurface for HighGuiDisplay {
        fn show(
            &mut self,
            frame: &Frame,
            lines: &[OverlayLine],
            style: &OverlayStyle,
        ) -> anyhow::Result<()> {
            let mut mat = to_bgr_mat(frame)?;
            let [r, g, b] = style.color;
            let color = Scalar::new(b as f64, g as f64, r as f64, 0.0);

            for line in lines {
                imgproc::put_text(
                    &mut mat,
                    &line.text,
                    Point::new(line.x, line.y),
                    imgproc::FONT_HERSHEY_SIMPLEX,
                    style.font_scale,
                    color,
                    style.thickness,
                    imgproc::LINE_8,
                    false,
                )?;
            }

            highgui::imshow(WINDOW_NAME, &mat)?;
            Ok(())
        }

        fn poll_quit(&mut self, timeout: Duration) -> anyhow::Result<bool> {
            let key = highgui::wait_key(wait_key_delay(timeout))?;
            Ok(key >= 0 || self.shutdown.load(Ordering::Relaxed))
        }

        fn wait_for_key(&mut self) -> anyhow::Result<()> {
            while !self.shutdown.load(Ordering::Relaxed) {
                if highgui::wait_key(KEY_POLL_MS)? >= 0 {
                    break;
                }
            }
            Ok(())
        }
    }

    impl Drop for HighGuiDisplay {
        fn drop(&mut self) {
            if let Err(e) = highgui::destroy_window(WINDOW_NAME) {
                tracing::warn!(error = %e, "Failed to close display window");
            }
        }
    }
}
