//! Text lines drawn over each frame and where they go.

/// Placement and look of the overlay text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub origin_x: i32,
    /// Baseline of the first line.
    pub first_baseline: i32,
    pub line_spacing: i32,
    pub font_scale: f64,
    /// RGB
    pub color: [u8; 3],
    pub thickness: i32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            origin_x: 0,
            first_baseline: 15,
            line_spacing: 25,
            font_scale: 0.5,
            color: [0, 255, 0],
            thickness: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayLine {
    pub text: String,
    pub x: i32,
    pub y: i32,
}

impl OverlayStyle {
    /// Stack lines downwards from the first baseline.
    pub fn layout<I>(&self, texts: I) -> Vec<OverlayLine>
    where
        I: IntoIterator<Item = String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| OverlayLine {
                text,
                x: self.origin_x,
                y: self.first_baseline + self.line_spacing * i as i32,
            })
            .collect()
    }
}

pub fn inference_time_line(engine_ms: f64) -> String {
    format!("Inference time: {engine_ms:.2} ms")
}

pub fn throughput_line(batch_size: usize, per_image_ms: f64) -> String {
    format!("bs: {batch_size}, Time/image: {per_image_ms:.2} ms")
}

pub fn prediction_line(label: &str, confidence: f32) -> String {
    format!("{label}: {confidence:.4}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_formats() {
        assert_eq!(inference_time_line(12.3456), "Inference time: 12.35 ms");
        assert_eq!(throughput_line(4, 0.5), "bs: 4, Time/image: 0.50 ms");
        assert_eq!(prediction_line("cat", 0.9), "cat: 0.9000");
        assert_eq!(prediction_line("Class #0", 2.0), "Class #0: 2.0000");
    }

    #[test]
    fn test_default_layout_positions() {
        let lines = OverlayStyle::default().layout(["a", "b", "c"].map(String::from));

        let positions: Vec<_> = lines.iter().map(|l| (l.x, l.y)).collect();
        assert_eq!(positions, [(0, 15), (0, 40), (0, 65)]);
        assert_eq!(lines[2].text, "c");
    }

    #[test]
    fn test_custom_style_layout() {
        let style = OverlayStyle {
            origin_x: 10,
            first_baseline: 30,
            line_spacing: 40,
            ..Default::default()
        };
        let lines = style.layout(["x", "y"].map(String::from));
        assert_eq!((lines[1].x, lines[1].y), (10, 70));
    }
}
