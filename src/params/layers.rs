//! Wave layer identities and their drawing styles.

use serde::{Deserialize, Serialize};

/// One of the three independently configured wave renderings, back to front
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaveLayer {
    SubSub,
    Sub,
    Main,
}

impl WaveLayer {
    /// Layers in drawing order (backmost first)
    pub const ALL: [WaveLayer; 3] = [WaveLayer::SubSub, WaveLayer::Sub, WaveLayer::Main];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Layer owning a synthesizer render index (0,1 → SubSub; 2,3 → Sub; 4,5 → Main)
    pub fn for_render_index(render_index: usize) -> Self {
        Self::ALL[(render_index / 2).min(2)]
    }

    /// Render index of the sequence composed into frames for this layer
    pub fn render_index(self) -> usize {
        self.index() * 2
    }
}

/// Fill/stroke appearance of one layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    /// sRGB color
    pub color: [u8; 3],

    /// Fill opacity (0..1)
    pub opacity: f32,

    /// Mirrored stroke width (pixels)
    pub stroke_width: f32,
}

/// Styles for all three layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerStyles {
    pub main: LayerStyle,
    pub sub: LayerStyle,
    pub sub_sub: LayerStyle,
}

impl Default for LayerStyles {
    fn default() -> Self {
        Self {
            main: LayerStyle {
                color: [0, 122, 255], // blue
                opacity: 0.3,
                stroke_width: 2.0,
            },
            sub: LayerStyle {
                color: [52, 199, 89], // green
                opacity: 0.3,
                stroke_width: 1.5,
            },
            sub_sub: LayerStyle {
                color: [175, 82, 222], // purple
                opacity: 0.3,
                stroke_width: 1.0,
            },
        }
    }
}

impl LayerStyles {
    pub fn get(&self, layer: WaveLayer) -> &LayerStyle {
        match layer {
            WaveLayer::Main => &self.main,
            WaveLayer::Sub => &self.sub,
            WaveLayer::SubSub => &self.sub_sub,
        }
    }
}
