use subtone_core::{AppState, EffectId, ParameterValue, PixelBuffer, StateMessage};

/// Builder for test images. Starts as an opaque black canvas.
pub struct PixelBufferBuilder {
    width: u32,
    height: u32,
    fill: [u8; 4],
    horizontal_gradient: bool,
    checker: Option<(u32, [u8; 4], [u8; 4])>,
    pixels: Vec<(u32, u32, [u8; 4])>,
}

impl PixelBufferBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fill: [0, 0, 0, 255],
            horizontal_gradient: false,
            checker: None,
            pixels: Vec::new(),
        }
    }

    pub fn fill(mut self, rgba: [u8; 4]) -> Self {
        self.fill = rgba;
        self
    }

    /// Gray ramp from black at the left edge to white at the right edge.
    pub fn gradient(mut self) -> Self {
        self.horizontal_gradient = true;
        self
    }

    pub fn checkerboard(mut self, cell: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        self.checker = Some((cell.max(1), a, b));
        self
    }

    /// Overwrite a single pixel after the base pattern is drawn.
    pub fn pixel(mut self, x: u32, y: u32, rgba: [u8; 4]) -> Self {
        self.pixels.push((x, y, rgba));
        self
    }

    pub fn build(self) -> PixelBuffer {
        let mut buffer = PixelBuffer::filled(self.width, self.height, self.fill);
        for y in 0..self.height {
            for x in 0..self.width {
                let rgba = if let Some((cell, a, b)) = self.checker {
                    if (x / cell + y / cell) % 2 == 0 { a } else { b }
                } else if self.horizontal_gradient {
                    let v = if self.width > 1 {
                        (x * 255 / (self.width - 1)) as u8
                    } else {
                        0
                    };
                    [v, v, v, 255]
                } else {
                    continue;
                };
                buffer.pixel_mut(x, y).copy_from_slice(&rgba);
            }
        }
        for (x, y, rgba) in self.pixels {
            buffer.pixel_mut(x, y).copy_from_slice(&rgba);
        }
        buffer
    }
}

/// Builder for application states. Parameter values go through
/// [`AppState::update`], so they are validated like user input.
pub struct AppStateBuilder {
    effect: EffectId,
    params: Vec<(String, ParameterValue)>,
    preprocessing: Vec<(String, ParameterValue)>,
}

impl AppStateBuilder {
    pub fn new(effect: EffectId) -> Self {
        Self {
            effect,
            params: Vec::new(),
            preprocessing: Vec::new(),
        }
    }

    pub fn param(mut self, name: &str, value: impl Into<ParameterValue>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn preprocessing(mut self, name: &str, value: f64) -> Self {
        self.preprocessing.push((name.into(), ParameterValue::Float(value)));
        self
    }

    pub fn build(self) -> AppState {
        let mut state = AppState::new(self.effect);
        for (name, value) in self.params {
            state
                .update(StateMessage::SetParameter {
                    effect: self.effect,
                    name,
                    value,
                })
                .expect("invalid effect parameter in test builder");
        }
        for (name, value) in self.preprocessing {
            state
                .update(StateMessage::SetPreprocessing { name, value })
                .expect("invalid preprocessing parameter in test builder");
        }
        state
    }
}
