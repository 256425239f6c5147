use ndarray::Array2;

use crate::error::{Result, TrichromeError};

/// A single-channel 16-bit intensity grid.
///
/// Samples are stored row-major with shape `(height, width)`. A plane is
/// immutable once built: stages read it and produce new planes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plane {
    data: Array2<u16>,
}

impl Plane {
    pub fn new(data: Array2<u16>) -> Self {
        if data.is_standard_layout() {
            Self { data }
        } else {
            Self {
                data: data.as_standard_layout().into_owned(),
            }
        }
    }

    /// Build a plane from a row-major sample buffer.
    pub fn from_raw(width: usize, height: usize, samples: Vec<u16>) -> Result<Self> {
        let data = Array2::from_shape_vec((height, width), samples)
            .map_err(|_| TrichromeError::InvalidDimensions { width, height })?;
        Ok(Self { data })
    }

    /// Build a plane by evaluating `f(x, y)` for every sample.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> u16,
    {
        Self {
            data: Array2::from_shape_fn((height, width), |(y, x)| f(x, y)),
        }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    pub fn get(&self, x: usize, y: usize) -> u16 {
        self.data[[y, x]]
    }

    /// Row `y` as a contiguous slice.
    pub fn row(&self, y: usize) -> &[u16] {
        let w = self.width();
        let start = y * w;
        &self.samples()[start..start + w]
    }

    /// All samples, row-major.
    pub fn samples(&self) -> &[u16] {
        self.data
            .as_slice()
            .expect("plane data is always in standard layout")
    }

    pub fn data(&self) -> &Array2<u16> {
        &self.data
    }
}

/// Integer displacement of a channel relative to the reference channel.
///
/// A shift is "where to read from": sample `(x + dx, y + dy)` of the shifted
/// plane lines up with sample `(x, y)` of the reference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Shift {
    pub dx: i32,
    pub dy: i32,
}

impl Shift {
    pub const ZERO: Shift = Shift { dx: 0, dy: 0 };

    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

impl std::fmt::Display for Shift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:+}, {:+})", self.dx, self.dy)
    }
}

/// Color channel of a triptych band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    pub fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }

    /// The two channels other than `self`, in R, G, B order.
    pub fn others(self) -> [Channel; 2] {
        match self {
            Self::Red => [Self::Green, Self::Blue],
            Self::Green => [Self::Red, Self::Blue],
            Self::Blue => [Self::Red, Self::Green],
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Red => write!(f, "Red"),
            Self::Green => write!(f, "Green"),
            Self::Blue => write!(f, "Blue"),
        }
    }
}

/// The three bands of one plate, all with identical dimensions.
#[derive(Clone, Debug)]
pub struct ChannelPlanes {
    pub red: Plane,
    pub green: Plane,
    pub blue: Plane,
}

impl ChannelPlanes {
    pub fn get(&self, channel: Channel) -> &Plane {
        match channel {
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
        }
    }
}

/// Per-channel shifts; the reference channel carries `Shift::ZERO`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelShifts {
    pub red: Shift,
    pub green: Shift,
    pub blue: Shift,
}

impl ChannelShifts {
    pub fn get(&self, channel: Channel) -> Shift {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
        }
    }

    pub fn set(&mut self, channel: Channel, shift: Shift) {
        match channel {
            Channel::Red => self.red = shift,
            Channel::Green => self.green = shift,
            Channel::Blue => self.blue = shift,
        }
    }
}

/// Final RGBA image with 16-bit samples and full opacity.
pub type Composite = image::ImageBuffer<image::Rgba<u16>, Vec<u16>>;
