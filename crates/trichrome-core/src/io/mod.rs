pub mod image_io;

pub use image_io::{DecodedFrame, ImageCodec, ImageCrateCodec};
