pub mod align;
pub mod compose;
pub mod consts;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod plane;
pub mod split;

pub use error::{Result, TrichromeError};
pub use pipeline::process;
