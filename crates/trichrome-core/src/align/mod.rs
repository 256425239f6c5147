pub mod correlation;
pub mod pyramid;

pub use correlation::{align_planes, align_pyramids, correlation_score, SearchWindow};
pub use pyramid::Pyramid;
