pub mod animation;
pub mod camera;
pub mod colors;
pub mod events;
pub mod highlight;
pub mod orbit;

pub use animation::{ColorAnimator, RegionSurface, TransitionOutcome};
pub use camera::{CameraRig, PerspectiveCamera};
pub use colors::Rgb;
pub use events::*;
pub use highlight::HighlightState;
pub use orbit::{OrbitConfig, OrbitController};
