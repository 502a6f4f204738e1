pub mod gesture;
pub mod reveal;
pub mod rotation;
pub mod session;
pub mod transform;
pub mod transition;

pub use gesture::Point;
pub use reveal::CORROSION_LAYERS;
pub use session::{ViewSnapshot, ViewerSession};
pub use transition::{TimerHandle, TimerKind, TimerPort};
