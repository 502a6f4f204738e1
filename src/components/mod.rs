pub mod app;
pub mod glitch_overlay;
pub mod stage;
pub mod viewer;

pub use app::App;
