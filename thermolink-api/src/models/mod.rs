mod display;
mod location;
mod reading;
mod serial;

pub use display::*;
pub use location::*;
pub use reading::*;
pub use serial::*;
