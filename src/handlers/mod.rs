pub mod assets;
pub mod images;

pub use assets::*;
pub use images::*;
