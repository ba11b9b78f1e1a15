pub mod event;
pub mod handle;
pub mod item;
pub mod response;
pub mod source;

pub use event::*;
pub use handle::*;
pub use item::*;
pub use response::*;
pub use source::*;
