mod create;
mod dump;
mod fields;
mod info;

pub use create::run as create;
pub use dump::run as dump;
pub use fields::run as fields;
pub use info::run as info;
