pub mod colecovision;
pub mod db;
pub mod gamepad;
pub mod registry;
pub mod rom;
pub mod screenshot;
pub mod sg1000;
pub mod sms;

pub use colecovision::ColecoVision;
pub use rom::{RomError, RomImage};
pub use sg1000::Sg1000;
pub use sms::Sms;
