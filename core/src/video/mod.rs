pub mod frame;
pub mod sms_vdp;
pub mod tms9928a;

pub use frame::{FrameBuffer, FrameSink, Pixel};
pub use tms9928a::{Vdp, VdpVariant};
