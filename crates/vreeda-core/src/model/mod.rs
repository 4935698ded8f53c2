// ── Domain model ──

pub mod device;
pub mod session;
pub mod user_context;

pub use device::{
    COLOR_PROGRAM, Channel, ColorTriple, Device, DeviceState, DeviceTags, PendingUpdate, Preset,
};
pub use session::{Session, SessionUser};
pub use user_context::{TokenPair, UserContext};
