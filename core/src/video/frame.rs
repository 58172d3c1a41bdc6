use std::sync::{Arc, Mutex};

/// One device-native RGB pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub const fn pixel(r: u8, g: u8, b: u8) -> Pixel {
    Pixel { r, g, b }
}

/// A completed frame of the active display area, plus the per-line backdrop
/// colour used for the overscan border.
#[derive(Clone)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Pixel>,
    pub backdrop: Vec<Pixel>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Pixel::default(); (width * height) as usize],
            backdrop: vec![Pixel::default(); height as usize],
        }
    }

    /// Resize for an on-the-fly mode change. Contents are cleared.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.pixels.clear();
            self.pixels
                .resize((width * height) as usize, Pixel::default());
            self.backdrop.clear();
            self.backdrop.resize(height as usize, Pixel::default());
        }
    }
}

struct ReadySlot {
    frame: FrameBuffer,
    fresh: bool,
}

/// Hand-off point between the emulation thread and the host presenter.
///
/// The VDP renders into its own write buffer with no lock held; at frame end
/// the integrator publishes into the ready slot under a short lock, and the
/// presenter copies the ready frame out on its own schedule. Together with
/// the presenter's display copy this gives three buffers, so neither side
/// ever blocks on the other for longer than a memcpy.
#[derive(Clone)]
pub struct FrameSink {
    slot: Arc<Mutex<ReadySlot>>,
}

impl FrameSink {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            slot: Arc::new(Mutex::new(ReadySlot {
                frame: FrameBuffer::new(width, height),
                fresh: false,
            })),
        }
    }

    /// Publish a completed frame (emulation side).
    pub fn publish(&self, frame: &FrameBuffer) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.frame.clone_from(frame);
        slot.fresh = true;
    }

    /// Take the most recent frame if one arrived since the last call
    /// (presenter side).
    pub fn take(&self) -> Option<FrameBuffer> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if !slot.fresh {
            return None;
        }
        slot.fresh = false;
        Some(slot.frame.clone())
    }

    /// The most recent frame, fresh or not. Used for screenshots.
    pub fn latest(&self) -> FrameBuffer {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.frame.clone()
    }
}
