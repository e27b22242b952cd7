use std::path::PathBuf;

use subtone_core::{PixelBuffer, StateMessage};

#[derive(Debug, Clone)]
pub enum Message {
    // Source image
    OpenImage(PathBuf),
    ImageLoaded(Result<PixelBuffer, String>),

    // Parameter record
    Edit(StateMessage),
    /// A `name=value` patch against preprocessing or the active effect.
    Patch(String),
    LoadState(PathBuf),
}
