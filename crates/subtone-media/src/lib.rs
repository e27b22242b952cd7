pub mod decoder;
pub mod encoder;
pub mod error;
pub mod probe;

pub use decoder::{decode_image, load_image};
pub use encoder::{encode_png, save_png};
pub use error::{MediaError, Result};
pub use probe::{ImageInfo, probe};
