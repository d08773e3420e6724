//! External service integrations.

pub mod record_store {
    pub use crate::record_store::*;
}

pub mod geocoder {
    pub use crate::geocoder::*;
}

pub mod distance_matrix {
    pub use crate::distance_matrix::*;
}
