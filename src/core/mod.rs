// Domain-layer modules and shared errors/models
pub mod search {
    pub use crate::search::*;
}

pub mod normalizer {
    pub use crate::normalizer::*;
}

pub mod facets {
    pub use crate::facets::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
