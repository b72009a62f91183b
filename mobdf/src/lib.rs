// src/lib.rs
pub mod data {
    pub mod dataset;
    pub mod store;
}

pub mod builder {
    pub mod params;
    pub mod progress;
    pub mod task;
}
