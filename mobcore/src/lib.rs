// data module
pub mod data {
    pub mod point;
    pub mod range;
    pub mod tolerance;
}

// algorithm module
pub mod algorithm {
    pub mod backfill;
    pub mod cancel;
    pub mod center;
    pub mod cluster;
}

// ion mobility frames and mobilograms
pub mod mobility;
