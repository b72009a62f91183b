pub mod frame;
pub mod mobilogram;
pub mod selection;
pub mod store;
