pub mod gatekeeper;

pub use gatekeeper::edge_gatekeeper;
