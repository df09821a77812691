pub mod container;
pub mod negotiation;
