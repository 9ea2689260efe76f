pub mod power;
pub mod series;
pub mod simulation;
