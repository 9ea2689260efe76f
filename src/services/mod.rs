pub mod aggregator;
pub mod bifacial;
pub mod pipeline;
pub mod power_model;
pub mod simulation_service;
pub mod solar_algorithm;
pub mod temperature_model;
pub mod weather_service;
