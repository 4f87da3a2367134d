pub mod components;
pub mod entity;
pub mod hover;
pub mod picking;
pub mod prefabs;
pub mod world;

pub use prefabs::globe::{GlobeScene, GlobeSettings, spawn_population_globe};
pub use world::*;
