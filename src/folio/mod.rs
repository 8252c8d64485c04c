pub mod audit;
pub mod config;
pub mod model;
pub mod navigation;
pub mod ordering;
pub mod paths;
pub mod scaffold;
pub mod service;
pub mod store;
pub mod util;
