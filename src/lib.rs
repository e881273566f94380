pub mod graph;
pub mod cust_error;
pub mod config;
pub mod shortest_path;
pub mod virus;
pub mod strategy;
pub mod cut_policy;
pub mod game;
