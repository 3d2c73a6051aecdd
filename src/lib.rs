pub mod backtest;
pub mod config;
pub mod error;
pub mod estimator;
pub mod model;
pub mod pipeline;
pub mod price_store;
pub mod price_table;
pub mod report;
pub mod screening;
pub mod strategy;
