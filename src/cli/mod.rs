pub mod app;
pub mod canon;
pub mod commands;
pub mod config;
pub mod context;
pub mod demo;
pub mod dispatch;
pub mod env;
pub mod output;
pub mod run;
pub mod runtime;

