pub mod audit;
pub mod cancel;
pub mod catalog;
pub mod config;
pub mod locale;
pub mod paths;
pub mod remote;
pub mod upload;
pub mod util;
pub mod warn;
