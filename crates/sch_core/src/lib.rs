pub mod db;
pub mod domain;
pub mod duplicates;
pub mod error;
pub mod feed;
pub mod geo;
pub mod preview;
pub mod remote;
pub mod store;
pub mod wizard;
