//! Song Station - catalog songs annotated with listeners' hearts and comments
//!
//! Song metadata comes from an external catalog; hearts (likes) and comments
//! are stored locally. This library joins the two and exposes the result over
//! a small HTTP API.

pub mod aggregator;
pub mod catalog;
pub mod engagement;
pub mod error;
pub mod identity;
pub mod normalize;
pub mod server;
pub mod song;
