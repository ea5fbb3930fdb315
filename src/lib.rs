#![forbid(unsafe_code)]

//! Recovers Plays.tv uploads from the Wayback Machine.
//!
//! The crate is organised as a small pipeline: [`snapshot`] finds the newest
//! archived copy of a profile, [`listing`] pulls the video links out of it,
//! [`detail`] turns every video page into a [`detail::VideoRecord`] and
//! [`download`] writes the media to disk. [`pipeline`] wires the stages
//! together for the `scrape_profile` binary.

pub mod config;
pub mod detail;
pub mod download;
pub mod error;
pub mod html;
pub mod http;
pub mod listing;
pub mod pipeline;
pub mod snapshot;
