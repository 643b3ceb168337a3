//! Hand landmarks and where they come from.
//!
//! [`landmark`] defines the 21-keypoint hand model and the validated per-frame
//! [`HandObservation`][landmark::HandObservation]. [`provider`] defines the interface to whatever
//! produces landmarks from camera frames. [`tracking`] implements it by finding hands with the palm
//! detector in [`detection`] and estimating their landmarks with the ONNX network in [`network`].

pub mod detection;
pub mod landmark;
pub mod network;
pub mod provider;
pub mod tracking;
