//! Nightshift - late-bound control of macOS Night Shift
//!
//! Night Shift is driven by `CBBlueLightClient`, a class in the private
//! `CoreBrightness` framework. Nothing about that class is available at
//! build time: the framework is mapped with the dynamic loader, the class
//! and its methods are looked up by name through the Objective-C runtime,
//! and each method is called through a function-pointer shape chosen from
//! a small closed set.
//!
//! # Example
//!
//! ```ignore
//! use nightshift::client::BlueLightClient;
//! use nightshift::config::{DEFAULT_CLASS, DEFAULT_FRAMEWORK};
//! use nightshift::ffi::{Bridge, LibObjc, LibraryLoader, DEFAULT_OBJC_LIBRARY};
//!
//! let mut loader = LibraryLoader::new();
//! let framework = loader.load(DEFAULT_FRAMEWORK)?;
//! let runtime = LibObjc::load(&mut loader, DEFAULT_OBJC_LIBRARY)?;
//! let mut client = BlueLightClient::new(Bridge::connect(runtime, framework, DEFAULT_CLASS)?);
//!
//! client.set_strength(40)?;
//! assert_eq!(client.strength()?, 40);
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  command        │  status / on / off / toggle / temp ...
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │  client         │  percentages, flags, status record
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │  ffi::Bridge    │  class + instance + lazily bound methods
//! └────────┬────────┘
//!     ┌────┴─────┐
//!     ▼          ▼
//! ┌────────┐ ┌─────────────┐
//! │ loader │ │ ObjcRuntime │  libloading / libobjc
//! └────────┘ └─────────────┘
//! ```

#![warn(clippy::all)]

pub mod client;
pub mod command;
pub mod config;
pub mod ffi;
pub mod logging;

// Re-export commonly used types
pub use client::{native_from_percent, percent_from_native, BlueLightClient};
pub use command::{execute, Command, Outcome};
pub use config::{ConfigError, NightshiftConfig};
pub use ffi::{Bridge, BridgeError, BridgeResult, LibObjc, LibraryLoader, ObjcRuntime, Stage};
