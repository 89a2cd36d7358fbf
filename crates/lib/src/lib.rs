//! depforge-lib: orchestration of the external native dependency builds.
//!
//! The orchestrator decides what to build, in what order, under which
//! environment, whether a stage can be skipped because it already succeeded,
//! and how to recover a clean state on demand. The underlying build systems
//! (b2, make, gyp/msbuild) are treated as opaque external commands.
//!
//! - `pipeline`: top-level sequencing across the three dependencies
//! - `dispatch`: per-target platform branching, marker guards, force cleanup
//! - `targets`: one orchestrator per dependency (Boost, OpenSSL, V8)
//! - `process`: synchronous external command execution
//! - `toolchain`: MSVC environment resolution for Windows variants
//! - `marker`: persisted per-variant completion markers

pub mod cwd;
pub mod dispatch;
pub mod fsops;
pub mod layout;
pub mod marker;
pub mod pipeline;
pub mod platform;
pub mod process;
pub mod request;
pub mod target;
pub mod targets;
pub mod toolchain;
pub mod util;
pub mod variant;
