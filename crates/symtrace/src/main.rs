//! Resolves native stack frames in Unity Android crash logs.

#![warn(
    missing_docs,
    missing_debug_implementations,
    unused_crate_dependencies,
    clippy::all
)]

mod app;
mod config;
mod ndk;
mod resolve;

fn main() {
    app::main();
}
