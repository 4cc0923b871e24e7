// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) parses the configuration and hands it to `ui`.
//
// Module responsibilities:
// - `api`: HTTP clients for the cat picture service and the disk API,
//   behind the `ImageSource` / `CloudStorage` traits.
// - `workflow`: the fetch → folder → upload → metadata sequence.
// - `sanitize`: caption to file name conversion.
// - `metadata`: the JSON info file uploaded next to the image.
// - `error`: error type shared by `api` and `workflow`.
// - `config`: command line and environment options.
// - `ui`: prompts, spinner and printed summary.
//
// `workflow` never prints anything itself, so it can be tested with fake
// collaborators and driven by another front end later.
pub mod api;
pub mod config;
pub mod error;
pub mod metadata;
pub mod sanitize;
pub mod ui;
pub mod workflow;
