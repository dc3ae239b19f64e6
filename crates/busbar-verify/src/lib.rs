//! Busbar tool verification driver
//!
//! Drives a headless browser through the busbar measurement tool and
//! checks what the user would see:
//! - Resolves the local HTML page to a `file://` URI
//! - Compiles a scenario into a single Playwright script (one browser, one page)
//! - Streams per-step progress back as JSON lines
//! - Fails on the first unmet expectation, with expected and actual values
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 VerificationRunner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TargetDocument::resolve() -> file:// URI                   │
//! │  PlaywrightHandle                                           │
//! │    ├── build_script(scenario, target) -> String             │
//! │    └── run_script(script) -> DriverRun                      │
//! │          └── node ── @playwright/test ── browser ── page    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (built in, or YAML)                               │
//! │    └── steps: navigate | fill | select | click |            │
//! │               assert { visible?, text?, count? } |          │
//! │               screenshot { path } | log                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod playwright;
pub mod runner;
pub mod scenario;
pub mod target;

pub use error::{VerifyError, VerifyResult};
pub use runner::{RunReport, RunnerConfig, VerificationRunner};
pub use scenario::{Scenario, Step};
pub use target::TargetDocument;
