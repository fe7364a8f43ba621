#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::needless_pass_by_value,
    clippy::return_self_not_must_use,
    clippy::similar_names,
    clippy::uninlined_format_args,
    clippy::unnecessary_map_or,
    clippy::len_without_is_empty
)]

//! State-management core for a conversational agent runtime: an ordered
//! in-memory session store and the agent-tree router that consumes it.

pub mod agent;
pub mod config;
pub mod observability;
pub mod routing;
pub mod sessions;

pub use config::Config;
