//! Single-agent machinery: the model seam, the search tool and its backends,
//! the per-task conversation loop, and JSONL run logging.

pub mod agent_loop;
pub mod llm;
pub mod logging;
pub mod tools;
pub mod web_search;
