//! Travel planning domain: the trip form data, the crew that plans it, and
//! the planner facade used by both the CLI and the web form.

pub mod crew_def;
pub mod planner;
pub mod request;

pub use planner::TripPlanner;
pub use request::TripRequest;
