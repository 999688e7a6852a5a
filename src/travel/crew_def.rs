//! The travel crew: three agent roles and the three task templates that
//! interpolate a [`TripRequest`].

use crate::agent::tools::SEARCH_WEB_TOOL;
use crate::orchestration::{Agent, Task, TaskContext};

use super::request::TripRequest;

pub const GUIDE_EXPERT: &str = "City Local Guide Expert";
pub const LOCATION_EXPERT: &str = "Travel Trip Expert";
pub const PLANNER_EXPERT: &str = "Travel Planning Expert";

pub const LOCATION_TASK: &str = "location";
pub const GUIDE_TASK: &str = "guide";
pub const PLANNER_TASK: &str = "planner";

pub const CITY_REPORT_FILE: &str = "city_report.md";
pub const GUIDE_REPORT_FILE: &str = "guide_report.md";
pub const TRAVEL_PLAN_FILE: &str = "travel_plan.md";

/// Agents in crew order: location, guide, planner.
pub fn agents(max_iter: usize) -> Vec<Agent> {
    vec![
        Agent::new(
            LOCATION_EXPERT,
            "Gather helpful information about the city during travel, in ENGLISH only.",
            "A seasoned traveler who has explored various destinations and knows the ins and outs of travel logistics.",
        )
        .with_tool(SEARCH_WEB_TOOL)
        .with_max_iter(max_iter),
        Agent::new(
            GUIDE_EXPERT,
            "Provides information on things to do in the city based on the user's interests.",
            "A local expert with a passion for sharing the best experiences and hidden gems of their city.",
        )
        .with_tool(SEARCH_WEB_TOOL)
        .with_max_iter(max_iter),
        Agent::new(
            PLANNER_EXPERT,
            "Compiles all gathered information to provide a comprehensive travel plan.",
            "An organizational wizard who can turn a list of possibilities into a seamless itinerary.",
        )
        .with_tool(SEARCH_WEB_TOOL)
        .with_max_iter(max_iter),
    ]
}

pub fn location_task(req: &TripRequest) -> Task {
    Task::new(
        LOCATION_TASK,
        format!(
            "Comprehensive data collection on accommodations, transportation, visa, costs, weather, and events.\n\
             Traveling from: {from}, Destination city: {to}\n\
             Dates: {depart} to {ret}\n\
             Respond in ENGLISH.",
            from = req.origin,
            to = req.destination,
            depart = req.departure_date,
            ret = req.return_date,
        ),
        "Markdown report with places to stay, living expenses, travel tips.\nRespond in ENGLISH.",
        LOCATION_EXPERT,
    )
    .with_output_file(CITY_REPORT_FILE)
}

pub fn guide_task(req: &TripRequest) -> Task {
    Task::new(
        GUIDE_TASK,
        format!(
            "Create a city guide for {to} tailored to interest: {interests}. Include attractions, food, events.\n\
             Dates: {depart} to {ret}\n\
             Respond in ENGLISH.",
            to = req.destination,
            interests = req.interests,
            depart = req.departure_date,
            ret = req.return_date,
        ),
        "Markdown guide with itinerary and attraction details.",
        GUIDE_EXPERT,
    )
    .with_output_file(GUIDE_REPORT_FILE)
}

pub fn planner_task(req: &TripRequest) -> Task {
    Task::new(
        PLANNER_TASK,
        format!(
            "Combine all data into a detailed itinerary for {to} with a 4-paragraph city intro and daily travel plan.\n\
             Dates: {depart} to {ret}\n\
             Respond in ENGLISH.",
            to = req.destination,
            depart = req.departure_date,
            ret = req.return_date,
        ),
        "Markdown with emojis, city overview, cost, visit spots, and daily travel plan.",
        PLANNER_EXPERT,
    )
    .with_context(TaskContext::Tasks(vec![
        LOCATION_TASK.to_string(),
        GUIDE_TASK.to_string(),
    ]))
    .with_output_file(TRAVEL_PLAN_FILE)
}

/// All three tasks in execution order.
pub fn tasks(req: &TripRequest) -> Vec<Task> {
    vec![location_task(req), guide_task(req), planner_task(req)]
}
