mod common;

mod eligibility;
mod routing;
