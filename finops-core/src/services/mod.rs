pub mod categories;
pub mod cost_aggregator;

pub use categories::{categorize_service, categorize_services, CategoryCost, ServiceCategory};
pub use cost_aggregator::{
    aggregate_service_costs, get_cost_data, get_cost_data_on, process_service_costs,
    CostAggregator, MIN_SERVICE_COST,
};
