pub mod analysis_service;
pub mod candidate_service;
pub mod change_feed_service;
pub mod dashboard_service;
pub mod realtime_service;
pub mod rest_candidate_service;
