pub mod dashboard_dto;
