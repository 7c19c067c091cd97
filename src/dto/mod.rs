pub mod travels_dto;
