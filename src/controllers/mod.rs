pub mod travels_controller;
