pub mod travels_routes;
