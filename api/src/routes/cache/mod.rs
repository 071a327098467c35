pub mod cache_route;
