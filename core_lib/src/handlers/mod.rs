pub mod routes;
pub mod sync;

pub use routes::create_routes;
