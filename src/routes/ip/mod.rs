mod handler;
mod model;

pub use handler::lookup_ip;
pub use model::IpQuery;
