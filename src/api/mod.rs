pub mod contact;
pub mod products;
pub mod response;

pub use contact::ContactApi;
pub use products::{ListParams, ProductApi};
pub use response::ApiResponse;
