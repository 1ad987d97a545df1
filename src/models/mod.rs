pub mod driver;
pub mod geo;
pub mod ride;
pub mod user;

mod lenient;
