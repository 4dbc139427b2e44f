pub mod home_controller;
pub mod user_controller;

pub use home_controller::HomeController;
pub use user_controller::UserController;
