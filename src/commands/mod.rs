pub mod build;
pub mod inspect;
pub mod inventory;
pub mod status;
