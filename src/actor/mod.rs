pub mod broker;
pub mod companion;
pub mod dispatcher;
pub mod error;
pub mod inventory;
pub mod model;
pub mod refresh;
pub mod worker;
