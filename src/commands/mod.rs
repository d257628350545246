//! CLI command implementations.
//!
//! Each command is in its own submodule; options structs keep the clap
//! layer in `main.rs` thin.

pub mod add;
pub mod gen;

pub use add::{
    execute_add_api, execute_add_route, execute_add_rpc, execute_add_svc, execute_add_task,
    AddApiOptions, AddRouteOptions, AddRpcOptions, AddSvcOptions, AddTaskOptions,
};
pub use gen::{execute_gen, GenOptions};
