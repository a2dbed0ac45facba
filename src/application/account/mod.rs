//! Account use cases
//!
//! Orchestrate the identity provider and the user record service for
//! account-level workflows.

mod link_handle;
mod register_account;
mod update_materials;

pub use link_handle::{LinkHandleCommand, LinkHandleUseCase};
pub use register_account::{
  RegisterAccountCommand, RegisterAccountResponse, RegisterAccountUseCase,
};
pub use update_materials::{
  MaterialAction, MaterialList, UpdateMaterialsCommand, UpdateMaterialsUseCase,
};
