pub mod manager;
pub mod obj;
pub mod vxl;
