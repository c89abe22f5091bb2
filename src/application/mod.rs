// Application layer - Use cases and the collaborator traits they depend on
pub mod catalog_service;
pub mod chart_assembler;
pub mod filter;
pub mod panel;
pub mod panel_service;
pub mod table;
