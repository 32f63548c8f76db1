// ABOUTME: SeaORM entities module for the inventory database models
// ABOUTME: Exports item and attachment definitions and their relationship

pub mod attachment;
pub mod item;
