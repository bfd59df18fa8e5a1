pub mod backend;
pub mod graphics;
pub mod page;
pub mod text;
