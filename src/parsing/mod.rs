pub mod go;

pub use go::{DeclScope, FileFacts, GoSource, GoSourceParser, StructDecl};
