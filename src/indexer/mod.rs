pub mod docblock;
pub mod extractor;
pub mod parser;
pub mod resolver;
pub mod walker;

pub use docblock::{is_docblock, parse_docblock};
pub use extractor::{relative_path, Extractor, PhpDocExtractor};
pub use parser::{ParsedFile, Parser};
pub use resolver::{resolve, SourcePath};
pub use walker::FileWalker;
