pub mod ast;
pub mod css_syntax_error;
pub mod input;
pub mod list;
pub mod parse;
pub mod processor;
pub mod result;
pub mod stringifier;

pub use ast::nodes::*;
pub use ast::{Node, NodeAccess, NodeRef, Source};
pub use css_syntax_error::CssSyntaxError;
pub use input::{Input, Position};
pub use list::{comma, split};
pub use parse::{parse, parse_with_file};
pub use processor::{Plugin, Processor, ProcessorError, VisitContext};
pub use result::{ProcessResult, Warning};
pub use stringifier::stringify;
