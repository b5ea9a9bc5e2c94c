//! tunascript: flag scripting and text expansion for text adventures
//!
//! `TunaScript` is a small expression language for reading and changing game
//! flags and calling a fixed set of world built-ins:
//!
//! ```text
//! $VISITS++
//! $DOOR_OPEN = $IN_INVEN(key) && !$DOOR_LOCKED
//! $MOVE(lamp, cellar)
//! ```
//!
//! Expansion templates splice flags and conditional branches into prose:
//!
//! ```text
//! You have $COINS coins$[[IF $COINS > 100]], which is plenty$[[ENDIF]].
//! ```
//!
//! [`Interpreter`] runs both against a [`World`] supplied by the engine.

#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub mod ast;
pub mod error;
pub mod expansion;
pub mod flagfile;
pub mod interpreter;
pub mod lexer;
pub mod registry;
pub mod syntax;
pub mod translate;
pub mod value;
pub mod world;

pub use ast::{Ast, Node};
pub use error::TsError;
pub use expansion::Template;
pub use interpreter::Interpreter;
pub use lexer::{Token, TokenClass, lex};
pub use syntax::{parse, parse_reader};
pub use translate::translate_operators;
pub use value::Value;
pub use world::{MemoryWorld, World};
