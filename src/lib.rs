//! Sortable, globally unique identifiers inspired by [Twitter's Snowflake].
//!
//! A [`FlakeId`] combines a millisecond timestamp, a caller-supplied 48-bit
//! worker id and a 16-bit per-millisecond sequence. Its canonical text form is
//! `TTTTTTTTTTTTTTTT-WWWWWWWWWWWW-SSSS` in upper-case hex.
//!
//! ## Quickstart
//!
//! ```
//! use flake::Generator;
//!
//! let generator = Generator::new(0x123456).unwrap();
//! let id = generator.generate();
//! println!("{}", id);
//!
//! let parsed: flake::FlakeId = id.to_string().parse().unwrap();
//! assert_eq!(parsed, id);
//! ```
//!
//! ## Concurrent use
//!
//! Generator is thread-safe. `clone` it before moving to another thread; all
//! clones share one sequence:
//! ```
//! use flake::Generator;
//! use std::thread;
//!
//! let generator = Generator::new(1).unwrap();
//!
//! let mut children = Vec::new();
//! for _ in 0..10 {
//!     let thread_generator = generator.clone();
//!     children.push(thread::spawn(move || {
//!         println!("{}", thread_generator.generate());
//!     }));
//! }
//!
//! for child in children {
//!     child.join().unwrap();
//! }
//! ```
//!
//! [Twitter's Snowflake]: https://blog.twitter.com/2010/announcing-snowflake

mod builder;
mod clock;
mod error;
mod generator;
pub mod http;
mod id;

pub use builder::*;
pub use clock::*;
pub use error::*;
pub use generator::*;
pub use id::*;
