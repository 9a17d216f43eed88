// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A packed, self-describing binary container for semi-structured values
//! (think: a single jsonb-style datum), plus the index-support algorithms a
//! host database would wire up as GIN (inverted/token) and GiST
//! (bounding-box/signature) operator classes over it.
//!
//! The container format, its push-builder, and its forward cursor are
//! independent of any particular host: build a tree with [`Builder`],
//! [`compact`] it into an immutable [`Container`], then either walk it with
//! [`Cursor`] or search it with [`search::find_in_container`].
//!
//! # Example usage
//!
//! ```
//! use svalue::{Builder, Event, Value, ResolverCache};
//!
//! let mut builder = Builder::new();
//! builder.push(Event::BeginObject)?;
//! builder.push(Event::Key(b"name".to_vec()))?;
//! builder.push(Event::Value(Value::String(b"ferris".to_vec())))?;
//! builder.push(Event::Key(b"legs".to_vec()))?;
//! builder.push(Event::Value(Value::Numeric(b"4".to_vec())))?;
//! builder.push(Event::EndObject)?;
//!
//! let tree = builder.finish()?;
//! let container = svalue::compact(&tree)?;
//!
//! // Zero-copy point lookup by key.
//! let resolver = ResolverCache::new();
//! let mut lowbound = 0;
//! let legs = svalue::search::find_in_container(
//!     container.as_ref(),
//!     svalue::Leaf::String(b"legs"),
//!     &mut lowbound,
//!     &resolver,
//! );
//! assert_eq!(legs, Some(svalue::Leaf::Numeric(b"4")));
//!
//! // Or walk the whole thing with the forward cursor.
//! for event in svalue::Cursor::new(container.as_ref(), false) {
//!     let _ = event;
//! }
//! # Ok::<(), svalue::Error>(())
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![warn(clippy::multiple_crate_versions)]
#![allow(clippy::option_if_let_else)]

pub mod anyarray;
pub mod bloom;
pub mod builder;
pub mod coding;
pub mod compactor;
pub mod config;
pub mod container;
pub mod cursor;
pub mod error;
pub mod index;
pub mod kernel;
pub mod layout;
pub mod resolver;
pub mod search;
pub mod value;
pub mod walker;

mod binary_search;

pub use {
    anyarray::AnyArray,
    builder::{Builder, Event},
    coding::{Decode, DecodeError, Encode, EncodeError},
    compactor::compact,
    config::{SimilarityConfig, SimilarityMetric},
    container::{recv_legacy, Container, ContainerRef},
    cursor::{Cursor, CursorEvent, Leaf},
    error::{Error, Result},
    resolver::{BytewiseNumericResolver, ResolverCache, ScalarResolver},
    search::{compare_value, deep_contains, find_in_container, FoundValue},
    value::{Pair, ScalarKind, ScalarKindOrComposite, Value},
    walker::{walk, WalkEvent},
};
