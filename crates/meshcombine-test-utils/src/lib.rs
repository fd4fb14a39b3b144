//! Test utilities for meshcombine.
//!
//! - [`MockScene`] - an in-memory node tree implementing [`RenderableSource`]
//! - [`MockAggregator`] - an [`Aggregator`] that records every call and can be
//!   told to fail chosen batches
//! - [`fixtures`] - shorthand constructors for [`Renderable`]s
//!
//! # Example
//!
//! ```rust
//! use meshcombine::{CombineJob, CombineOptions};
//! use meshcombine_test_utils::{MockAggregator, MockScene};
//!
//! let mut scene = MockScene::new();
//! let root = scene.root();
//! scene.add_renderer(root, "crate_a", 1, 400);
//! scene.add_renderer(root, "crate_b", 1, 400);
//!
//! let aggregator = MockAggregator::new();
//! let job = CombineJob::discover(&scene, &root, CombineOptions::default()).unwrap();
//! let report = job.run(&aggregator);
//!
//! assert_eq!(report.batches.len(), 1);
//! assert_eq!(aggregator.count_merges(), 1);
//! ```
//!
//! [`RenderableSource`]: meshcombine::RenderableSource
//! [`Aggregator`]: meshcombine::Aggregator
//! [`Renderable`]: meshcombine::Renderable

pub mod fixtures;
pub mod mock_aggregator;
pub mod mock_scene;

pub use mock_aggregator::*;
pub use mock_scene::*;
