//! Client code for pagedistill.
//!
//! This crate provides the HTML distillation pipeline plus the page fetcher
//! and headless renderer that feed it HTML from the network.

pub mod extract;
pub mod fetch;
pub mod render;

pub use extract::{
    DistillOptions, Distillation, Distiller, ExtractionResult, Extractor, HeadingRecord, ImageRecord, LinkPolicy,
    LinkRecord, StructuredContent, TableRecord, distill,
};

pub use fetch::{FetchClient, FetchConfig, FetchResponse};

#[cfg(feature = "render")]
pub use render::HeadlessRenderer;
pub use render::{RenderError, RenderOptions, RenderedPage, Renderer};
