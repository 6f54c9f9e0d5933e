//! Tool-orchestrated question answering over the indexed courses.
//!
//! The model decides whether to search: the [`GenerationOrchestrator`]
//! offers it the registered tools, runs whatever calls it requests through
//! a per-query [`ToolManager`], and feeds the results back until the model
//! answers or the round limit is reached. [`RagSystem`] wires that loop to
//! sessions and the vector store.

pub mod generation;
pub mod outline_tool;
pub mod search_tool;
pub mod session;
pub mod system;
pub mod tools;
pub mod types;

pub use generation::GenerationOrchestrator;
pub use outline_tool::CourseOutlineTool;
pub use search_tool::CourseSearchTool;
pub use session::SessionManager;
pub use system::{DocumentStatus, RagSystem};
pub use tools::{Tool, ToolManager, ToolOutput, ToolRegistry};
pub use types::{QueryResponse, Source};
