//! spring-io-mcp: MCP server for Spring project release information
//!
//! This library exposes read-only tools that let AI assistants look up Spring
//! project releases, support windows and the upcoming release calendar.
//!
//! # Architecture
//!
//! Each tool is a thin mapping onto the public spring.io APIs:
//!
//! - **Releases**: `GET api.spring.io/projects/{id}/releases`
//! - **Support dates**: `GET api.spring.io/projects/{id}/generations`
//! - **Upcoming releases**: `GET calendar.spring.io/releases?start=..&end=..`
//!
//! Nothing is cached or retried; every call goes upstream once.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`error`]: Configuration error types
//! - [`mcp`]: MCP protocol, transport and tool registry
//! - [`springio`]: Upstream HTTP client, HAL unwrapping and records

pub mod config;
pub mod error;
pub mod mcp;
pub mod springio;
